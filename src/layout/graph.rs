use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;

use crate::fleet::{MachineRecord, ServiceRecord};

pub const HUB_ID: &str = "__hub__";

pub fn machine_node_id(machine_id: &str) -> String {
    format!("machine-{machine_id}")
}

pub fn service_node_id(machine_id: &str, name: &str) -> String {
    format!("service-{machine_id}-{name}")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Hub,
    Machine,
    Service,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
    Hub,
    Machine(MachineRecord),
    Service(ServiceRecord),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Hub => NodeKind::Hub,
            Self::Machine(_) => NodeKind::Machine,
            Self::Service(_) => NodeKind::Service,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SimNode {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub pin: Option<Vec2>,
    pub radius: f32,
    pub payload: NodePayload,
}

impl SimNode {
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    /// Pointer tolerance; small shapes get extra slack.
    pub fn hit_radius(&self) -> f32 {
        match self.kind() {
            NodeKind::Hub => self.radius,
            NodeKind::Machine => self.radius + 20.0,
            NodeKind::Service => self.radius + 6.0,
        }
    }

    /// Machine this node belongs to, for selection and cross-filtering.
    pub fn machine_id(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Hub => None,
            NodePayload::Machine(machine) => Some(machine.machine_id.as_str()),
            NodePayload::Service(service) => Some(service.group_id()),
        }
    }

    /// Text used for search matching and labels.
    pub fn label(&self) -> &str {
        match &self.payload {
            NodePayload::Hub => "hub",
            NodePayload::Machine(machine) => machine.display_name(),
            NodePayload::Service(service) if service.name.is_empty() => "unnamed service",
            NodePayload::Service(service) => &service.name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// hub to machine
    Mesh,
    /// machine to service
    Link,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Clone, Debug, Default)]
pub struct SimGraph {
    nodes: Vec<SimNode>,
    edges: Vec<SimEdge>,
    endpoints: Vec<(usize, usize)>,
    index_by_id: HashMap<String, usize>,
    machine_count: usize,
}

impl SimGraph {
    /// Assemble a graph, dropping duplicate ids, repeated edges and edges
    /// with a missing endpoint.
    pub fn new(nodes: Vec<SimNode>, edges: Vec<SimEdge>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if index_by_id.contains_key(&node.id) {
                continue;
            }
            index_by_id.insert(node.id.clone(), unique.len());
            unique.push(node);
        }

        let mut kept_edges = Vec::with_capacity(edges.len());
        let mut endpoints = Vec::with_capacity(edges.len());
        let mut seen = HashSet::with_capacity(edges.len());
        for edge in edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                continue;
            };
            if source == target || !seen.insert((source.min(target), source.max(target))) {
                continue;
            }
            endpoints.push((source, target));
            kept_edges.push(edge);
        }

        let machine_count = unique
            .iter()
            .filter(|node| node.kind() == NodeKind::Machine)
            .count();

        Self {
            nodes: unique,
            edges: kept_edges,
            endpoints,
            index_by_id,
            machine_count,
        }
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[SimEdge] {
        &self.edges
    }

    pub(crate) fn endpoints(&self) -> &[(usize, usize)] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn machine_count(&self) -> usize {
        self.machine_count
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut SimNode> {
        let index = self.index_of(id)?;
        self.nodes.get_mut(index)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [SimNode] {
        &mut self.nodes
    }

    pub(crate) fn split_for_step(&mut self) -> (&mut [SimNode], &[SimEdge], &[(usize, usize)]) {
        (&mut self.nodes, &self.edges, &self.endpoints)
    }

    pub fn hub(&self) -> Option<&SimNode> {
        self.node(HUB_ID)
    }

    /// Online flag of a machine node, if the machine is in the graph.
    pub fn machine_online(&self, machine_id: &str) -> Option<bool> {
        match &self.node(&machine_node_id(machine_id))?.payload {
            NodePayload::Machine(machine) => Some(machine.is_online),
            _ => None,
        }
    }
}
