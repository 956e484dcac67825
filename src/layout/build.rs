use std::collections::{HashMap, HashSet};
use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::fleet::{MachineRecord, ServiceRecord};

use super::graph::{
    EdgeKind, HUB_ID, NodePayload, SimEdge, SimGraph, SimNode, machine_node_id, service_node_id,
};

fn ring_offset(index: usize, count: usize, radius: f32, phase: f32) -> Vec2 {
    let count = count.max(1) as f32;
    let angle = TAU * (index as f32) / count + phase;
    vec2(angle.cos(), angle.sin()) * radius
}

/// Carry state over from the previous graph when the id already existed,
/// otherwise start at `seed` at rest.
fn inherit_or_seed(
    previous: &SimGraph,
    id: String,
    seed: Vec2,
    radius: f32,
    payload: NodePayload,
) -> SimNode {
    match previous.node(&id) {
        Some(prior) => SimNode {
            position: prior.position,
            velocity: prior.velocity,
            pin: prior.pin,
            id,
            radius,
            payload,
        },
        None => SimNode {
            id,
            position: seed,
            velocity: Vec2::ZERO,
            pin: None,
            radius,
            payload,
        },
    }
}

/// Build the hub/machine/service graph for the given records, merging
/// positions from `previous`. Ids absent from the records are dropped; a
/// repeated id keeps its first record.
pub fn build_graph(
    machines: &[MachineRecord],
    services: &[ServiceRecord],
    center: Vec2,
    previous: &SimGraph,
    config: &LayoutConfig,
) -> SimGraph {
    let mut nodes = Vec::with_capacity(1 + machines.len() + services.len());
    let mut edges = Vec::with_capacity(machines.len() + services.len());

    nodes.push(SimNode {
        id: HUB_ID.to_owned(),
        position: center,
        velocity: Vec2::ZERO,
        pin: Some(center),
        radius: config.hub_radius,
        payload: NodePayload::Hub,
    });

    let mut machine_positions: HashMap<&str, Vec2> = HashMap::with_capacity(machines.len());
    for (index, machine) in machines.iter().enumerate() {
        if machine_positions.contains_key(machine.machine_id.as_str()) {
            continue;
        }
        let id = machine_node_id(&machine.machine_id);
        let seed = center
            + ring_offset(index, machines.len(), config.machine_ring_radius, -FRAC_PI_2);
        let node = inherit_or_seed(
            previous,
            id.clone(),
            seed,
            config.machine_radius,
            NodePayload::Machine(machine.clone()),
        );
        machine_positions.insert(machine.machine_id.as_str(), node.position);
        nodes.push(node);
        edges.push(SimEdge {
            source: HUB_ID.to_owned(),
            target: id,
            kind: EdgeKind::Mesh,
        });
    }

    let mut group_slots: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&ServiceRecord>)> = Vec::new();
    for service in services {
        let group_id = service.group_id();
        let slot = *group_slots.entry(group_id).or_insert_with(|| {
            groups.push((group_id, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(service);
    }

    let mut service_ids = HashSet::with_capacity(services.len());
    for (group_id, members) in groups {
        let parent = machine_positions.get(group_id).copied();
        let anchor = parent.unwrap_or(center);
        let parent_id = machine_node_id(group_id);

        for (index, service) in members.iter().enumerate() {
            let id = service_node_id(group_id, &service.name);
            if !service_ids.insert(id.clone()) {
                debug!(
                    %id,
                    machine = group_id,
                    service = %service.name,
                    "service id already taken, skipping"
                );
                continue;
            }
            let seed = anchor + ring_offset(index, members.len(), config.service_ring_radius, 0.0);
            nodes.push(inherit_or_seed(
                previous,
                id.clone(),
                seed,
                config.service_radius,
                NodePayload::Service((*service).clone()),
            ));
            if parent.is_some() {
                edges.push(SimEdge {
                    source: parent_id.clone(),
                    target: id,
                    kind: EdgeKind::Link,
                });
            }
        }
    }

    SimGraph::new(nodes, edges)
}

/// Swap in fresh records for existing nodes without touching positions. As
/// in [`build_graph`], the first record for an id wins.
pub(crate) fn refresh_payloads(
    graph: &mut SimGraph,
    machines: &[MachineRecord],
    services: &[ServiceRecord],
) {
    let mut refreshed = HashSet::with_capacity(machines.len() + services.len());
    for machine in machines {
        let id = machine_node_id(&machine.machine_id);
        if refreshed.contains(&id) {
            continue;
        }
        if let Some(node) = graph.node_mut(&id) {
            node.payload = NodePayload::Machine(machine.clone());
        }
        refreshed.insert(id);
    }
    for service in services {
        let id = service_node_id(service.group_id(), &service.name);
        if refreshed.contains(&id) {
            continue;
        }
        if let Some(node) = graph.node_mut(&id) {
            node.payload = NodePayload::Service(service.clone());
        }
        refreshed.insert(id);
    }
}
