//! Retained scene for the layout graph. Node groups are keyed by node id and
//! built once; each frame only writes translations and patches the attributes
//! that depend on data.

mod paint;
mod style;
mod visuals;

use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Vec2};

use crate::layout::{EdgeKind, NodeKind, SimGraph, machine_node_id};

pub use paint::{paint_background, paint_scene};
pub use visuals::{KindVisual, visual_for};

/// Per-frame inputs that are not part of the graph itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameContext<'a> {
    pub selected_machine: Option<&'a str>,
    /// Node ids matching the search box. `None` when no search is active.
    pub search_matches: Option<&'a HashSet<String>>,
}

/// Static sub-shape of a node group, positioned relative to the node.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Disc { radius: f32 },
    Card { half_size: Vec2 },
    StatusDot { offset: Vec2, radius: f32 },
    StaleRing { radius: f32 },
    SelectionHalo { radius: f32 },
    Label { offset: Vec2 },
    Detail { offset: Vec2 },
}

/// Inputs the detail text was last formatted from. Patching compares these
/// and skips formatting while they hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DetailSource {
    #[default]
    Unset,
    MachineCount(usize),
    Machine {
        ip: String,
        online: bool,
        running: u32,
        nodes: u32,
    },
}

/// Data-dependent attributes patched every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupAttrs {
    pub fill: Color32,
    pub accent: Color32,
    pub label: String,
    pub detail: String,
    pub detail_source: DetailSource,
    pub selected: bool,
    pub stale: bool,
    pub matched: bool,
    pub dimmed: bool,
}

impl Default for GroupAttrs {
    fn default() -> Self {
        Self {
            fill: Color32::TRANSPARENT,
            accent: Color32::TRANSPARENT,
            label: String::new(),
            detail: String::new(),
            detail_source: DetailSource::Unset,
            selected: false,
            stale: false,
            matched: false,
            dimmed: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NodeGroup {
    pub kind: NodeKind,
    pub translation: Vec2,
    pub shapes: Vec<Primitive>,
    /// Node radius `shapes` were built for.
    pub built_radius: f32,
    pub attrs: GroupAttrs,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeLine {
    pub from: Vec2,
    pub to: Vec2,
    pub kind: EdgeKind,
    pub highlighted: bool,
    pub visible: bool,
}

impl Default for EdgeLine {
    fn default() -> Self {
        Self {
            from: Vec2::ZERO,
            to: Vec2::ZERO,
            kind: EdgeKind::Link,
            highlighted: false,
            visible: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub groups_created: usize,
    pub groups_removed: usize,
    /// Existing groups whose shapes were rebuilt after a radius change.
    pub shapes_rebuilt: usize,
    /// Label and detail strings actually rewritten this frame.
    pub text_writes: usize,
}

#[derive(Default)]
pub struct Scene {
    groups: HashMap<String, NodeGroup>,
    order: Vec<String>,
    edges: Vec<EdgeLine>,
}

/// Overwrite `slot` only when the text differs. Returns whether it wrote.
pub(crate) fn write_text(slot: &mut String, value: &str) -> bool {
    if slot == value {
        return false;
    }
    slot.clear();
    slot.push_str(value);
    true
}

impl Scene {
    pub fn group(&self, id: &str) -> Option<&NodeGroup> {
        self.groups.get(id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn edges(&self) -> &[EdgeLine] {
        &self.edges
    }

    /// Groups in draw order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &NodeGroup)> {
        self.order
            .iter()
            .filter_map(|id| self.groups.get(id).map(|group| (id.as_str(), group)))
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.order.clear();
        self.edges.clear();
    }

    pub fn reconcile(&mut self, graph: &SimGraph, frame: &FrameContext<'_>) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        self.reconcile_edges(graph, frame);

        let before = self.groups.len();
        self.groups.retain(|id, _| graph.index_of(id).is_some());
        stats.groups_removed = before - self.groups.len();

        for node in graph.nodes() {
            let visual = visual_for(node.kind());
            let built_radius = self.groups.get(&node.id).map(|group| group.built_radius);
            if built_radius.is_none() {
                stats.groups_created += 1;
                self.groups.insert(
                    node.id.clone(),
                    NodeGroup {
                        kind: node.kind(),
                        translation: node.position,
                        shapes: (visual.build)(node),
                        built_radius: node.radius,
                        attrs: GroupAttrs::default(),
                    },
                );
            }
            let Some(group) = self.groups.get_mut(&node.id) else {
                continue;
            };
            if built_radius.is_some_and(|radius| radius != node.radius) {
                stats.shapes_rebuilt += 1;
                group.shapes = (visual.build)(node);
                group.built_radius = node.radius;
            }
            group.translation = node.position;
            stats.text_writes += (visual.patch)(node, graph, frame, &mut group.attrs);
        }

        if stats.groups_created > 0 || stats.groups_removed > 0 || self.order.len() != graph.len()
        {
            self.order.clear();
            self.order
                .extend(graph.nodes().iter().map(|node| node.id.clone()));
        }

        stats
    }

    fn reconcile_edges(&mut self, graph: &SimGraph, frame: &FrameContext<'_>) {
        let selected = frame.selected_machine.map(machine_node_id);
        self.edges.resize_with(graph.edges().len(), EdgeLine::default);

        for (line, edge) in self.edges.iter_mut().zip(graph.edges()) {
            line.kind = edge.kind;
            match (graph.node(&edge.source), graph.node(&edge.target)) {
                (Some(source), Some(target)) => {
                    line.from = source.position;
                    line.to = target.position;
                    line.visible = true;
                }
                _ => line.visible = false,
            }
            line.highlighted = selected
                .as_deref()
                .is_some_and(|id| edge.source == id || edge.target == id);
        }
    }
}
