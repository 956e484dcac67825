mod forces;
mod quadtree;

use eframe::egui::Vec2;

use crate::config::LayoutConfig;

use super::graph::SimGraph;
use forces::{apply_damping, apply_gravity, apply_repulsion, apply_springs, integrate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Active,
    Settled,
}

/// Buffers reused across steps so a tick does not allocate.
#[derive(Default)]
pub(crate) struct PhysicsScratch {
    positions: Vec<Vec2>,
    radii: Vec<f32>,
    pinned: Vec<bool>,
}

/// One discrete simulation step: gravity, repulsion, springs, damping, then
/// integration. Returns the total kinetic energy after the step.
pub(crate) fn step_physics(
    graph: &mut SimGraph,
    center: Vec2,
    config: &LayoutConfig,
    scratch: &mut PhysicsScratch,
) -> f32 {
    if graph.is_empty() {
        return 0.0;
    }

    let (nodes, edges, endpoints) = graph.split_for_step();
    apply_gravity(nodes, center, config.gravity);
    apply_repulsion(nodes, scratch, config);
    apply_springs(nodes, edges, endpoints, config);
    apply_damping(nodes, config.damping);
    integrate(nodes, config.max_velocity)
}
