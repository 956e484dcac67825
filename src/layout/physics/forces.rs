use eframe::egui::{Vec2, vec2};

use crate::config::LayoutConfig;

use super::super::graph::{EdgeKind, SimEdge, SimNode};
use super::PhysicsScratch;
use super::quadtree::{QuadNode, for_each_candidate_pair};

const MIN_DISTANCE: f32 = 1.0;

fn separation_direction(delta: Vec2, distance: f32, from: usize, to: usize) -> Vec2 {
    if distance > 0.0001 {
        delta / distance
    } else {
        let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
        vec2(angle.cos(), angle.sin())
    }
}

pub(super) fn apply_gravity(nodes: &mut [SimNode], center: Vec2, gravity: f32) {
    for node in nodes.iter_mut().filter(|node| !node.is_pinned()) {
        node.velocity += (center - node.position) * gravity;
    }
}

/// Push apart pairs closer than `radius_a + radius_b + margin`. The push falls
/// off with inverse distance and reaches zero at the cut-off, split evenly
/// between the free members of the pair.
pub(super) fn apply_repulsion(
    nodes: &mut [SimNode],
    scratch: &mut PhysicsScratch,
    config: &LayoutConfig,
) {
    scratch.positions.clear();
    scratch.radii.clear();
    scratch.pinned.clear();
    let mut max_radius = 0.0_f32;
    for node in nodes.iter() {
        scratch.positions.push(node.position);
        scratch.radii.push(node.radius);
        scratch.pinned.push(node.is_pinned());
        max_radius = max_radius.max(node.radius);
    }

    let Some(tree) = QuadNode::build(&scratch.positions) else {
        return;
    };

    let positions = &scratch.positions;
    let radii = &scratch.radii;
    let pinned = &scratch.pinned;
    let margin = config.repulsion_margin;
    let strength = config.repulsion_strength;
    let cutoff = (max_radius * 2.0) + margin;

    for_each_candidate_pair(&tree, cutoff, &mut |first, second| {
        if pinned[first] && pinned[second] {
            return;
        }

        let delta = positions[first] - positions[second];
        let distance = delta.length();
        let min_distance = radii[first] + radii[second] + margin;
        if distance >= min_distance {
            return;
        }

        let direction = separation_direction(delta, distance, first, second);
        let floored = distance.max(MIN_DISTANCE);
        let push = strength * ((1.0 / floored) - (1.0 / min_distance)).max(0.0);
        let share = direction * (push * 0.5);

        if !pinned[first] {
            nodes[first].velocity += share;
        }
        if !pinned[second] {
            nodes[second].velocity -= share;
        }
    });
}

pub(super) fn apply_springs(
    nodes: &mut [SimNode],
    edges: &[SimEdge],
    endpoints: &[(usize, usize)],
    config: &LayoutConfig,
) {
    for (edge, &(source, target)) in edges.iter().zip(endpoints) {
        if source >= nodes.len() || target >= nodes.len() || source == target {
            continue;
        }

        let (rest_length, stiffness) = match edge.kind {
            EdgeKind::Mesh => (config.mesh_rest_length, config.mesh_stiffness),
            EdgeKind::Link => (config.link_rest_length, config.link_stiffness),
        };

        let delta = nodes[target].position - nodes[source].position;
        let distance = delta.length().max(MIN_DISTANCE);
        let correction = (delta / distance) * ((distance - rest_length) * stiffness);

        if !nodes[source].is_pinned() {
            nodes[source].velocity += correction;
        }
        if !nodes[target].is_pinned() {
            nodes[target].velocity -= correction;
        }
    }
}

pub(super) fn apply_damping(nodes: &mut [SimNode], damping: f32) {
    for node in nodes.iter_mut() {
        node.velocity *= damping;
    }
}

/// Move every node one step and return the total kinetic energy.
pub(super) fn integrate(nodes: &mut [SimNode], max_velocity: f32) -> f32 {
    let mut energy = 0.0;
    for node in nodes.iter_mut() {
        if let Some(pin) = node.pin {
            node.position = pin;
            node.velocity = Vec2::ZERO;
            continue;
        }

        node.velocity.x = node.velocity.x.clamp(-max_velocity, max_velocity);
        node.velocity.y = node.velocity.y.clamp(-max_velocity, max_velocity);
        node.position += node.velocity;
        energy += node.velocity.length_sq();
    }
    energy
}
