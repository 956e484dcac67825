use eframe::egui::{Pos2, Rect, Vec2};

use super::SimulationState;
use super::graph::{NodeKind, SimGraph, SimNode};
use super::physics::Phase;
use super::viewport::ZoomDirection;

/// The single pointer gesture in progress.
#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging { node_id: String },
    Panning { start: Pos2, origin: Vec2 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitPurpose {
    /// The hub is never draggable.
    Drag,
    Hover,
}

/// Topmost node under `world`. Later nodes are drawn above earlier ones, so
/// the search runs in reverse insertion order.
pub fn hit_test(graph: &SimGraph, world: Vec2, purpose: HitPurpose) -> Option<&SimNode> {
    graph
        .nodes()
        .iter()
        .rev()
        .filter(|node| purpose == HitPurpose::Hover || node.kind() != NodeKind::Hub)
        .find(|node| (node.position - world).length() < node.hit_radius())
}

impl SimulationState {
    pub fn pointer_pressed(&mut self, bounds: Rect, screen: Pos2) {
        if self.gesture != Gesture::Idle {
            return;
        }

        let world = self.viewport.screen_to_world(bounds, screen);
        let hit = hit_test(&self.graph, world, HitPurpose::Drag)
            .map(|node| (node.id.clone(), node.machine_id().map(str::to_owned)));

        match hit {
            Some((node_id, machine_id)) => {
                if let Some(node) = self.graph.node_mut(&node_id) {
                    node.pin = Some(world);
                    node.position = world;
                    node.velocity = Vec2::ZERO;
                }
                if let Some(machine_id) = machine_id {
                    if self.selected_machine.as_deref() == Some(machine_id.as_str()) {
                        self.selected_machine = None;
                    } else {
                        self.selected_machine = Some(machine_id);
                    }
                }
                self.gesture = Gesture::Dragging { node_id };
                self.wake();
            }
            None => {
                self.gesture = Gesture::Panning {
                    start: screen,
                    origin: self.viewport.origin(),
                };
                self.selected_machine = None;
            }
        }
    }

    /// `inside` tells whether the pointer is over the canvas; hover is only
    /// tracked there, while gestures follow the pointer anywhere.
    pub fn pointer_moved(&mut self, bounds: Rect, screen: Pos2, inside: bool) {
        match &self.gesture {
            Gesture::Idle => {
                self.hovered = if inside {
                    let world = self.viewport.screen_to_world(bounds, screen);
                    hit_test(&self.graph, world, HitPurpose::Hover).map(|node| node.id.clone())
                } else {
                    None
                };
            }
            Gesture::Dragging { node_id } => {
                let world = self.viewport.screen_to_world(bounds, screen);
                let node_id = node_id.clone();
                match self.graph.node_mut(&node_id) {
                    Some(node) => {
                        node.pin = Some(world);
                        node.position = world;
                        node.velocity = Vec2::ZERO;
                        self.wake();
                    }
                    None => self.gesture = Gesture::Idle,
                }
            }
            Gesture::Panning { start, origin } => {
                let (start, origin) = (*start, *origin);
                self.viewport.pan_from(bounds, origin, start, screen);
            }
        }
    }

    pub fn pointer_released(&mut self) {
        if let Gesture::Dragging { node_id } = &self.gesture
            && let Some(node) = self.graph.node_mut(node_id)
        {
            node.pin = None;
        }
        self.gesture = Gesture::Idle;
    }

    pub fn pointer_left(&mut self) {
        if self.gesture == Gesture::Idle {
            self.hovered = None;
        }
    }

    pub fn wheel(&mut self, bounds: Rect, screen: Pos2, direction: ZoomDirection) {
        self.viewport.zoom(bounds, screen, direction);
        // A pan in progress continues from the zoomed view.
        if let Gesture::Panning { start, origin } = &mut self.gesture {
            *start = screen;
            *origin = self.viewport.origin();
        }
    }

    pub(super) fn wake(&mut self) {
        if self.phase == Phase::Settled {
            tracing::debug!("layout woke up");
        }
        self.phase = Phase::Active;
    }
}
