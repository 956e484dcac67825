//! Force-directed layout engine: graph model, physics, viewport and pointer
//! interaction. All mutation of layout state goes through [`SimulationState`].

mod build;
mod graph;
mod interaction;
mod physics;
mod viewport;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::LayoutConfig;
use crate::fleet::{MachineRecord, ServiceRecord, TopologySignature};

pub use build::build_graph;
pub use graph::{
    EdgeKind, HUB_ID, NodeKind, NodePayload, SimEdge, SimGraph, SimNode, machine_node_id,
    service_node_id,
};
pub use interaction::{Gesture, HitPurpose, hit_test};
pub use physics::Phase;
pub use viewport::{
    MAX_VIEW_HEIGHT, MAX_VIEW_WIDTH, MIN_VIEW_HEIGHT, MIN_VIEW_WIDTH, Viewport, ZoomDirection,
};

use build::refresh_payloads;
use physics::{PhysicsScratch, step_physics};

pub struct SimulationState {
    config: LayoutConfig,
    machines: Vec<MachineRecord>,
    services: Vec<ServiceRecord>,
    signature: TopologySignature,
    graph: SimGraph,
    phase: Phase,
    scratch: PhysicsScratch,
    viewport: Viewport,
    container: Vec2,
    gesture: Gesture,
    selected_machine: Option<String>,
    hovered: Option<String>,
    rebuild_pending: bool,
    revision: u64,
    payload_revision: u64,
    last_energy: f32,
}

impl SimulationState {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config: config.sanitized(),
            machines: Vec::new(),
            services: Vec::new(),
            signature: TopologySignature::default(),
            graph: SimGraph::default(),
            phase: Phase::Settled,
            scratch: PhysicsScratch::default(),
            viewport: Viewport::default(),
            container: Vec2::ZERO,
            gesture: Gesture::Idle,
            selected_machine: None,
            hovered: None,
            rebuild_pending: true,
            revision: 0,
            payload_revision: 0,
            last_energy: 0.0,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Replace the tunables. Radii may change, so the graph is rebuilt on the
    /// next tick.
    pub fn set_config(&mut self, config: LayoutConfig) {
        let config = config.sanitized();
        if config == self.config {
            return;
        }
        self.config = config;
        self.rebuild_pending = true;
    }

    /// Feed the latest records. Topology changes schedule a rebuild; anything
    /// else only refreshes node payloads.
    pub fn set_records(&mut self, machines: Vec<MachineRecord>, services: Vec<ServiceRecord>) {
        let signature = TopologySignature::of(&machines, &services);
        if signature != self.signature {
            debug!(
                machines = machines.len(),
                services = services.len(),
                "fleet topology changed"
            );
            self.signature = signature;
            self.rebuild_pending = true;
        } else {
            refresh_payloads(&mut self.graph, &machines, &services);
            self.payload_revision = self.payload_revision.wrapping_add(1);
        }
        self.machines = machines;
        self.services = services;
    }

    /// Track the canvas size. A change keeps the zoom level and schedules a
    /// rebuild so the hub follows the new center.
    pub fn set_container_size(&mut self, size: Vec2) {
        if !(size.x > 0.0 && size.y > 0.0) || (size - self.container).length_sq() < 0.25 {
            return;
        }
        self.viewport = if self.container.x > 0.0 && self.container.y > 0.0 {
            self.viewport.resized(self.container, size)
        } else {
            Viewport::fit(size)
        };
        self.container = size;
        self.rebuild_pending = true;
    }

    /// Advance one frame: apply a pending rebuild, then step the physics while
    /// active. Returns whether the simulation did any work.
    pub fn tick(&mut self) -> bool {
        if self.rebuild_pending && self.container.x > 0.0 {
            self.rebuild();
        }

        if self.phase == Phase::Settled {
            return false;
        }

        let center = self.layout_center();
        self.last_energy = step_physics(&mut self.graph, center, &self.config, &mut self.scratch);

        let dragging = matches!(self.gesture, Gesture::Dragging { .. });
        if self.last_energy < self.config.energy_threshold && !dragging {
            debug!(energy = self.last_energy, "layout settled");
            self.phase = Phase::Settled;
        }
        true
    }

    fn rebuild(&mut self) {
        self.rebuild_pending = false;
        self.revision = self.revision.wrapping_add(1);

        self.graph = if self.is_empty() {
            SimGraph::default()
        } else {
            build_graph(
                &self.machines,
                &self.services,
                self.layout_center(),
                &self.graph,
                &self.config,
            )
        };

        if let Gesture::Dragging { node_id } = &self.gesture
            && self.graph.node(node_id).is_none()
        {
            self.gesture = Gesture::Idle;
        }
        if let Some(hovered) = &self.hovered
            && self.graph.node(hovered).is_none()
        {
            self.hovered = None;
        }
        if let Some(machine_id) = &self.selected_machine
            && self.graph.node(&machine_node_id(machine_id)).is_none()
        {
            self.selected_machine = None;
        }

        debug!(
            revision = self.revision,
            nodes = self.graph.len(),
            edges = self.graph.edges().len(),
            "layout graph rebuilt"
        );
        self.wake();
    }

    /// World point the hub is pinned to and gravity pulls toward.
    pub fn layout_center(&self) -> Vec2 {
        vec2(self.container.x * 0.5, self.container.y * 0.5)
    }

    pub fn graph(&self) -> &SimGraph {
        &self.graph
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn selected_machine(&self) -> Option<&str> {
        self.selected_machine.as_deref()
    }

    pub fn hovered_node(&self) -> Option<&SimNode> {
        self.hovered.as_deref().and_then(|id| self.graph.node(id))
    }

    /// No machines and no services: callers show an empty state instead of
    /// a lone hub.
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty() && self.services.is_empty()
    }

    /// Bumped on every rebuild.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped when records are swapped into the current graph without a
    /// rebuild. Labels may change under an unchanged [`Self::revision`].
    pub fn payload_revision(&self) -> u64 {
        self.payload_revision
    }

    pub fn last_energy(&self) -> f32 {
        self.last_energy
    }

    pub fn needs_repaint(&self) -> bool {
        self.phase == Phase::Active || self.rebuild_pending || self.gesture != Gesture::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::sample_snapshot;
    use eframe::egui::{Rect, pos2};

    fn state_with_sample() -> SimulationState {
        let mut state = SimulationState::new(LayoutConfig::default());
        let snapshot = sample_snapshot();
        state.set_container_size(vec2(1000.0, 700.0));
        state.set_records(snapshot.machines, snapshot.services);
        state
    }

    #[test]
    fn rebuild_waits_for_a_container() {
        let mut state = SimulationState::new(LayoutConfig::default());
        let snapshot = sample_snapshot();
        state.set_records(snapshot.machines, snapshot.services);
        state.tick();
        assert!(state.graph().is_empty());

        state.set_container_size(vec2(1000.0, 700.0));
        state.tick();
        assert_eq!(state.graph().hub().unwrap().position, vec2(500.0, 350.0));
    }

    #[test]
    fn status_changes_do_not_wake_a_settled_layout() {
        let mut state = state_with_sample();
        for _ in 0..5000 {
            state.tick();
            if state.phase() == Phase::Settled {
                break;
            }
        }
        assert_eq!(state.phase(), Phase::Settled);
        let revision = state.revision();

        let mut snapshot = sample_snapshot();
        snapshot.machines[0].is_online = false;
        state.set_records(snapshot.machines, snapshot.services);
        assert!(!state.tick());
        assert_eq!(state.revision(), revision);
        assert_eq!(state.graph().machine_online("jetson_1"), Some(false));
    }

    #[test]
    fn resize_recenters_the_hub_and_wakes() {
        let mut state = state_with_sample();
        state.tick();
        state.set_container_size(vec2(1200.0, 800.0));
        assert!(state.needs_repaint());
        state.tick();
        assert_eq!(state.graph().hub().unwrap().position, vec2(600.0, 400.0));
        assert_eq!(state.phase(), Phase::Active);
    }

    #[test]
    fn empty_records_leave_an_empty_graph() {
        let mut state = state_with_sample();
        state.tick();
        state.set_records(Vec::new(), Vec::new());
        state.tick();
        assert!(state.is_empty());
        assert!(state.graph().is_empty());
        assert!(state.graph().hub().is_none());
    }

    #[test]
    fn selection_is_dropped_when_the_machine_leaves() {
        let mut state = state_with_sample();
        state.tick();
        state.selected_machine = Some("nuc_lab".to_owned());

        let mut snapshot = sample_snapshot();
        snapshot.machines.retain(|machine| machine.machine_id != "nuc_lab");
        state.set_records(snapshot.machines, snapshot.services);
        state.tick();

        assert_eq!(state.selected_machine(), None);
    }

    #[test]
    fn payload_refresh_bumps_only_the_payload_revision() {
        let mut state = state_with_sample();
        state.tick();
        let (revision, payloads) = (state.revision(), state.payload_revision());

        let mut snapshot = sample_snapshot();
        snapshot.machines[0].hostname = "zebra-box".to_owned();
        state.set_records(snapshot.machines, snapshot.services);
        state.tick();

        assert_eq!(state.revision(), revision);
        assert_ne!(state.payload_revision(), payloads);
        assert_eq!(state.graph().node("machine-jetson_1").unwrap().label(), "zebra-box");
    }

    fn press_on(state: &mut SimulationState, bounds: Rect, node_id: &str) -> Vec2 {
        let position = state.graph().node(node_id).unwrap().position;
        let screen = state.viewport().world_to_screen(bounds, position);
        state.pointer_pressed(bounds, screen);
        assert_eq!(
            state.gesture(),
            &Gesture::Dragging {
                node_id: node_id.to_owned()
            }
        );
        position
    }

    fn canvas() -> Rect {
        Rect::from_min_size(pos2(0.0, 0.0), vec2(1000.0, 700.0))
    }

    #[test]
    fn drag_ends_when_the_dragged_node_is_removed() {
        let mut state = state_with_sample();
        state.tick();
        let bounds = canvas();
        press_on(&mut state, bounds, "service-nuc_lab-storage");

        let mut snapshot = sample_snapshot();
        snapshot
            .services
            .retain(|service| service.name != "storage");
        state.set_records(snapshot.machines, snapshot.services);
        state.tick();

        assert!(state.graph().node("service-nuc_lab-storage").is_none());
        assert_eq!(state.gesture(), &Gesture::Idle);
    }

    #[test]
    fn drag_survives_topology_churn() {
        let mut state = state_with_sample();
        state.tick();
        let bounds = canvas();
        let position = press_on(&mut state, bounds, "machine-rpi_kitchen");
        let screen = state.viewport().world_to_screen(bounds, position + vec2(60.0, 0.0));
        state.pointer_moved(bounds, screen, true);
        let pin = state.graph().node("machine-rpi_kitchen").unwrap().pin.unwrap();

        let mut snapshot = sample_snapshot();
        snapshot.services.push(ServiceRecord {
            name: "fresh".to_owned(),
            machine_id: Some("jetson_1".to_owned()),
            ..Default::default()
        });
        let revision = state.revision();
        state.set_records(snapshot.machines, snapshot.services);
        state.tick();
        assert_ne!(state.revision(), revision);

        let node = state.graph().node("machine-rpi_kitchen").unwrap();
        assert_eq!(node.pin, Some(pin));
        assert_eq!(node.position, pin);
        assert!(matches!(state.gesture(), Gesture::Dragging { .. }));

        state.pointer_released();
        assert!(state.graph().node("machine-rpi_kitchen").unwrap().pin.is_none());
    }

    #[test]
    fn release_outside_the_canvas_ends_a_drag() {
        let mut state = state_with_sample();
        state.tick();
        let bounds = canvas();
        press_on(&mut state, bounds, "machine-jetson_1");

        state.pointer_moved(bounds, pos2(-40.0, 900.0), false);
        assert!(matches!(state.gesture(), Gesture::Dragging { .. }));
        state.pointer_left();
        state.pointer_released();

        assert_eq!(state.gesture(), &Gesture::Idle);
        assert!(state.graph().node("machine-jetson_1").unwrap().pin.is_none());
    }

    #[test]
    fn release_outside_the_canvas_ends_a_pan() {
        let mut state = state_with_sample();
        state.tick();
        let bounds = canvas();
        state.pointer_pressed(bounds, pos2(5.0, 5.0));
        assert!(matches!(state.gesture(), Gesture::Panning { .. }));

        state.pointer_moved(bounds, pos2(1200.0, -30.0), false);
        state.pointer_left();
        assert!(matches!(state.gesture(), Gesture::Panning { .. }));
        state.pointer_released();

        assert_eq!(state.gesture(), &Gesture::Idle);
    }

    #[test]
    fn wheel_during_a_pan_keeps_the_cursor_anchored() {
        let mut state = state_with_sample();
        state.tick();
        let bounds = canvas();
        let cursor = pos2(25.0, 15.0);

        state.pointer_pressed(bounds, pos2(5.0, 5.0));
        state.pointer_moved(bounds, cursor, true);
        let before = state.viewport().screen_to_world(bounds, cursor);

        state.wheel(bounds, cursor, ZoomDirection::In);
        state.pointer_moved(bounds, cursor, true);
        let after = state.viewport().screen_to_world(bounds, cursor);
        assert!((after - before).length() < 1e-3, "{before:?} -> {after:?}");

        let grabbed = state.viewport().screen_to_world(bounds, cursor);
        let next = pos2(65.0, 45.0);
        state.pointer_moved(bounds, next, true);
        let under = state.viewport().screen_to_world(bounds, next);
        assert!((under - grabbed).length() < 1e-3, "{grabbed:?} -> {under:?}");

        state.pointer_released();
        assert_eq!(state.gesture(), &Gesture::Idle);
    }
}
