use eframe::egui::vec2;

use crate::layout::{NodeKind, NodePayload, SimGraph, SimNode};

use super::style::{
    HUB_FILL, MACHINE_OFFLINE, MACHINE_ONLINE, OFFLINE_DOT, ONLINE_DOT, SELECTED, status_color,
};
use super::{DetailSource, FrameContext, GroupAttrs, Primitive, write_text};

/// Constructor and updater for one node kind. `build` runs once when a group
/// first appears; `patch` runs every frame and returns how many text fields it
/// rewrote.
pub struct KindVisual {
    pub build: fn(&SimNode) -> Vec<Primitive>,
    pub patch: fn(&SimNode, &SimGraph, &FrameContext<'_>, &mut GroupAttrs) -> usize,
}

static HUB: KindVisual = KindVisual {
    build: build_hub,
    patch: patch_hub,
};

static MACHINE: KindVisual = KindVisual {
    build: build_machine,
    patch: patch_machine,
};

static SERVICE: KindVisual = KindVisual {
    build: build_service,
    patch: patch_service,
};

pub fn visual_for(kind: NodeKind) -> &'static KindVisual {
    match kind {
        NodeKind::Hub => &HUB,
        NodeKind::Machine => &MACHINE,
        NodeKind::Service => &SERVICE,
    }
}

fn build_hub(node: &SimNode) -> Vec<Primitive> {
    vec![
        Primitive::Disc {
            radius: node.radius,
        },
        Primitive::Label {
            offset: vec2(0.0, node.radius + 12.0),
        },
        Primitive::Detail {
            offset: vec2(0.0, node.radius + 26.0),
        },
    ]
}

fn build_machine(node: &SimNode) -> Vec<Primitive> {
    let half_size = vec2(node.radius * 1.8, node.radius);
    vec![
        Primitive::SelectionHalo {
            radius: half_size.x + 8.0,
        },
        Primitive::Card { half_size },
        Primitive::StatusDot {
            offset: vec2(half_size.x - 9.0, -half_size.y + 9.0),
            radius: 4.0,
        },
        Primitive::Label {
            offset: vec2(0.0, -5.0),
        },
        Primitive::Detail {
            offset: vec2(0.0, 9.0),
        },
    ]
}

fn build_service(node: &SimNode) -> Vec<Primitive> {
    vec![
        Primitive::SelectionHalo {
            radius: node.radius + 6.0,
        },
        Primitive::StaleRing {
            radius: node.radius + 4.0,
        },
        Primitive::Disc {
            radius: node.radius,
        },
        Primitive::Label {
            offset: vec2(0.0, node.radius + 10.0),
        },
        Primitive::Detail {
            offset: vec2(0.0, node.radius + 23.0),
        },
    ]
}

/// Attributes every kind shares: search state and the label.
fn patch_common(
    node: &SimNode,
    frame: &FrameContext<'_>,
    label: &str,
    attrs: &mut GroupAttrs,
) -> usize {
    let matched = frame
        .search_matches
        .is_some_and(|matches| matches.contains(&node.id));
    attrs.matched = matched;
    attrs.dimmed = frame.search_matches.is_some() && !matched;

    usize::from(write_text(&mut attrs.label, label))
}

/// Formats the detail only when `source` differs from what the current text
/// was built from.
fn patch_detail(
    attrs: &mut GroupAttrs,
    source: DetailSource,
    format: impl FnOnce() -> String,
) -> usize {
    if attrs.detail_source == source {
        return 0;
    }
    attrs.detail_source = source;
    usize::from(write_text(&mut attrs.detail, &format()))
}

fn patch_hub(
    node: &SimNode,
    graph: &SimGraph,
    frame: &FrameContext<'_>,
    attrs: &mut GroupAttrs,
) -> usize {
    let machines = graph.machine_count();
    attrs.fill = HUB_FILL;
    attrs.accent = HUB_FILL;
    attrs.selected = false;
    attrs.stale = false;
    patch_common(node, frame, "fleet", attrs)
        + patch_detail(attrs, DetailSource::MachineCount(machines), || {
            format!("{machines} machines")
        })
}

fn patch_machine(
    node: &SimNode,
    _graph: &SimGraph,
    frame: &FrameContext<'_>,
    attrs: &mut GroupAttrs,
) -> usize {
    let NodePayload::Machine(machine) = &node.payload else {
        return 0;
    };

    attrs.fill = if machine.is_online {
        MACHINE_ONLINE
    } else {
        MACHINE_OFFLINE
    };
    attrs.accent = if machine.is_online {
        ONLINE_DOT
    } else {
        OFFLINE_DOT
    };
    attrs.selected = frame.selected_machine == Some(machine.machine_id.as_str());
    attrs.stale = !machine.is_online;

    let ip = machine.primary_ip();
    let unchanged = matches!(
        &attrs.detail_source,
        DetailSource::Machine { ip: last_ip, online, running, nodes }
            if last_ip == ip
                && *online == machine.is_online
                && *running == machine.running_count
                && *nodes == machine.node_count
    );
    let writes = patch_common(node, frame, machine.display_name(), attrs);
    if unchanged {
        return writes;
    }

    let source = DetailSource::Machine {
        ip: ip.to_owned(),
        online: machine.is_online,
        running: machine.running_count,
        nodes: machine.node_count,
    };
    writes
        + patch_detail(attrs, source, || {
            if machine.is_online {
                format!("{ip}  {}/{}", machine.running_count, machine.node_count)
            } else {
                format!("{ip}  offline")
            }
        })
}

fn patch_service(
    node: &SimNode,
    graph: &SimGraph,
    frame: &FrameContext<'_>,
    attrs: &mut GroupAttrs,
) -> usize {
    let NodePayload::Service(service) = &node.payload else {
        return 0;
    };

    let machine_id = service.group_id();
    attrs.fill = status_color(service.status);
    attrs.accent = SELECTED;
    attrs.selected = frame.selected_machine == Some(machine_id);
    attrs.stale = graph.machine_online(machine_id) == Some(false);
    patch_common(node, frame, node.label(), attrs)
        + usize::from(write_text(&mut attrs.detail, service.status.label()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::{MachineRecord, ServiceRecord, ServiceStatus};
    use eframe::egui::Vec2;

    fn service_node(status: ServiceStatus) -> SimNode {
        SimNode {
            id: "service-a-x".to_owned(),
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            pin: None,
            radius: 12.0,
            payload: NodePayload::Service(ServiceRecord {
                name: "x".to_owned(),
                machine_id: Some("a".to_owned()),
                status,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn every_kind_builds_a_label_slot() {
        for kind in [NodeKind::Hub, NodeKind::Machine, NodeKind::Service] {
            let payload = match kind {
                NodeKind::Hub => NodePayload::Hub,
                NodeKind::Machine => NodePayload::Machine(MachineRecord::default()),
                NodeKind::Service => NodePayload::Service(ServiceRecord::default()),
            };
            let node = SimNode {
                payload,
                ..service_node(ServiceStatus::Unknown)
            };
            let shapes = (visual_for(kind).build)(&node);
            assert!(
                shapes
                    .iter()
                    .any(|shape| matches!(shape, Primitive::Label { .. }))
            );
        }
    }

    #[test]
    fn status_change_rewrites_only_the_detail() {
        let graph = SimGraph::default();
        let frame = FrameContext::default();
        let mut attrs = GroupAttrs::default();

        let running = service_node(ServiceStatus::Running);
        assert_eq!(patch_service(&running, &graph, &frame, &mut attrs), 2);
        assert_eq!(attrs.detail, "running");

        let failed = service_node(ServiceStatus::Failed);
        assert_eq!(patch_service(&failed, &graph, &frame, &mut attrs), 1);
        assert_eq!(attrs.detail, "failed");
        assert_eq!(attrs.fill, status_color(ServiceStatus::Failed));
    }

    fn machine_node(running: u32) -> SimNode {
        SimNode {
            id: "machine-a".to_owned(),
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            pin: None,
            radius: 26.0,
            payload: NodePayload::Machine(MachineRecord {
                machine_id: "a".to_owned(),
                hostname: "a-host".to_owned(),
                is_online: true,
                ips: vec!["10.0.0.5".to_owned()],
                node_count: 3,
                running_count: running,
            }),
        }
    }

    #[test]
    fn machine_detail_is_formatted_only_when_its_inputs_change() {
        let graph = SimGraph::default();
        let frame = FrameContext::default();
        let mut attrs = GroupAttrs::default();

        assert_eq!(patch_machine(&machine_node(1), &graph, &frame, &mut attrs), 2);
        assert_eq!(attrs.detail, "10.0.0.5  1/3");
        assert_eq!(patch_machine(&machine_node(1), &graph, &frame, &mut attrs), 0);

        // A stale text with matching inputs is left alone.
        attrs.detail.clear();
        assert_eq!(patch_machine(&machine_node(1), &graph, &frame, &mut attrs), 0);
        assert!(attrs.detail.is_empty());

        assert_eq!(patch_machine(&machine_node(2), &graph, &frame, &mut attrs), 1);
        assert_eq!(attrs.detail, "10.0.0.5  2/3");
    }
}
