use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::records::{MachineRecord, ServiceRecord, ServiceStatus};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FleetSnapshot {
    pub machines: Vec<MachineRecord>,
    pub services: Vec<ServiceRecord>,
}

impl FleetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.machines.is_empty() && self.services.is_empty()
    }

    pub fn signature(&self) -> TopologySignature {
        TopologySignature::of(&self.machines, &self.services)
    }
}

/// Identity of a record set: sorted machine ids plus sorted `machineId:name`
/// service pairs. Status or address changes leave it untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopologySignature {
    machines: Vec<String>,
    services: Vec<String>,
}

impl TopologySignature {
    pub fn of(machines: &[MachineRecord], services: &[ServiceRecord]) -> Self {
        let mut machine_ids = machines
            .iter()
            .map(|machine| machine.machine_id.clone())
            .collect::<Vec<_>>();
        machine_ids.sort_unstable();

        let mut service_keys = services
            .iter()
            .map(|service| format!("{}:{}", service.group_id(), service.name))
            .collect::<Vec<_>>();
        service_keys.sort_unstable();

        Self {
            machines: machine_ids,
            services: service_keys,
        }
    }
}

pub fn parse_snapshot(raw: &str) -> Result<FleetSnapshot> {
    serde_json::from_str(raw).context("fleet snapshot is not valid JSON")
}

pub fn load_snapshot(path: &Path) -> Result<FleetSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fleet snapshot {}", path.display()))?;
    parse_snapshot(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Small built-in fleet shown when no snapshot file is given.
pub fn sample_snapshot() -> FleetSnapshot {
    let machine = |id: &str, hostname: &str, ip: &str, online: bool, nodes: u32, running: u32| {
        MachineRecord {
            machine_id: id.to_owned(),
            hostname: hostname.to_owned(),
            is_online: online,
            ips: vec![ip.to_owned()],
            node_count: nodes,
            running_count: running,
        }
    };
    let service = |machine_id: &str, name: &str, status: ServiceStatus, node_type: &str| {
        ServiceRecord {
            name: name.to_owned(),
            machine_id: Some(machine_id.to_owned()),
            status,
            node_type: node_type.to_owned(),
            version: "0.1.0".to_owned(),
        }
    };

    FleetSnapshot {
        machines: vec![
            machine("jetson_1", "jetson-orin", "192.168.1.20", true, 3, 2),
            machine("rpi_kitchen", "rpi-kitchen", "192.168.1.31", true, 2, 2),
            machine("nuc_lab", "nuc-lab", "192.168.1.40", false, 2, 0),
        ],
        services: vec![
            service("jetson_1", "rtsp-camera", ServiceStatus::Running, "rust"),
            service("jetson_1", "inference", ServiceStatus::Running, "python"),
            service("jetson_1", "recorder", ServiceStatus::Failed, "rust"),
            service("rpi_kitchen", "openmeteo", ServiceStatus::Running, "rust"),
            service("rpi_kitchen", "system-telemetry", ServiceStatus::Building, "rust"),
            service("nuc_lab", "foxglove-bridge", ServiceStatus::Stopped, "rust"),
            service("nuc_lab", "storage", ServiceStatus::NotInstalled, "rust"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_ignores_order_and_status() {
        let snapshot = sample_snapshot();
        let mut shuffled = snapshot.clone();
        shuffled.machines.reverse();
        shuffled.services.reverse();
        shuffled.machines[0].is_online = !shuffled.machines[0].is_online;
        shuffled.services[1].status = ServiceStatus::Failed;

        assert_eq!(snapshot.signature(), shuffled.signature());
    }

    #[test]
    fn signature_changes_when_a_service_moves() {
        let snapshot = sample_snapshot();
        let mut moved = snapshot.clone();
        moved.services[0].machine_id = Some("rpi_kitchen".to_owned());

        assert_ne!(snapshot.signature(), moved.signature());
    }

    #[test]
    fn parse_accepts_sparse_documents() {
        let snapshot = parse_snapshot(r#"{"machines":[{"machineId":"a","isOnline":true}]}"#)
            .unwrap();
        assert_eq!(snapshot.machines.len(), 1);
        assert!(snapshot.machines[0].is_online);
        assert!(snapshot.services.is_empty());

        assert!(parse_snapshot("{").is_err());
        assert!(parse_snapshot("{}").unwrap().is_empty());
    }
}
