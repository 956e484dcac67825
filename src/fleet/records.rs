use serde::Deserialize;

/// Sentinel group for services that do not report an owning machine.
pub const LOCAL_MACHINE_ID: &str = "local";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MachineRecord {
    pub machine_id: String,
    pub hostname: String,
    pub is_online: bool,
    pub ips: Vec<String>,
    pub node_count: u32,
    pub running_count: u32,
}

impl MachineRecord {
    pub fn display_name(&self) -> &str {
        if !self.hostname.trim().is_empty() {
            &self.hostname
        } else if !self.machine_id.trim().is_empty() {
            &self.machine_id
        } else {
            "unknown host"
        }
    }

    pub fn primary_ip(&self) -> &str {
        self.ips
            .iter()
            .map(String::as_str)
            .find(|ip| !ip.trim().is_empty())
            .unwrap_or("no ip")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceStatus {
    Running,
    Stopped,
    Failed,
    Building,
    Installing,
    NotInstalled,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ServiceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
            Self::Building => "building",
            Self::Installing => "installing",
            Self::NotInstalled => "not-installed",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceRecord {
    pub name: String,
    pub machine_id: Option<String>,
    pub status: ServiceStatus,
    pub node_type: String,
    pub version: String,
}

impl ServiceRecord {
    /// Owning machine id, or the `"local"` group when the record has none.
    pub fn group_id(&self) -> &str {
        self.machine_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(LOCAL_MACHINE_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_machine_degrades_to_placeholders() {
        let machine: MachineRecord = serde_json::from_str(r#"{"machineId":"jetson_1"}"#).unwrap();
        assert_eq!(machine.display_name(), "jetson_1");
        assert_eq!(machine.primary_ip(), "no ip");
        assert!(!machine.is_online);

        let anonymous = MachineRecord::default();
        assert_eq!(anonymous.display_name(), "unknown host");
    }

    #[test]
    fn status_strings_map_to_variants() {
        let service: ServiceRecord =
            serde_json::from_str(r#"{"name":"rtsp","status":"not-installed"}"#).unwrap();
        assert_eq!(service.status, ServiceStatus::NotInstalled);

        let odd: ServiceRecord =
            serde_json::from_str(r#"{"name":"rtsp","status":"exploded"}"#).unwrap();
        assert_eq!(odd.status, ServiceStatus::Unknown);

        let missing: ServiceRecord = serde_json::from_str(r#"{"name":"rtsp"}"#).unwrap();
        assert_eq!(missing.status, ServiceStatus::Unknown);
    }

    #[test]
    fn services_without_machine_fall_into_local_group() {
        let mut service = ServiceRecord {
            name: "weather".to_owned(),
            ..Default::default()
        };
        assert_eq!(service.group_id(), LOCAL_MACHINE_ID);

        service.machine_id = Some(String::new());
        assert_eq!(service.group_id(), LOCAL_MACHINE_ID);

        service.machine_id = Some("orin".to_owned());
        assert_eq!(service.group_id(), "orin");
    }
}
