use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Tunables for the layout engine. Any field missing from a config file keeps
/// its default.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub gravity: f32,
    pub repulsion_strength: f32,
    pub repulsion_margin: f32,
    pub mesh_rest_length: f32,
    pub mesh_stiffness: f32,
    pub link_rest_length: f32,
    pub link_stiffness: f32,
    pub damping: f32,
    pub max_velocity: f32,
    pub energy_threshold: f32,
    pub hub_radius: f32,
    pub machine_radius: f32,
    pub service_radius: f32,
    pub machine_ring_radius: f32,
    pub service_ring_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            gravity: 0.002,
            repulsion_strength: 3000.0,
            repulsion_margin: 40.0,
            mesh_rest_length: 180.0,
            mesh_stiffness: 0.004,
            link_rest_length: 80.0,
            link_stiffness: 0.008,
            damping: 0.88,
            max_velocity: 8.0,
            energy_threshold: 0.01,
            hub_radius: 32.0,
            machine_radius: 26.0,
            service_radius: 12.0,
            machine_ring_radius: 180.0,
            service_ring_radius: 80.0,
        }
    }
}

impl LayoutConfig {
    /// Clamp values into ranges where the integration stays stable.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        self.gravity = finite_or(self.gravity, defaults.gravity).clamp(0.0, 0.05);
        self.repulsion_strength =
            finite_or(self.repulsion_strength, defaults.repulsion_strength).clamp(0.0, 50_000.0);
        self.repulsion_margin =
            finite_or(self.repulsion_margin, defaults.repulsion_margin).clamp(0.0, 400.0);
        self.mesh_rest_length =
            finite_or(self.mesh_rest_length, defaults.mesh_rest_length).clamp(10.0, 2000.0);
        self.mesh_stiffness =
            finite_or(self.mesh_stiffness, defaults.mesh_stiffness).clamp(0.0, 0.2);
        self.link_rest_length =
            finite_or(self.link_rest_length, defaults.link_rest_length).clamp(10.0, 2000.0);
        self.link_stiffness =
            finite_or(self.link_stiffness, defaults.link_stiffness).clamp(0.0, 0.2);
        self.damping = finite_or(self.damping, defaults.damping).clamp(0.0, 0.99);
        self.max_velocity = finite_or(self.max_velocity, defaults.max_velocity).clamp(0.5, 100.0);
        self.energy_threshold =
            finite_or(self.energy_threshold, defaults.energy_threshold).clamp(1e-6, 10.0);
        self.hub_radius = finite_or(self.hub_radius, defaults.hub_radius).clamp(4.0, 200.0);
        self.machine_radius =
            finite_or(self.machine_radius, defaults.machine_radius).clamp(4.0, 200.0);
        self.service_radius =
            finite_or(self.service_radius, defaults.service_radius).clamp(2.0, 200.0);
        self.machine_ring_radius =
            finite_or(self.machine_ring_radius, defaults.machine_ring_radius).clamp(10.0, 4000.0);
        self.service_ring_radius =
            finite_or(self.service_ring_radius, defaults.service_ring_radius).clamp(10.0, 4000.0);
        self
    }
}

pub fn load_layout_config(path: &Path) -> Result<LayoutConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read layout config {}", path.display()))?;
    let config: LayoutConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse layout config {}", path.display()))?;
    Ok(config.sanitized())
}
