use eframe::egui::Color32;

use crate::fleet::ServiceStatus;

pub(super) const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const GRID_LINE: Color32 = Color32::from_rgba_premultiplied(24, 28, 31, 70);
pub(super) const HUB_FILL: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const MACHINE_ONLINE: Color32 = Color32::from_rgb(52, 73, 94);
pub(super) const MACHINE_OFFLINE: Color32 = Color32::from_rgb(58, 60, 66);
pub(super) const ONLINE_DOT: Color32 = Color32::from_rgb(88, 204, 120);
pub(super) const OFFLINE_DOT: Color32 = Color32::from_rgb(120, 120, 128);
pub(super) const SELECTED: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const MATCHED: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const MESH_EDGE: Color32 = Color32::from_rgba_premultiplied(58, 64, 72, 200);
pub(super) const LINK_EDGE: Color32 = Color32::from_rgba_premultiplied(50, 50, 50, 180);
pub(super) const HIGHLIGHT_EDGE: Color32 = Color32::from_rgb(246, 206, 104);
pub(super) const LABEL: Color32 = Color32::from_gray(238);
pub(super) const DETAIL: Color32 = Color32::from_gray(160);
pub(super) const OUTLINE: Color32 = Color32::from_rgba_premultiplied(13, 13, 13, 190);

pub(super) fn status_color(status: ServiceStatus) -> Color32 {
    match status {
        ServiceStatus::Running => Color32::from_rgb(88, 204, 120),
        ServiceStatus::Failed => Color32::from_rgb(232, 93, 86),
        ServiceStatus::Building | ServiceStatus::Installing => Color32::from_rgb(241, 176, 72),
        ServiceStatus::Stopped => Color32::from_rgb(132, 140, 150),
        ServiceStatus::NotInstalled => Color32::from_rgb(92, 98, 108),
        ServiceStatus::Unknown => Color32::from_rgb(110, 116, 140),
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| ((a as f32 * (1.0 - amount)) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

/// Darken and fade; alpha keeps a floor so dimmed shapes stay visible.
pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + factor * 0.55)) as u8,
    )
}
