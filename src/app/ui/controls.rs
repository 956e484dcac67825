use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};

use crate::config::LayoutConfig;

use super::super::ViewModel;

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: RangeInclusive<f32>,
    label: &str,
    hint: &str,
) -> bool {
    ui.add(egui::Slider::new(value, range).text(label))
        .on_hover_text(hint)
        .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Fleet Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (host or service name)")
            .on_hover_text("Fuzzy-highlight matching nodes and dim the rest.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.collapsing("Physics tuning", |ui| {
            let tuning = &mut self.tuning;
            let mut changed = false;

            changed |= tuning_slider(
                ui,
                &mut tuning.gravity,
                0.0..=0.02,
                "Gravity",
                "Pull of every free node toward the hub.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.repulsion_strength,
                0.0..=12_000.0,
                "Repulsion",
                "Push between nodes closer than their radii plus the margin.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.repulsion_margin,
                0.0..=160.0,
                "Margin",
                "Extra spacing kept between node rims.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.mesh_rest_length,
                60.0..=600.0,
                "Machine distance",
                "Rest length of hub to machine springs.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.link_rest_length,
                30.0..=300.0,
                "Service distance",
                "Rest length of machine to service springs.",
            );
            changed |= tuning_slider(
                ui,
                &mut tuning.damping,
                0.5..=0.98,
                "Damping",
                "Velocity kept per step. Lower settles faster.",
            );

            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    *tuning = LayoutConfig::default();
                    changed = true;
                }
            });

            if changed {
                self.state.set_config(*tuning);
            }
        });

        ui.separator();
        ui.collapsing("Diagnostics", |ui| {
            ui.checkbox(&mut self.show_fps_bar, "Show FPS in top bar");
            ui.label(format!("kinetic energy: {:.4}", self.state.last_energy()));
            ui.label(format!("graph revision: {}", self.state.revision()));
            ui.label(format!(
                "last frame: {} created / {} removed / {} reshaped / {} text writes",
                self.last_stats.groups_created,
                self.last_stats.groups_removed,
                self.last_stats.shapes_rebuilt,
                self.last_stats.text_writes
            ));
        });

        if let Some(node) = self.state.hovered_node() {
            ui.separator();
            ui.label(format!("hovered: {}", node.id));
        }
    }
}
