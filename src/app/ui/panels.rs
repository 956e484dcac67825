use std::collections::VecDeque;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use crate::config::LayoutConfig;
use crate::layout::{NodeKind, Phase, SimulationState};
use crate::scene::{ReconcileStats, Scene};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn new(layout: LayoutConfig, source_label: String) -> Self {
        let state = SimulationState::new(layout);
        Self {
            tuning: *state.config(),
            state,
            scene: Scene::default(),
            source_label,
            search: String::new(),
            search_match_cache: None,
            last_error: None,
            last_stats: ReconcileStats::default(),
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    fn count_kind(&self, kind: NodeKind) -> usize {
        self.state
            .graph()
            .nodes()
            .iter()
            .filter(|node| node.kind() == kind)
            .count()
    }

    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("fleetmap");
                    ui.separator();
                    ui.label(format!("source: {}", self.source_label));
                    ui.label(format!("machines: {}", self.count_kind(NodeKind::Machine)));
                    ui.label(format!("services: {}", self.count_kind(NodeKind::Service)));
                    let phase = match self.state.phase() {
                        Phase::Active => "settling",
                        Phase::Settled => "settled",
                    };
                    ui.label(format!("layout: {phase}"));
                    if let Some(machine_id) = self.state.selected_machine() {
                        ui.label(
                            RichText::new(format!("selected: {machine_id}"))
                                .color(Color32::from_rgb(245, 206, 93)),
                        );
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
                if let Some(error) = &self.last_error {
                    ui.label(
                        RichText::new(format!("snapshot error: {error}"))
                            .color(Color32::from_rgb(232, 93, 86)),
                    );
                }
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }
}
