use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{Align2, Color32, FontId, Sense, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::layout::{NodeKind, NodePayload, SimNode};
use crate::scene::{FrameContext, paint_background, paint_scene};

use super::super::{SearchMatchCache, ViewModel};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

fn hover_text(node: &SimNode) -> String {
    match &node.payload {
        NodePayload::Hub => format!("{}  |  fleet hub", node.label()),
        NodePayload::Machine(machine) => format!(
            "{}  |  {}  |  {}  |  {}/{} running",
            machine.display_name(),
            machine.primary_ip(),
            if machine.is_online { "online" } else { "offline" },
            machine.running_count,
            machine.node_count
        ),
        NodePayload::Service(service) => {
            let mut text = format!(
                "{}  |  {}  |  on {}",
                node.label(),
                service.status.label(),
                service.group_id()
            );
            if !service.node_type.is_empty() {
                text.push_str(&format!("  |  {}", service.node_type));
            }
            if !service.version.is_empty() {
                text.push_str(&format!("  |  v{}", service.version));
            }
            text
        }
    }
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.state.revision()
            && cached.payload_revision == self.state.payload_revision()
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .state
            .graph()
            .nodes()
            .iter()
            .filter(|node| node.kind() != NodeKind::Hub)
            .filter(|node| fuzzy_match_score(&matcher, node.label(), search_query).is_some())
            .map(|node| node.id.clone())
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            graph_revision: self.state.revision(),
            payload_revision: self.state.payload_revision(),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.state.set_container_size(rect.size());
        self.handle_pointer_input(ui, rect, &response);
        self.state.tick();

        paint_background(&painter, rect, self.state.viewport());

        if self.state.is_empty() {
            self.scene.clear();
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No machines or services reported yet",
                FontId::proportional(16.0),
                Color32::from_gray(170),
            );
            if self.state.needs_repaint() {
                ui.ctx().request_repaint();
            }
            return;
        }

        let search_matches = self.cached_search_matches();
        let frame = FrameContext {
            selected_machine: self.state.selected_machine(),
            search_matches: search_matches.as_deref(),
        };
        self.last_stats = self.scene.reconcile(self.state.graph(), &frame);

        paint_scene(&painter, rect, &self.scene, self.state.viewport());
        self.update_cursor(ui);

        if let Some(node) = self.state.hovered_node() {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hover_text(node),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if self.state.needs_repaint() {
            ui.ctx().request_repaint();
        }
    }
}
