use std::f32::consts::TAU;

use eframe::egui::{
    Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, StrokeKind, Vec2, pos2,
};

use crate::layout::{EdgeKind, Viewport};

use super::style::{
    BACKGROUND, DETAIL, GRID_LINE, HIGHLIGHT_EDGE, LABEL, LINK_EDGE, MATCHED, MESH_EDGE, OUTLINE,
    SELECTED, blend_color, dim_color,
};
use super::{GroupAttrs, NodeGroup, Primitive, Scene};

const GRID_STEP: f32 = 80.0;
const STALE_SEGMENTS: usize = 40;

pub fn paint_background(painter: &Painter, bounds: Rect, viewport: &Viewport) {
    painter.rect_filled(bounds, 0.0, BACKGROUND);

    let stroke = Stroke::new(1.0, GRID_LINE);
    let first = vec_floor(viewport.origin(), GRID_STEP);

    let mut x = first.x;
    while x <= viewport.x + viewport.w {
        let top = viewport.world_to_screen(bounds, Vec2::new(x, viewport.y));
        painter.line_segment([pos2(top.x, bounds.top()), pos2(top.x, bounds.bottom())], stroke);
        x += GRID_STEP;
    }

    let mut y = first.y;
    while y <= viewport.y + viewport.h {
        let left = viewport.world_to_screen(bounds, Vec2::new(viewport.x, y));
        painter.line_segment([pos2(bounds.left(), left.y), pos2(bounds.right(), left.y)], stroke);
        y += GRID_STEP;
    }
}

fn vec_floor(value: Vec2, step: f32) -> Vec2 {
    Vec2::new(
        (value.x / step).floor() * step,
        (value.y / step).floor() * step,
    )
}

/// Draw edges first, then node groups in graph order.
pub fn paint_scene(painter: &Painter, bounds: Rect, scene: &Scene, viewport: &Viewport) {
    let scale = viewport.scale(bounds);
    let size_scale = (scale.x + scale.y) * 0.5;

    for edge in scene.edges().iter().filter(|edge| edge.visible) {
        let (width, color) = match (edge.highlighted, edge.kind) {
            (true, _) => (2.4, HIGHLIGHT_EDGE),
            (false, EdgeKind::Mesh) => (1.6, MESH_EDGE),
            (false, EdgeKind::Link) => (1.1, LINK_EDGE),
        };
        let from = viewport.world_to_screen(bounds, edge.from);
        let to = viewport.world_to_screen(bounds, edge.to);
        painter.line_segment([from, to], Stroke::new(width * size_scale.sqrt(), color));
    }

    for (_, group) in scene.groups() {
        let center = viewport.world_to_screen(bounds, group.translation);
        if !bounds.expand(120.0 * size_scale).contains(center) {
            continue;
        }
        paint_group(painter, center, size_scale, group);
    }
}

fn paint_group(painter: &Painter, center: Pos2, scale: f32, group: &NodeGroup) {
    let attrs = &group.attrs;
    let fill = shaded(attrs.fill, attrs);
    let font = FontId::proportional((12.0 * scale.sqrt()).clamp(9.0, 18.0));
    let small = FontId::proportional((10.0 * scale.sqrt()).clamp(8.0, 15.0));

    for shape in &group.shapes {
        match shape {
            Primitive::Disc { radius } => {
                let outline = if attrs.matched { MATCHED } else { OUTLINE };
                painter.circle_filled(center, radius * scale, fill);
                painter.circle_stroke(center, radius * scale, Stroke::new(1.2, outline));
            }
            Primitive::Card { half_size } => {
                let rect = Rect::from_center_size(center, *half_size * 2.0 * scale);
                let outline = if attrs.selected {
                    SELECTED
                } else if attrs.matched {
                    MATCHED
                } else {
                    OUTLINE
                };
                painter.rect_filled(rect, 6.0 * scale, fill);
                painter.rect_stroke(
                    rect,
                    6.0 * scale,
                    Stroke::new(1.4, outline),
                    StrokeKind::Inside,
                );
            }
            Primitive::StatusDot { offset, radius } => {
                painter.circle_filled(
                    center + *offset * scale,
                    radius * scale,
                    shaded(attrs.accent, attrs),
                );
            }
            Primitive::StaleRing { radius } if attrs.stale => {
                painter.extend(dashed_ring(center, radius * scale, Stroke::new(1.0, DETAIL)));
            }
            Primitive::StaleRing { .. } => {}
            Primitive::SelectionHalo { radius } if attrs.selected => {
                painter.circle_stroke(
                    center,
                    radius * scale,
                    Stroke::new(2.0, Color32::from_rgba_unmultiplied(245, 206, 93, 150)),
                );
            }
            Primitive::SelectionHalo { .. } => {}
            Primitive::Label { offset } => {
                painter.text(
                    center + *offset * scale,
                    Align2::CENTER_CENTER,
                    &attrs.label,
                    font.clone(),
                    shaded(LABEL, attrs),
                );
            }
            Primitive::Detail { offset } => {
                painter.text(
                    center + *offset * scale,
                    Align2::CENTER_CENTER,
                    &attrs.detail,
                    small.clone(),
                    shaded(DETAIL, attrs),
                );
            }
        }
    }
}

/// Apply stale and search dimming, then selection tint.
fn shaded(color: Color32, attrs: &GroupAttrs) -> Color32 {
    let color = if attrs.dimmed {
        dim_color(color, 0.38)
    } else if attrs.stale {
        dim_color(color, 0.55)
    } else {
        color
    };
    if attrs.selected {
        blend_color(color, SELECTED, 0.25)
    } else {
        color
    }
}

fn dashed_ring(center: Pos2, radius: f32, stroke: Stroke) -> Vec<Shape> {
    let points = (0..=STALE_SEGMENTS)
        .map(|step| {
            let angle = TAU * step as f32 / STALE_SEGMENTS as f32;
            center + Vec2::angled(angle) * radius
        })
        .collect::<Vec<_>>();
    let circumference = TAU * radius;
    let dash = (circumference / 24.0).max(2.0);
    Shape::dashed_line(&points, stroke, dash, dash * 0.8)
}
