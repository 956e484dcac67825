use eframe::egui::{CursorIcon, Rect, Response, Ui};

use crate::layout::{Gesture, ZoomDirection};

use super::super::ViewModel;

impl ViewModel {
    /// Forward raw pointer input to the layout controller. Release and motion
    /// are read globally so a drag keeps tracking outside the canvas.
    pub(in crate::app) fn handle_pointer_input(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let (pointer, pressed, released, moving, scroll) = ui.input(|input| {
            (
                input.pointer.latest_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.is_moving(),
                input.raw_scroll_delta.y,
            )
        });
        let hovered = response.hovered();

        if let Some(pointer) = pointer {
            let inside = hovered && rect.contains(pointer);
            if pressed && inside {
                self.state.pointer_pressed(rect, pointer);
            } else if moving {
                self.state.pointer_moved(rect, pointer, inside);
            }

            if inside && let Some(direction) = ZoomDirection::from_scroll(scroll) {
                self.state.wheel(rect, pointer, direction);
            }
        }

        if released {
            self.state.pointer_released();
        }
        if !hovered {
            self.state.pointer_left();
        }
    }

    pub(in crate::app) fn update_cursor(&self, ui: &Ui) {
        let icon = match self.state.gesture() {
            Gesture::Dragging { .. } => CursorIcon::Grabbing,
            Gesture::Panning { .. } => CursorIcon::Move,
            Gesture::Idle if self.state.hovered_node().is_some() => CursorIcon::PointingHand,
            Gesture::Idle => return,
        };
        ui.output_mut(|output| output.cursor_icon = icon);
    }
}
