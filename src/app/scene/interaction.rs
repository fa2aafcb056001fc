use eframe::egui::{self, PointerButton, Rect, Ui, Vec2};

use topic_explorer::explore::PointerEvent;

use super::super::ViewModel;

/// Scroll distance, in points, that counts as one zoom step.
const SCROLL_POINTS_PER_STEP: f32 = 50.0;

fn pan_button_dragged(response: &egui::Response) -> bool {
    response.dragged_by(PointerButton::Secondary) || response.dragged_by(PointerButton::Middle)
}

impl ViewModel {
    /// Translates this frame's egui input on the scene into explorer events.
    pub(in crate::app) fn collect_pointer_events(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) -> Vec<PointerEvent> {
        let mut events = Vec::new();

        if response.drag_started_by(PointerButton::Secondary)
            || response.drag_started_by(PointerButton::Middle)
        {
            let origin = response
                .interact_pointer_pos()
                .unwrap_or_else(|| rect.center());
            events.push(PointerEvent::DragStart(origin));
        }

        if pan_button_dragged(response) {
            let delta = response.drag_delta();
            if delta != Vec2::ZERO {
                events.push(PointerEvent::Drag(delta));
            }
        }

        if response.drag_stopped_by(PointerButton::Secondary)
            || response.drag_stopped_by(PointerButton::Middle)
        {
            events.push(PointerEvent::DragEnd);
        }

        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                let anchor = response.hover_pos().unwrap_or_else(|| rect.center());
                events.push(PointerEvent::Wheel {
                    anchor,
                    steps: scroll / SCROLL_POINTS_PER_STEP,
                });
            }
        }

        match response.hover_pos() {
            Some(position) => {
                if self.last_hover_pos != Some(position) {
                    events.push(PointerEvent::Move(position));
                    self.last_hover_pos = Some(position);
                }
            }
            None => {
                if self.last_hover_pos.take().is_some() {
                    events.push(PointerEvent::Leave);
                }
            }
        }

        if response.clicked_by(PointerButton::Primary)
            && let Some(position) = response.interact_pointer_pos()
        {
            events.push(PointerEvent::Click(position));
        }

        events
    }
}
