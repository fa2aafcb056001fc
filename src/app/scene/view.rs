use std::time::Instant;

use eframe::egui::{self, Align2, Color32, FontId, Sense, Shape, Stroke, Ui, vec2};

use topic_explorer::explore::InteractionState;

use super::super::render_utils::{blend_color, circle_visible, draw_background, with_opacity};
use super::super::ViewModel;

const POINT_RADIUS: f32 = 3.2;
const SMALL_BLOB_RADIUS: f32 = 14.0;

impl ViewModel {
    fn sync_scene_cache(&mut self) {
        let revision = self.explorer.revision();
        if self.scene.revision == revision {
            return;
        }

        let points = self.explorer.points();
        self.scene.handle_by_id.clear();
        for (handle, &index) in self.explorer.active().iter().enumerate() {
            if let Some(point) = points.get(index) {
                self.scene.handle_by_id.insert(point.id.clone(), handle);
            }
        }
        self.scene.revision = revision;
    }

    fn update_screen_space(&mut self, rect: egui::Rect) {
        let viewport = *self.explorer.viewport();
        let points = self.explorer.points();
        let scratch = &mut self.scene.scratch;

        scratch.screen_positions.clear();
        scratch.visible_handles.clear();
        for (handle, &index) in self.explorer.active().iter().enumerate() {
            let position = viewport.logical_to_screen(points[index].pos, rect);
            scratch.screen_positions.push(position);
            if circle_visible(rect, position, POINT_RADIUS) {
                scratch.visible_handles.push(handle);
            }
        }
    }

    fn dispatch_input(&mut self, ui: &Ui, rect: egui::Rect, response: &egui::Response) {
        let events = self.collect_pointer_events(ui, rect, response);
        for event in events {
            if let Some(request) = self.explorer.pointer(event) {
                self.enrichment.submit(ui.ctx(), request);
            }
        }

        if let Some(request) = self.explorer.frame(Instant::now()) {
            self.enrichment.submit(ui.ctx(), request);
        }
        if self.explorer.frame_scheduled() {
            ui.ctx()
                .request_repaint_after(self.explorer.config().hover_interval());
        }
    }

    pub(in crate::app) fn draw_scene(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.explorer.set_screen(rect);
        self.dispatch_input(ui, rect, &response);

        self.sync_scene_cache();
        self.update_screen_space(rect);

        let painter = ui.painter_at(rect);
        let viewport = *self.explorer.viewport();
        draw_background(&painter, rect, &viewport);

        if self.explorer.points().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "The dataset has no points.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        for cluster in self.explorer.clusters() {
            for blob in &cluster.blobs {
                let color = with_opacity(cluster.color, blob.opacity);
                let polygon = blob
                    .polygon
                    .iter()
                    .map(|&vertex| viewport.logical_to_screen(vertex, rect))
                    .collect::<Vec<_>>();
                if polygon.len() >= 3 {
                    painter.add(Shape::convex_polygon(polygon, color, Stroke::NONE));
                } else {
                    for position in polygon {
                        painter.circle_filled(position, SMALL_BLOB_RADIUS * blob.scale, color);
                    }
                }
            }

            if self.show_hulls && cluster.hull.len() >= 3 {
                let outline = cluster
                    .hull
                    .iter()
                    .map(|&vertex| viewport.logical_to_screen(vertex, rect))
                    .collect::<Vec<_>>();
                painter.add(Shape::closed_line(
                    outline,
                    Stroke::new(1.0, with_opacity(cluster.color, 0.55)),
                ));
            }
        }

        let points = self.explorer.points();
        let active = self.explorer.active();
        let palette = self.explorer.palette();
        for &handle in &self.scene.scratch.visible_handles {
            let point = &points[active[handle]];
            let position = self.scene.scratch.screen_positions[handle];
            painter.circle_filled(position, POINT_RADIUS, palette.color_for(&point.label));
        }

        let highlight_stroke = Stroke::new(1.6, Color32::from_rgb(245, 206, 93));
        for &index in self.explorer.highlighted() {
            let Some(point) = points.get(index) else {
                continue;
            };
            let Some(&handle) = self.scene.handle_by_id.get(&point.id) else {
                continue;
            };
            let position = self.scene.scratch.screen_positions[handle];
            let color = blend_color(palette.color_for(&point.label), Color32::WHITE, 0.35);
            painter.circle_filled(position, POINT_RADIUS + 1.5, color);
            painter.circle_stroke(position, POINT_RADIUS + 4.0, highlight_stroke);
        }

        if let Some(id) = &self.focused_result
            && let Some(&handle) = self.scene.handle_by_id.get(id)
        {
            let position = self.scene.scratch.screen_positions[handle];
            painter.circle_stroke(
                position,
                POINT_RADIUS + 9.0,
                Stroke::new(2.2, Color32::from_rgb(255, 164, 101)),
            );
        }

        for (placement, lod) in self.explorer.label_lods() {
            if !lod.visible {
                continue;
            }
            let position = viewport.logical_to_screen(placement.anchor, rect);
            let font = FontId::proportional(lod.font_px);
            painter.text(
                position + vec2(1.0, 1.0),
                Align2::CENTER_CENTER,
                &placement.text,
                font.clone(),
                Color32::from_black_alpha(170),
            );
            painter.text(
                position,
                Align2::CENTER_CENTER,
                &placement.text,
                font,
                Color32::from_gray(238),
            );
        }

        let status = match self.explorer.interaction_state() {
            InteractionState::Panning => {
                ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::Grabbing);
                "panning".to_owned()
            }
            InteractionState::Hovering => {
                format!("{} nearby", self.explorer.highlighted().len())
            }
            InteractionState::Idle => String::new(),
        };
        if !status.is_empty() {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                status,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
