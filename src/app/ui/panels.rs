use std::collections::HashMap;
use std::path::Path;

use eframe::egui::{self, Align, Color32, Context, Layout, RichText};

use topic_explorer::explore::Explorer;

use super::super::enrich::EnrichmentWorker;
use super::super::{SceneCache, ViewModel, ViewScratch};

impl ViewModel {
    pub(in crate::app) fn new(explorer: Explorer, enrichment: EnrichmentWorker) -> Self {
        Self {
            explorer,
            enrichment,
            filter_query: String::new(),
            filter_unmatched: false,
            last_hover_pos: None,
            focused_result: None,
            show_hulls: false,
            scene: SceneCache {
                revision: 0,
                handle_by_id: HashMap::new(),
                scratch: ViewScratch {
                    screen_positions: Vec::new(),
                    visible_handles: Vec::new(),
                },
            },
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        dataset_path: &Path,
        reload_requested: &mut bool,
    ) {
        for response in self.enrichment.drain() {
            self.explorer.complete_enrichment(response);
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Topic Space Explorer");
                    ui.separator();
                    ui.label(format!("dataset: {}", dataset_path.display()));
                    ui.label(format!("points: {}", self.explorer.points().len()));
                    ui.label(format!("clusters: {}", self.explorer.cluster_names().len()));
                    if ui.button("Reload dataset").clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Reset view").clicked() {
                        self.explorer.reset_view();
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let viewport = self.explorer.viewport();
                        ui.label(format!(
                            "view {:.2} x {:.2}  |  detail {:.2}",
                            viewport.width,
                            viewport.height,
                            self.explorer.detail_factor()
                        ));
                        if self.enrichment.in_flight() > 0 {
                            ui.spinner();
                        }
                    });
                });
            });

        if let Some(notice) = self.explorer.notice() {
            egui::TopBottomPanel::top("notice_bar")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(RichText::new(notice).color(Color32::from_rgb(246, 206, 104)));
                });
        }

        egui::SidePanel::left("filter")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_filter_controls(ui));

        egui::SidePanel::right("results")
            .resizable(true)
            .default_width(360.0)
            .show(ctx, |ui| self.draw_results(ui));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_scene(ui));
    }
}
