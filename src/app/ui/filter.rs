use eframe::egui::{self, Color32, RichText, Sense, Ui, vec2};

use topic_explorer::explore::ClusterFilter;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_filter_controls(&mut self, ui: &mut Ui) {
        ui.heading("Clusters");
        ui.add_space(6.0);

        let search = ui
            .add(
                egui::TextEdit::singleline(&mut self.filter_query)
                    .hint_text("Filter by label or topic (\"all\" resets)"),
            )
            .on_hover_text("Fuzzy match against cluster labels and topic names.");
        if search.changed() {
            self.apply_filter_query();
        }
        if self.filter_unmatched {
            ui.label(
                RichText::new("No cluster matches that filter.")
                    .color(Color32::from_rgb(241, 146, 94)),
            );
        }

        ui.horizontal(|ui| {
            ui.label(format!("Showing: {}", self.current_filter_name()));
            let filtered = *self.explorer.filter() != ClusterFilter::All;
            if ui
                .add_enabled(filtered, egui::Button::new("Show all"))
                .clicked()
            {
                self.filter_query.clear();
                self.filter_unmatched = false;
                self.explorer.set_filter(ClusterFilter::All);
            }
        });
        ui.checkbox(&mut self.show_hulls, "Outline cluster hulls");

        ui.separator();
        let mut picked = None;
        egui::ScrollArea::vertical()
            .id_salt("cluster_list_scroll")
            .max_height(ui.available_height() * 0.6)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let palette = self.explorer.palette();
                for name in self.explorer.cluster_names() {
                    let selected = self.explorer.filter().admits(&name.label)
                        && *self.explorer.filter() != ClusterFilter::All;
                    ui.horizontal(|ui| {
                        let (swatch, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
                        ui.painter()
                            .circle_filled(swatch.center(), 5.0, palette.color_for(&name.label));
                        let text = format!("{}  ({})", name.display_name, name.count);
                        if ui
                            .selectable_label(selected, text)
                            .on_hover_text(format!("label {}", name.label))
                            .clicked()
                        {
                            picked = Some((name.label.clone(), name.display_name.clone()));
                        }
                    });
                }
            });
        if let Some((label, display_name)) = picked {
            self.filter_query = display_name;
            self.filter_unmatched = false;
            self.explorer.set_filter(ClusterFilter::Cluster(label));
        }

        ui.separator();
        self.draw_load_report(ui);
    }

    fn apply_filter_query(&mut self) {
        match self.explorer.resolve_filter(&self.filter_query) {
            Some(filter) => {
                self.filter_unmatched = false;
                self.explorer.set_filter(filter);
            }
            None => self.filter_unmatched = true,
        }
    }

    fn current_filter_name(&self) -> String {
        match self.explorer.filter() {
            ClusterFilter::All => "all clusters".to_owned(),
            ClusterFilter::Cluster(label) => self
                .explorer
                .cluster_names()
                .iter()
                .find(|name| &name.label == label)
                .map(|name| name.display_name.clone())
                .unwrap_or_else(|| label.clone()),
        }
    }

    fn draw_load_report(&self, ui: &mut Ui) {
        let report = self.explorer.report();
        ui.label(RichText::new("Dataset").strong());
        ui.label(format!("Records read: {}", report.records_read));
        ui.label(format!("Malformed lines skipped: {}", report.skipped_lines));
        ui.label(format!("Duplicate ids dropped: {}", report.duplicates_dropped));
        ui.label(format!("Placed without coordinates: {}", report.fallback_positioned));
        match report.correlation {
            Some(r) => ui.label(format!("x/y correlation: {r:.4}")),
            None => ui.label("x/y correlation: n/a"),
        };
        ui.label(format!("Active points: {}", self.explorer.active().len()));
    }
}
