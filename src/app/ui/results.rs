use eframe::egui::{self, RichText, Ui};

use topic_explorer::util::shorten;

use super::super::ViewModel;

const SNIPPET_CHARS: usize = 220;

impl ViewModel {
    pub(in crate::app) fn draw_results(&mut self, ui: &mut Ui) {
        ui.heading("Nearby Items");
        ui.add_space(6.0);
        self.focused_result = None;

        let Some(records) = self.explorer.results() else {
            ui.label("Hover or click the map to list nearby items.");
            return;
        };
        if records.is_empty() {
            ui.label("No nearby items.");
            return;
        }

        let mut focused = None;
        egui::ScrollArea::vertical()
            .id_salt("results_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for record in records {
                    let row = ui
                        .group(|ui| {
                            ui.set_width(ui.available_width());
                            ui.label(RichText::new(&record.payload.title).strong());
                            ui.small(format!(
                                "{}  |  distance {:.3}  |  {}",
                                record.payload.topic, record.score, record.source
                            ));
                            if let Some(creator) = &record.payload.creator {
                                ui.small(format!("by {creator}"));
                            }
                            if let Some(text) = &record.payload.text {
                                ui.label(shorten(text, SNIPPET_CHARS));
                            }
                            ui.horizontal(|ui| {
                                if let Some(url) = &record.payload.public_url {
                                    ui.hyperlink_to("Open", url);
                                }
                                if let Some(url) = &record.payload.image_url {
                                    ui.hyperlink_to("Image", url);
                                }
                            });
                        })
                        .response;

                    if row.hovered() {
                        focused = Some(record.id.clone());
                    }
                }
            });
        self.focused_result = focused;
    }
}
