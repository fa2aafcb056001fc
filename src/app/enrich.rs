use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use eframe::egui::Context;
use tracing::debug;

use topic_explorer::dataset::MetadataSource;
use topic_explorer::explore::{EnrichmentRequest, EnrichmentResponse};

/// Runs metadata fetches off the UI thread. Responses come back through a
/// channel drained once per frame, in whatever order the fetches finish.
pub(in crate::app) struct EnrichmentWorker {
    source: Arc<dyn MetadataSource>,
    tx: Sender<EnrichmentResponse>,
    rx: Receiver<EnrichmentResponse>,
    in_flight: usize,
}

impl EnrichmentWorker {
    pub(in crate::app) fn new(source: Arc<dyn MetadataSource>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub(in crate::app) fn submit(&mut self, ctx: &Context, request: EnrichmentRequest) {
        debug!(
            request_id = request.request_id,
            ids = request.ids.len(),
            "enrichment request issued"
        );

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        self.in_flight += 1;

        thread::spawn(move || {
            let result = source.fetch(&request.ids);
            let _ = tx.send(EnrichmentResponse {
                request_id: request.request_id,
                result,
            });
            ctx.request_repaint();
        });
    }

    pub(in crate::app) fn drain(&mut self) -> Vec<EnrichmentResponse> {
        let responses = self.rx.try_iter().collect::<Vec<_>>();
        self.in_flight = self.in_flight.saturating_sub(responses.len());
        responses
    }

    pub(in crate::app) fn in_flight(&self) -> usize {
        self.in_flight
    }
}
