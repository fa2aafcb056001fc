use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};

use topic_explorer::config::ExplorerConfig;
use topic_explorer::dataset::{Dataset, MetadataSource, load_dataset};
use topic_explorer::explore::{Explorer, PointId};

mod enrich;
mod render_utils;
mod scene;
mod ui;

use enrich::EnrichmentWorker;

pub struct ExplorerApp {
    dataset_path: PathBuf,
    config: ExplorerConfig,
    metadata: Arc<dyn MetadataSource>,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Dataset, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    explorer: Explorer,
    enrichment: EnrichmentWorker,
    filter_query: String,
    filter_unmatched: bool,
    last_hover_pos: Option<Pos2>,
    focused_result: Option<PointId>,
    show_hulls: bool,
    scene: SceneCache,
}

/// Per-revision render bookkeeping, rebuilt whenever the explorer rebuilds
/// its scene.
struct SceneCache {
    revision: u64,
    handle_by_id: HashMap<PointId, usize>,
    scratch: ViewScratch,
}

/// Per-frame buffers reused across frames.
struct ViewScratch {
    screen_positions: Vec<Pos2>,
    visible_handles: Vec<usize>,
}

impl ExplorerApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        dataset_path: PathBuf,
        config: ExplorerConfig,
        metadata: Arc<dyn MetadataSource>,
    ) -> Self {
        let state = Self::start_load(dataset_path.clone(), config.correlation_threshold);
        Self {
            dataset_path,
            config,
            metadata,
            state,
        }
    }

    fn spawn_load(
        dataset_path: PathBuf,
        correlation_threshold: f64,
    ) -> Receiver<Result<Dataset, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_dataset(&dataset_path, correlation_threshold)
                .map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(dataset_path: PathBuf, correlation_threshold: f64) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(dataset_path, correlation_threshold),
        }
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(dataset)) => {
                        let explorer = Explorer::from_dataset(dataset, self.config.clone());
                        let enrichment = EnrichmentWorker::new(Arc::clone(&self.metadata));
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            explorer, enrichment,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading topic space...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the point dataset");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(
                            self.dataset_path.clone(),
                            self.config.correlation_threshold,
                        ));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &self.dataset_path, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start_load(
                        self.dataset_path.clone(),
                        self.config.correlation_threshold,
                    ));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}
