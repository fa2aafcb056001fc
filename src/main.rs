mod app;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use topic_explorer::config::ExplorerConfig;
use topic_explorer::dataset::{JsonFileMetadata, MetadataSource, NoMetadata};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Point records, one JSON object per line.
    dataset: PathBuf,

    /// JSON object mapping point id to display metadata.
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Explorer settings as JSON; missing keys keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    correlation_threshold: Option<f64>,

    #[arg(long)]
    neighbor_limit: Option<usize>,

    /// Tracing filter directives, e.g. `topic_explorer=debug`.
    /// Falls back to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_filter: Option<String>,
}

fn init_tracing(directives: Option<&str>) -> Result<()> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid --log-filter {directives:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn resolve_config(args: &Args) -> Result<ExplorerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading explorer config");
            ExplorerConfig::from_file(path)?
        }
        None => ExplorerConfig::default(),
    };

    if let Some(threshold) = args.correlation_threshold {
        config.correlation_threshold = threshold;
    }
    if let Some(limit) = args.neighbor_limit {
        config.neighbor_limit = limit;
    }

    config.validate().context("invalid explorer configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_filter.as_deref())?;

    let config = resolve_config(&args)?;
    let metadata: Arc<dyn MetadataSource> = match &args.metadata {
        Some(path) => {
            let source = JsonFileMetadata::open(path)?;
            info!(path = %path.display(), items = source.len(), "metadata source ready");
            Arc::new(source)
        }
        None => Arc::new(NoMetadata),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    let dataset_path = args.dataset;
    eframe::run_native(
        "Topic Space Explorer",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::ExplorerApp::new(
                cc,
                dataset_path.clone(),
                config.clone(),
                Arc::clone(&metadata),
            )))
        }),
    )
    .map_err(|error| anyhow!("explorer window failed: {error}"))
}
