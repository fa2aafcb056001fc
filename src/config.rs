use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Tunables for the explorer core.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// `|pearson(x, y)|` above which a layout is treated as colinear and
    /// redistributed radially. Empirical; lower it for noisier embeddings.
    pub correlation_threshold: f64,
    pub neighbor_radius_fraction: f32,
    pub min_neighbor_radius: f32,
    pub neighbor_limit: usize,
    pub viewport_padding_fraction: f32,
    pub viewport_min_padding: f32,
    pub viewport_min_span: f32,
    pub zoom_step: f32,
    pub label_font_px: f32,
    pub label_visibility_threshold: f32,
    pub hover_interval_ms: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            correlation_threshold: 0.995,
            neighbor_radius_fraction: 0.08,
            min_neighbor_radius: 0.02,
            neighbor_limit: 12,
            viewport_padding_fraction: 0.10,
            viewport_min_padding: 0.5,
            viewport_min_span: 1.0e-3,
            zoom_step: 1.2,
            label_font_px: 13.0,
            label_visibility_threshold: 4.0,
            hover_interval_ms: 16,
        }
    }
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid explorer config in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.correlation_threshold > 0.0 && self.correlation_threshold <= 1.0,
            "correlation_threshold must be in (0, 1], got {}",
            self.correlation_threshold
        );
        ensure!(
            self.neighbor_radius_fraction > 0.0,
            "neighbor_radius_fraction must be positive"
        );
        ensure!(
            self.min_neighbor_radius >= 0.0,
            "min_neighbor_radius must not be negative"
        );
        ensure!(self.neighbor_limit >= 1, "neighbor_limit must be at least 1");
        ensure!(
            self.viewport_padding_fraction >= 0.0 && self.viewport_min_padding >= 0.0,
            "viewport padding must not be negative"
        );
        ensure!(
            self.viewport_min_span > 0.0,
            "viewport_min_span must be positive"
        );
        ensure!(
            self.zoom_step > 1.0,
            "zoom_step must be greater than 1, got {}",
            self.zoom_step
        );
        ensure!(self.label_font_px > 0.0, "label_font_px must be positive");
        Ok(())
    }

    pub fn hover_interval(&self) -> Duration {
        Duration::from_millis(self.hover_interval_ms)
    }
}
