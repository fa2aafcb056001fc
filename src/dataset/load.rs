use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::parse::{PointRecord, parse_point_records};
use crate::explore::{Point, normalize_points};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub records_read: usize,
    pub skipped_lines: usize,
    pub duplicates_dropped: usize,
    pub fallback_positioned: usize,
    pub correlation: Option<f64>,
    pub notice: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub points: Vec<Point>,
    pub report: LoadReport,
}

pub fn load_dataset(path: &Path, correlation_threshold: f64) -> Result<Dataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read point dataset {}", path.display()))?;
    let dataset = dataset_from_str(&raw, correlation_threshold);

    info!(
        path = %path.display(),
        points = dataset.points.len(),
        skipped = dataset.report.skipped_lines,
        duplicates = dataset.report.duplicates_dropped,
        fallback = dataset.report.fallback_positioned,
        "loaded topic-space dataset"
    );
    Ok(dataset)
}

pub fn dataset_from_str(raw: &str, correlation_threshold: f64) -> Dataset {
    let parsed = parse_point_records(raw);
    let records_read = parsed.records.len();
    let (records, duplicates_dropped) = dedup_by_id(parsed.records);
    dataset_from_records(
        records,
        correlation_threshold,
        LoadReport {
            records_read,
            skipped_lines: parsed.skipped_lines,
            duplicates_dropped,
            ..LoadReport::default()
        },
    )
}

fn dataset_from_records(
    records: Vec<PointRecord>,
    correlation_threshold: f64,
    mut report: LoadReport,
) -> Dataset {
    let normalized = normalize_points(records, correlation_threshold);
    report.fallback_positioned = normalized.fallback_count;
    report.correlation = normalized.correlation;
    report.notice = normalized.notice;

    Dataset {
        points: normalized.points,
        report,
    }
}

fn dedup_by_id(records: Vec<PointRecord>) -> (Vec<PointRecord>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for record in records {
        if seen.insert(record.id.clone()) {
            kept.push(record);
        } else {
            warn!(id = %record.id, "dropping point record with duplicate id");
            dropped += 1;
        }
    }

    (kept, dropped)
}
