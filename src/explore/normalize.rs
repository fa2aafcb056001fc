use std::collections::HashMap;
use std::f64::consts::TAU;

use eframe::egui::{Pos2, pos2};
use tracing::warn;

use super::point::Point;
use crate::dataset::PointRecord;
use crate::util::stable_pair;

const FALLBACK_STEP: f64 = 0.1;
const ANGULAR_JITTER: f64 = 0.3;
const RADIAL_JITTER: f64 = 0.04;

/// Largest coordinate magnitude kept from the data. Beyond it, spans and
/// centers no longer fit in `f32`.
const MAX_COORDINATE: f64 = 1.0e30;

fn in_range((x, y): (f64, f64)) -> bool {
    x.abs() <= MAX_COORDINATE && y.abs() <= MAX_COORDINATE
}

#[derive(Clone, Debug, Default)]
pub struct Normalized {
    pub points: Vec<Point>,
    /// Points that had no usable coordinates and were placed on the fallback line.
    pub fallback_count: usize,
    /// Pearson correlation of the data-positioned points, when it could be computed.
    pub correlation: Option<f64>,
    pub redistributed: bool,
    pub notice: Option<String>,
}

/// Gives every record a finite position and repairs colinear layouts.
pub fn normalize_points(records: Vec<PointRecord>, correlation_threshold: f64) -> Normalized {
    let mut fallback_counter = 0usize;
    let mut from_data = Vec::with_capacity(records.len());
    let mut points = Vec::with_capacity(records.len());
    let mut out_of_range = 0usize;

    for record in records {
        let from_xy = record.x.zip(record.y);
        let from_vector = record
            .vector
            .as_deref()
            .filter(|vector| vector.len() >= 2)
            .map(|vector| (vector[0].unwrap_or(0.0), vector[1].unwrap_or(0.0)));
        if from_xy.or(from_vector).is_some_and(|xy| !in_range(xy)) {
            out_of_range += 1;
        }
        let position = from_xy
            .filter(|&xy| in_range(xy))
            .or(from_vector.filter(|&xy| in_range(xy)));

        let (x, y) = match position {
            Some(xy) => {
                from_data.push(xy);
                xy
            }
            None => {
                let xy = (fallback_counter as f64 * FALLBACK_STEP, 0.0);
                fallback_counter += 1;
                xy
            }
        };

        points.push(Point {
            id: record.id,
            pos: pos2(x as f32, y as f32),
            label: record.label,
            topic: record.topic,
            text: record.text,
        });
    }

    if out_of_range > 0 {
        warn!(
            records = out_of_range,
            limit = MAX_COORDINATE,
            "ignoring coordinates outside the drawable range"
        );
    }

    let correlation = pearson(&from_data);
    let mut normalized = Normalized {
        points,
        fallback_count: fallback_counter,
        correlation,
        redistributed: false,
        notice: None,
    };

    if let Some(r) = correlation
        && r.abs() > correlation_threshold
    {
        warn!(
            correlation = r,
            threshold = correlation_threshold,
            points = normalized.points.len(),
            "colinear topic layout detected, redistributing points radially by cluster"
        );
        redistribute_radially(&mut normalized.points);
        normalized.redistributed = true;
        normalized.notice = Some(format!(
            "Layout was nearly colinear (|r| = {:.4} > {}); \
             points were spread radially by cluster.",
            r.abs(),
            correlation_threshold
        ));
    }

    normalized
}

/// Pearson correlation coefficient of `(x, y)` pairs.
///
/// Fewer than three pairs yields `None`. A zero-variance axis means every
/// pair sits on one line, reported as `1.0`.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 3 {
        return None;
    }

    let n = pairs.len() as f64;
    let (sum_x, sum_y) = pairs
        .iter()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx <= f64::EPSILON || syy <= f64::EPSILON {
        return Some(1.0);
    }

    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn redistribute_radially(points: &mut [Point]) {
    if points.is_empty() {
        return;
    }

    let mut sector_by_label: HashMap<String, usize> = HashMap::new();
    for point in points.iter() {
        let next = sector_by_label.len();
        sector_by_label.entry(point.label.clone()).or_insert(next);
    }
    let sector = TAU / sector_by_label.len() as f64;

    let (min_x, max_x) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.pos.x as f64), hi.max(p.pos.x as f64))
    });
    let span_x = max_x - min_x;

    for (index, point) in points.iter_mut().enumerate() {
        let normalized_x = if span_x > f64::EPSILON {
            (point.pos.x as f64 - min_x) / span_x
        } else {
            0.0
        };
        let (jitter_a, jitter_r) = jitter_for(point, index);
        let base = sector_by_label.get(&point.label).copied().unwrap_or(0) as f64 * sector;
        let angle = base + sector * (0.5 + ANGULAR_JITTER * jitter_a as f64);
        let radius = 1.0 + normalized_x + RADIAL_JITTER * jitter_r as f64;

        point.pos = Pos2::new((radius * angle.cos()) as f32, (radius * angle.sin()) as f32);
    }
}

fn jitter_for(point: &Point, index: usize) -> (f32, f32) {
    if !point.id.as_str().is_empty() {
        stable_pair(point.id.as_str())
    } else if !point.label.is_empty() {
        stable_pair(point.label.as_str())
    } else {
        stable_pair(&index)
    }
}
