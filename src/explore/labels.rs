use eframe::egui::{Pos2, Rect, pos2, vec2};

use super::clusters::ClusterGeometry;

/// Vertical candidate offsets in line heights; positive moves the label up.
pub const OFFSET_STEPS: [i32; 7] = [0, 1, -1, 2, -2, 3, -3];

const CHAR_WIDTH_RATIO: f32 = 0.58;
const LINE_HEIGHT_RATIO: f32 = 1.25;

#[derive(Clone, Debug, PartialEq)]
pub struct LabelPlacement {
    pub label: String,
    pub text: String,
    pub count: usize,
    /// Center of the chosen candidate.
    pub anchor: Pos2,
    /// Estimated text box in logical units at placement time.
    pub rect: Rect,
    pub offset_step: i32,
    /// Every candidate collided and the last one was kept anyway.
    pub overlapping: bool,
}

/// Zoom-dependent rendering decision for one placed label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelLod {
    pub visible: bool,
    pub font_px: f32,
    pub font_logical: f32,
}

/// Size multiplier for a cluster's label: larger clusters get larger text.
pub fn density_scale(count: usize) -> f32 {
    (1.0 + (count as f32).ln_1p() * 0.12).min(1.8)
}

pub fn estimate_box(center: Pos2, text: &str, font_size: f32) -> Rect {
    let width = text.chars().count().max(1) as f32 * font_size * CHAR_WIDTH_RATIO;
    let height = font_size * LINE_HEIGHT_RATIO;
    Rect::from_center_size(center, vec2(width, height))
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

/// Greedy label placement near each centroid.
///
/// Clusters are visited alphabetically by label. Each label takes the first
/// candidate offset whose box is clear of all boxes placed so far, or the
/// last candidate when none is.
pub fn place_labels(clusters: &[ClusterGeometry], base_font: f32) -> Vec<LabelPlacement> {
    let mut ordered = clusters.iter().collect::<Vec<_>>();
    ordered.sort_by(|a, b| a.label.cmp(&b.label));

    let mut placed: Vec<LabelPlacement> = Vec::with_capacity(ordered.len());
    for cluster in ordered {
        let font_size = base_font * density_scale(cluster.count);
        let line_height = font_size * LINE_HEIGHT_RATIO;

        let mut chosen = None;
        for &step in &OFFSET_STEPS {
            let center = pos2(
                cluster.centroid.x,
                cluster.centroid.y - step as f32 * line_height,
            );
            let rect = estimate_box(center, &cluster.display_name, font_size);
            let clear = placed.iter().all(|other| !overlaps(rect, other.rect));
            chosen = Some((step, center, rect, !clear));
            if clear {
                break;
            }
        }

        let Some((offset_step, anchor, rect, overlapping)) = chosen else {
            continue;
        };
        placed.push(LabelPlacement {
            label: cluster.label.clone(),
            text: cluster.display_name.clone(),
            count: cluster.count,
            anchor,
            rect,
            offset_step,
            overlapping,
        });
    }
    placed
}

/// Visibility and size for a label at the current zoom.
///
/// `detail_factor` is home span / current span, so it grows as the user zooms
/// in; `logical_per_px` converts the constant on-screen size back to logical
/// units for the current viewport.
pub fn label_lod(
    placement: &LabelPlacement,
    detail_factor: f32,
    visibility_threshold: f32,
    base_font_px: f32,
    logical_per_px: f32,
) -> LabelLod {
    let font_px = base_font_px * density_scale(placement.count);
    LabelLod {
        visible: placement.count as f32 * detail_factor >= visibility_threshold,
        font_px,
        font_logical: font_px * logical_per_px,
    }
}
