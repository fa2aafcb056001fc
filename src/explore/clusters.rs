use std::collections::HashMap;

use eframe::egui::{Color32, Pos2, Vec2};

use super::point::Point;

/// Scale about the centroid and fill opacity of each density layer, outer halo first.
pub const BLOB_LAYERS: [(f32, f32); 3] = [(1.18, 0.08), (1.10, 0.12), (1.00, 0.18)];

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(78, 121, 167),
    Color32::from_rgb(242, 142, 43),
    Color32::from_rgb(225, 87, 89),
    Color32::from_rgb(118, 183, 178),
    Color32::from_rgb(89, 161, 79),
    Color32::from_rgb(237, 201, 72),
    Color32::from_rgb(176, 122, 161),
    Color32::from_rgb(255, 157, 167),
    Color32::from_rgb(156, 117, 95),
    Color32::from_rgb(186, 176, 172),
];

/// Label → palette slot, assigned in first-seen order over the whole dataset
/// so that filtering never recolors a cluster.
#[derive(Clone, Debug, Default)]
pub struct ClusterPalette {
    slot_by_label: HashMap<String, usize>,
}

impl ClusterPalette {
    pub fn from_points(points: &[Point]) -> Self {
        let mut slot_by_label = HashMap::new();
        for point in points {
            let next = slot_by_label.len();
            slot_by_label.entry(point.label.clone()).or_insert(next);
        }
        Self { slot_by_label }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        let slot = self.slot_by_label.get(label).copied().unwrap_or(0);
        PALETTE[slot % PALETTE.len()]
    }

    pub fn len(&self) -> usize {
        self.slot_by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_by_label.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DensityBlob {
    pub polygon: Vec<Pos2>,
    pub scale: f32,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterGeometry {
    pub label: String,
    pub display_name: String,
    pub count: usize,
    pub centroid: Pos2,
    pub hull: Vec<Pos2>,
    pub color: Color32,
    pub blobs: Vec<DensityBlob>,
}

/// One geometry record per distinct label in `active`, in first-seen order.
pub fn build_clusters(
    points: &[Point],
    active: &[usize],
    palette: &ClusterPalette,
) -> Vec<ClusterGeometry> {
    let mut order: Vec<&str> = Vec::new();
    let mut members: HashMap<&str, Vec<usize>> = HashMap::new();
    for &index in active {
        let Some(point) = points.get(index) else {
            continue;
        };
        let entry = members.entry(point.label.as_str()).or_insert_with(|| {
            order.push(point.label.as_str());
            Vec::new()
        });
        entry.push(index);
    }

    order
        .into_iter()
        .filter_map(|label| {
            let indices = members.get(label)?;
            let positions = indices.iter().map(|&i| points[i].pos).collect::<Vec<_>>();
            let display_name = indices
                .iter()
                .find_map(|&i| points[i].topic.clone())
                .unwrap_or_else(|| label.to_owned());

            let centroid = centroid(&positions)?;
            let hull = convex_hull(&positions);
            let blob_base = if positions.len() < 3 { &positions } else { &hull };
            let blobs = density_blobs(blob_base, centroid);

            Some(ClusterGeometry {
                label: label.to_owned(),
                display_name,
                count: positions.len(),
                centroid,
                hull,
                color: palette.color_for(label),
                blobs,
            })
        })
        .collect()
}

pub fn centroid(positions: &[Pos2]) -> Option<Pos2> {
    if positions.is_empty() {
        return None;
    }

    let sum = positions
        .iter()
        .fold(Vec2::ZERO, |acc, position| acc + position.to_vec2());
    Some((sum / positions.len() as f32).to_pos2())
}

fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
    let oa = a - o;
    let ob = b - o;
    (oa.x * ob.y) - (oa.y * ob.x)
}

/// Monotone-chain convex hull.
///
/// Vertices come back counter-clockwise in y-up terms, starting from the
/// lowest-x (then lowest-y) point. Interior and edge-colinear points are
/// dropped. One or two input points are returned as they are.
pub fn convex_hull(positions: &[Pos2]) -> Vec<Pos2> {
    if positions.len() < 3 {
        return positions.to_vec();
    }

    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<Pos2> = Vec::with_capacity(sorted.len());
    for &point in &sorted {
        while lower.len() >= 2
            && cross(lower[lower.len() - 2], lower[lower.len() - 1], point) <= 0.0
        {
            lower.pop();
        }
        lower.push(point);
    }

    let mut upper: Vec<Pos2> = Vec::with_capacity(sorted.len());
    for &point in sorted.iter().rev() {
        while upper.len() >= 2
            && cross(upper[upper.len() - 2], upper[upper.len() - 1], point) <= 0.0
        {
            upper.pop();
        }
        upper.push(point);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Concentric polygons scaled about `centroid`, outer halo first.
pub fn density_blobs(base: &[Pos2], centroid: Pos2) -> Vec<DensityBlob> {
    BLOB_LAYERS
        .iter()
        .map(|&(scale, opacity)| DensityBlob {
            polygon: base
                .iter()
                .map(|&vertex| centroid + (vertex - centroid) * scale)
                .collect(),
            scale,
            opacity,
        })
        .collect()
}
