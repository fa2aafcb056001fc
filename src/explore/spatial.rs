use eframe::egui::{Pos2, Vec2, vec2};

use super::point::Point;

const QUADTREE_LEAF_CAPACITY: usize = 12;
const QUADTREE_MAX_DEPTH: usize = 10;

/// One neighbor query hit. `index` addresses the full point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug)]
struct QuadBounds {
    center: Pos2,
    half_extent: f32,
}

impl QuadBounds {
    fn from_points(points: &[Pos2]) -> Option<Self> {
        let mut min = vec2(f32::INFINITY, f32::INFINITY);
        let mut max = vec2(f32::NEG_INFINITY, f32::NEG_INFINITY);

        for point in points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        if !min.x.is_finite() || !min.y.is_finite() || !max.x.is_finite() || !max.y.is_finite() {
            return None;
        }

        let center = ((min + max) * 0.5).to_pos2();
        let span = (max.x - min.x).max(max.y - min.y);
        let half_extent = (span * 0.5).max(f32::EPSILON) * 1.001;

        Some(Self {
            center,
            half_extent,
        })
    }

    fn child(self, quadrant: usize) -> Self {
        let quarter = self.half_extent * 0.5;
        let offset = match quadrant {
            0 => vec2(-quarter, -quarter),
            1 => vec2(quarter, -quarter),
            2 => vec2(-quarter, quarter),
            _ => vec2(quarter, quarter),
        };

        Self {
            center: self.center + offset,
            half_extent: quarter,
        }
    }

    fn quadrant_for(self, point: Pos2) -> usize {
        let right = point.x >= self.center.x;
        let lower = point.y >= self.center.y;
        match (right, lower) {
            (false, false) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (true, true) => 3,
        }
    }

    fn distance_sq_to(self, point: Pos2) -> f32 {
        let dx = ((point.x - self.center.x).abs() - self.half_extent).max(0.0);
        let dy = ((point.y - self.center.y).abs() - self.half_extent).max(0.0);
        (dx * dx) + (dy * dy)
    }
}

struct QuadNode {
    bounds: QuadBounds,
    indices: Vec<usize>,
    children: [Option<Box<QuadNode>>; 4],
}

impl QuadNode {
    fn build(positions: &[Pos2]) -> Option<Self> {
        let bounds = QuadBounds::from_points(positions)?;
        let indices = (0..positions.len()).collect::<Vec<_>>();
        Some(Self::build_node(bounds, indices, positions, 0))
    }

    fn build_node(
        bounds: QuadBounds,
        indices: Vec<usize>,
        positions: &[Pos2],
        depth: usize,
    ) -> Self {
        let mut node = Self {
            bounds,
            indices,
            children: std::array::from_fn(|_| None),
        };

        if depth >= QUADTREE_MAX_DEPTH || node.indices.len() <= QUADTREE_LEAF_CAPACITY {
            return node;
        }

        let mut buckets = std::array::from_fn::<_, 4, _>(|_| Vec::new());
        for &index in &node.indices {
            let quadrant = bounds.quadrant_for(positions[index]);
            buckets[quadrant].push(index);
        }

        let non_empty = buckets.iter().filter(|bucket| !bucket.is_empty()).count();
        if non_empty <= 1 {
            return node;
        }

        for (quadrant, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }

            node.children[quadrant] = Some(Box::new(Self::build_node(
                bounds.child(quadrant),
                bucket,
                positions,
                depth + 1,
            )));
        }
        node.indices.clear();
        node
    }

    fn collect_within(
        &self,
        positions: &[Pos2],
        center: Pos2,
        radius_sq: f32,
        hits: &mut Vec<(usize, f32)>,
    ) {
        if self.bounds.distance_sq_to(center) > radius_sq {
            return;
        }

        for &index in &self.indices {
            let distance_sq = (positions[index] - center).length_sq();
            if distance_sq <= radius_sq {
                hits.push((index, distance_sq));
            }
        }

        for child in self.children.iter().flatten() {
            child.collect_within(positions, center, radius_sq, hits);
        }
    }
}

/// Radius-limited nearest-neighbor lookup over the active point subset.
///
/// Results are ordered by ascending distance; equal distances keep the
/// order the points were given in.
pub struct SpatialIndex {
    point_indices: Vec<usize>,
    positions: Vec<Pos2>,
    root: Option<QuadNode>,
}

impl SpatialIndex {
    pub fn build(points: &[Point], active: &[usize]) -> Self {
        let point_indices = active
            .iter()
            .copied()
            .filter(|&index| index < points.len())
            .collect::<Vec<_>>();
        let positions = point_indices
            .iter()
            .map(|&index| points[index].pos)
            .collect::<Vec<_>>();
        let root = QuadNode::build(&positions);

        Self {
            point_indices,
            positions,
            root,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn query(&self, position: Pos2, radius: f32, limit: usize) -> Vec<Neighbor> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        if limit == 0 || !radius.is_finite() || radius < 0.0 || !position.is_finite() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        root.collect_within(&self.positions, position, radius * radius, &mut hits);
        finish(hits, limit, |local| self.point_indices[local])
    }
}

/// Reference implementation: a plain scan with the same ordering contract.
pub fn linear_query(
    points: &[Point],
    active: &[usize],
    position: Pos2,
    radius: f32,
    limit: usize,
) -> Vec<Neighbor> {
    if limit == 0 || !radius.is_finite() || radius < 0.0 {
        return Vec::new();
    }

    let radius_sq = radius * radius;
    let hits = active
        .iter()
        .enumerate()
        .filter_map(|(order, &index)| {
            let distance_sq = (points.get(index)?.pos - position).length_sq();
            (distance_sq <= radius_sq).then_some((order, distance_sq))
        })
        .collect::<Vec<_>>();
    finish(hits, limit, |order| active[order])
}

fn finish(
    mut hits: Vec<(usize, f32)>,
    limit: usize,
    to_point_index: impl Fn(usize) -> usize,
) -> Vec<Neighbor> {
    hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    hits.truncate(limit);
    hits.into_iter()
        .map(|(order, distance_sq)| Neighbor {
            index: to_point_index(order),
            distance: distance_sq.sqrt(),
        })
        .collect()
}

/// Query radius that tracks zoom: a fraction of the larger viewport side,
/// never below `min_radius`.
pub fn default_radius(viewport_size: Vec2, fraction: f32, min_radius: f32) -> f32 {
    (viewport_size.x.max(viewport_size.y) * fraction).max(min_radius)
}
