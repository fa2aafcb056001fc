mod clusters;
mod dispatch;
mod filter;
mod labels;
mod normalize;
mod point;
mod results;
mod spatial;
mod viewport;

use std::time::Instant;

use eframe::egui::{Rect, pos2};
use tracing::info;

use crate::config::ExplorerConfig;
use crate::dataset::{Dataset, LoadReport};

pub use clusters::{
    BLOB_LAYERS, ClusterGeometry, ClusterPalette, DensityBlob, PALETTE, build_clusters, centroid,
    convex_hull, density_blobs,
};
pub use dispatch::{
    Dispatch, DispatchContext, Dispatcher, EnrichmentRequest, EnrichmentResponse,
    InteractionState, PointerEvent,
};
pub use filter::{ClusterFilter, FilterCandidate, resolve_filter};
pub use labels::{
    LabelLod, LabelPlacement, OFFSET_STEPS, density_scale, estimate_box, label_lod, place_labels,
};
pub use normalize::{Normalized, normalize_points, pearson};
pub use point::{Point, PointId, UNKNOWN_LABEL};
pub use results::{RESULT_SOURCE, ResultPayload, ResultRecord};
pub use spatial::{Neighbor, SpatialIndex, default_radius, linear_query};
pub use viewport::Viewport;

/// Screen width the label font is measured against when boxes are placed in
/// logical units.
const LABEL_REFERENCE_PX: f32 = 1000.0;

/// Label and display name of one cluster in the full dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterName {
    pub label: String,
    pub display_name: String,
    pub count: usize,
}

/// The topic-space explorer: owns the point set, the derived scene and the
/// interaction state.
pub struct Explorer {
    config: ExplorerConfig,
    points: Vec<Point>,
    report: LoadReport,
    palette: ClusterPalette,
    cluster_names: Vec<ClusterName>,
    filter: ClusterFilter,
    active: Vec<usize>,
    index: SpatialIndex,
    clusters: Vec<ClusterGeometry>,
    labels: Vec<LabelPlacement>,
    home: Viewport,
    viewport: Viewport,
    screen: Option<Rect>,
    /// Surface the home viewport was squared up against.
    home_screen: Option<Rect>,
    dispatcher: Dispatcher,
    results: Vec<ResultRecord>,
    results_published: bool,
    revision: u64,
}

impl Explorer {
    pub fn new(points: Vec<Point>, config: ExplorerConfig) -> Self {
        Self::with_report(points, LoadReport::default(), config)
    }

    pub fn from_dataset(dataset: Dataset, config: ExplorerConfig) -> Self {
        Self::with_report(dataset.points, dataset.report, config)
    }

    fn with_report(points: Vec<Point>, report: LoadReport, config: ExplorerConfig) -> Self {
        let palette = ClusterPalette::from_points(&points);
        let cluster_names = name_clusters(&points);
        let home = Viewport::fit(
            points.iter().map(|point| point.pos),
            config.viewport_padding_fraction,
            config.viewport_min_padding,
            config.viewport_min_span,
        );

        let mut explorer = Self {
            config,
            points,
            report,
            palette,
            cluster_names,
            filter: ClusterFilter::All,
            active: Vec::new(),
            index: SpatialIndex::build(&[], &[]),
            clusters: Vec::new(),
            labels: Vec::new(),
            home,
            viewport: home,
            screen: None,
            home_screen: None,
            dispatcher: Dispatcher::new(),
            results: Vec::new(),
            results_published: false,
            revision: 0,
        };
        explorer.recompute();
        explorer
    }

    fn recompute(&mut self) {
        self.active = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, point)| self.filter.admits(&point.label))
            .map(|(index, _)| index)
            .collect();
        self.index = SpatialIndex::build(&self.points, &self.active);
        self.clusters = build_clusters(&self.points, &self.active, &self.palette);

        self.labels = place_labels(&self.clusters, self.label_font_logical());
        self.revision += 1;
    }

    /// Base label size in logical units at home zoom.
    fn label_font_logical(&self) -> f32 {
        let logical_per_px = match self.home_screen {
            Some(home_screen) => self.home.logical_per_px(home_screen),
            None => self.home.span() / LABEL_REFERENCE_PX,
        };
        self.config.label_font_px * logical_per_px
    }

    /// Switches the active subset and rebuilds the scene from scratch.
    pub fn set_filter(&mut self, filter: ClusterFilter) {
        if filter == self.filter {
            return;
        }

        self.filter = filter;
        self.recompute();
        self.dispatcher.reset();
        self.results.clear();
        self.results_published = false;
        info!(
            filter = %self.filter,
            active = self.active.len(),
            clusters = self.clusters.len(),
            "cluster filter changed"
        );
    }

    /// Resolves filter-box text against the clusters of the full dataset.
    pub fn resolve_filter(&self, query: &str) -> Option<ClusterFilter> {
        resolve_filter(
            query,
            self.cluster_names.iter().map(|name| FilterCandidate {
                label: &name.label,
                display_name: &name.display_name,
            }),
        )
    }

    /// Tells the explorer where it is drawn.
    ///
    /// The first call squares up the home view against the surface and
    /// re-places labels at that scale. Later size changes keep the current
    /// scale and center.
    pub fn set_screen(&mut self, screen: Rect) {
        if screen.width() <= 0.0 || screen.height() <= 0.0 {
            return;
        }

        match self.screen {
            None => {
                self.home.match_aspect(screen);
                self.viewport = self.home;
                self.home_screen = Some(screen);
                self.screen = Some(screen);
                self.recompute();
            }
            Some(current) => {
                if current.size() != screen.size() {
                    self.viewport.resize(current, screen);
                }
                self.screen = Some(screen);
            }
        }
    }

    pub fn screen(&self) -> Rect {
        self.screen
            .unwrap_or_else(|| Rect::from_min_size(pos2(0.0, 0.0), self.viewport.size()))
    }

    pub fn reset_view(&mut self) {
        self.viewport = self.home;
        if let (Some(home_screen), Some(screen)) = (self.home_screen, self.screen) {
            self.viewport.resize(home_screen, screen);
        }
        self.pointer(PointerEvent::Leave);
    }

    /// Feeds one pointer event through the dispatcher. Returns the enrichment
    /// request to run, if the event needs one.
    pub fn pointer(&mut self, event: PointerEvent) -> Option<EnrichmentRequest> {
        let screen = self.screen();
        let dispatch = self.dispatcher.handle(event, &mut DispatchContext {
            points: &self.points,
            index: &self.index,
            viewport: &mut self.viewport,
            screen,
            config: &self.config,
        });
        self.apply(dispatch)
    }

    /// Runs the throttled hover query, if one is pending and due.
    pub fn frame(&mut self, now: Instant) -> Option<EnrichmentRequest> {
        let screen = self.screen();
        let interval = self.config.hover_interval();
        let dispatch = self.dispatcher.run_frame(now, interval, &mut DispatchContext {
            points: &self.points,
            index: &self.index,
            viewport: &mut self.viewport,
            screen,
            config: &self.config,
        });
        self.apply(dispatch)
    }

    /// Applies an enrichment response. `false` means it was stale and dropped.
    pub fn complete_enrichment(&mut self, response: EnrichmentResponse) -> bool {
        match self.dispatcher.complete(response, &self.points) {
            Some(records) => {
                self.publish(records);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, dispatch: Dispatch) -> Option<EnrichmentRequest> {
        match dispatch {
            Dispatch::Nothing => None,
            Dispatch::Publish(records) => {
                self.publish(records);
                None
            }
            Dispatch::Fetch(request) => Some(request),
        }
    }

    fn publish(&mut self, records: Vec<ResultRecord>) {
        self.results = records;
        self.results_published = true;
    }

    /// Labels paired with their level-of-detail decision for the current view.
    pub fn label_lods(&self) -> Vec<(&LabelPlacement, LabelLod)> {
        let detail_factor = self.detail_factor();
        let logical_per_px = self.viewport.logical_per_px(self.screen());
        self.labels
            .iter()
            .map(|placement| {
                let lod = label_lod(
                    placement,
                    detail_factor,
                    self.config.label_visibility_threshold,
                    self.config.label_font_px,
                    logical_per_px,
                );
                (placement, lod)
            })
            .collect()
    }

    /// Home zoom over current zoom; grows as the view zooms in. Resizing the
    /// window leaves it unchanged.
    pub fn detail_factor(&self) -> f32 {
        let (home, current) = match self.home_screen {
            Some(home_screen) => (
                self.home.logical_per_px(home_screen),
                self.viewport.logical_per_px(self.screen()),
            ),
            None => (self.home.span(), self.viewport.span()),
        };
        if current <= 0.0 || !current.is_finite() {
            return 1.0;
        }
        home / current
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn active(&self) -> &[usize] {
        &self.active
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Non-fatal diagnostic from loading, such as the colinearity repair.
    pub fn notice(&self) -> Option<&str> {
        self.report.notice.as_deref()
    }

    pub fn filter(&self) -> &ClusterFilter {
        &self.filter
    }

    pub fn cluster_names(&self) -> &[ClusterName] {
        &self.cluster_names
    }

    pub fn palette(&self) -> &ClusterPalette {
        &self.palette
    }

    pub fn clusters(&self) -> &[ClusterGeometry] {
        &self.clusters
    }

    pub fn labels(&self) -> &[LabelPlacement] {
        &self.labels
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn home_viewport(&self) -> &Viewport {
        &self.home
    }

    pub fn highlighted(&self) -> &[usize] {
        self.dispatcher.highlighted()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.dispatcher.state()
    }

    pub fn frame_scheduled(&self) -> bool {
        self.dispatcher.frame_scheduled()
    }

    /// Latest published results; `None` until something was published since
    /// the last filter change.
    pub fn results(&self) -> Option<&[ResultRecord]> {
        self.results_published.then_some(self.results.as_slice())
    }

    /// Bumped on every full scene rebuild.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

fn name_clusters(points: &[Point]) -> Vec<ClusterName> {
    let mut names: Vec<ClusterName> = Vec::new();
    for point in points {
        match names.iter_mut().find(|name| name.label == point.label) {
            Some(name) => {
                name.count += 1;
                if name.display_name == name.label
                    && let Some(topic) = point.topic.as_deref()
                {
                    name.display_name = topic.to_owned();
                }
            }
            None => names.push(ClusterName {
                label: point.label.clone(),
                display_name: point.display_name().to_owned(),
                count: 1,
            }),
        }
    }
    names
}
