use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

use anyhow::Result;
use eframe::egui::{Pos2, Rect, Vec2};
use tracing::{debug, warn};

use super::point::{Point, PointId};
use super::results::ResultRecord;
use super::spatial::{Neighbor, SpatialIndex, default_radius};
use super::viewport::Viewport;
use crate::config::ExplorerConfig;
use crate::dataset::ItemMetadata;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteractionState {
    Idle,
    Hovering,
    Panning,
}

/// Pointer input in screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Move(Pos2),
    Leave,
    Click(Pos2),
    DragStart(Pos2),
    Drag(Vec2),
    DragEnd,
    /// Positive steps zoom in.
    Wheel { anchor: Pos2, steps: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnrichmentRequest {
    pub request_id: u64,
    pub ids: Vec<PointId>,
}

#[derive(Debug)]
pub struct EnrichmentResponse {
    pub request_id: u64,
    pub result: Result<HashMap<PointId, ItemMetadata>>,
}

/// What the caller has to do after an input or frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    Nothing,
    Publish(Vec<ResultRecord>),
    Fetch(EnrichmentRequest),
}

/// Borrowed view of everything a query touches.
pub struct DispatchContext<'a> {
    pub points: &'a [Point],
    pub index: &'a SpatialIndex,
    pub viewport: &'a mut Viewport,
    pub screen: Rect,
    pub config: &'a ExplorerConfig,
}

struct PendingResults {
    request_id: u64,
    neighbors: Vec<Neighbor>,
}

/// Hover, click and drag handling over the explorer scene.
///
/// Runs on one thread. Only the most recently issued enrichment request may
/// publish; older responses are dropped when they arrive.
pub struct Dispatcher {
    state: InteractionState,
    last_pointer: Option<Pos2>,
    pending_hover: Option<Pos2>,
    frame_scheduled: bool,
    last_hover_run: Option<Instant>,
    highlighted: Vec<usize>,
    last_published: Option<BTreeSet<PointId>>,
    request_seq: u64,
    pending: Option<PendingResults>,
    cache: HashMap<PointId, ItemMetadata>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            last_pointer: None,
            pending_hover: None,
            frame_scheduled: false,
            last_hover_run: None,
            highlighted: Vec::new(),
            last_published: None,
            request_seq: 0,
            pending: None,
            cache: HashMap::new(),
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Point indices matched by the latest query.
    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }

    /// A hover position is waiting for the next frame.
    pub fn frame_scheduled(&self) -> bool {
        self.frame_scheduled
    }

    pub fn request_seq(&self) -> u64 {
        self.request_seq
    }

    pub fn cached_metadata(&self, id: &PointId) -> Option<&ItemMetadata> {
        self.cache.get(id)
    }

    /// Forgets per-subset state after the active points change. In-flight
    /// enrichment becomes stale; the metadata cache survives.
    pub fn reset(&mut self) {
        self.request_seq += 1;
        self.pending = None;
        self.pending_hover = None;
        self.frame_scheduled = false;
        self.highlighted.clear();
        self.last_published = None;
        if self.state == InteractionState::Hovering {
            self.state = InteractionState::Idle;
        }
    }

    pub fn handle(&mut self, event: PointerEvent, ctx: &mut DispatchContext<'_>) -> Dispatch {
        match event {
            PointerEvent::Move(position) => {
                self.last_pointer = Some(position);
                if self.state != InteractionState::Panning {
                    self.state = InteractionState::Hovering;
                    self.schedule_hover(position);
                }
                Dispatch::Nothing
            }
            PointerEvent::Leave => {
                if self.state != InteractionState::Panning {
                    self.state = InteractionState::Idle;
                }
                self.last_pointer = None;
                self.pending_hover = None;
                self.frame_scheduled = false;
                self.highlighted.clear();
                Dispatch::Nothing
            }
            PointerEvent::DragStart(position) => {
                self.state = InteractionState::Panning;
                self.last_pointer = Some(position);
                self.pending_hover = None;
                self.frame_scheduled = false;
                Dispatch::Nothing
            }
            PointerEvent::Drag(delta) => {
                if self.state == InteractionState::Panning {
                    ctx.viewport.pan(delta, ctx.screen);
                }
                Dispatch::Nothing
            }
            PointerEvent::DragEnd => {
                if self.state == InteractionState::Panning {
                    self.state = InteractionState::Idle;
                }
                Dispatch::Nothing
            }
            PointerEvent::Wheel { anchor, steps } => {
                ctx.viewport.zoom_at(
                    anchor,
                    ctx.screen,
                    steps,
                    ctx.config.zoom_step,
                    ctx.config.viewport_min_span,
                );
                if self.state == InteractionState::Hovering
                    && let Some(position) = self.last_pointer
                {
                    self.schedule_hover(position);
                }
                Dispatch::Nothing
            }
            PointerEvent::Click(position) => {
                if self.state == InteractionState::Panning {
                    return Dispatch::Nothing;
                }
                self.pending_hover = None;
                self.frame_scheduled = false;
                self.run_query(position, true, ctx)
            }
        }
    }

    /// Runs the coalesced hover query if one is due.
    ///
    /// At most one hover query runs per `interval`; positions received in
    /// between collapse into the latest one.
    pub fn run_frame(
        &mut self,
        now: Instant,
        interval: Duration,
        ctx: &mut DispatchContext<'_>,
    ) -> Dispatch {
        if self.state == InteractionState::Panning {
            return Dispatch::Nothing;
        }
        let Some(position) = self.pending_hover else {
            return Dispatch::Nothing;
        };
        if let Some(last) = self.last_hover_run
            && now.saturating_duration_since(last) < interval
        {
            return Dispatch::Nothing;
        }

        self.pending_hover = None;
        self.frame_scheduled = false;
        self.last_hover_run = Some(now);
        self.run_query(position, false, ctx)
    }

    /// Applies an enrichment response, unless a newer request has been issued since.
    pub fn complete(
        &mut self,
        response: EnrichmentResponse,
        points: &[Point],
    ) -> Option<Vec<ResultRecord>> {
        if response.request_id != self.request_seq {
            debug!(
                request_id = response.request_id,
                current = self.request_seq,
                "discarding stale enrichment response"
            );
            return None;
        }

        let pending = self.pending.take_if(|p| p.request_id == response.request_id)?;
        match response.result {
            Ok(found) => self.cache.extend(found),
            Err(error) => {
                warn!(
                    request_id = response.request_id,
                    error = %format!("{error:#}"),
                    "metadata enrichment failed, using local fields"
                );
            }
        }

        Some(self.build_records(&pending.neighbors, points))
    }

    fn schedule_hover(&mut self, position: Pos2) {
        self.pending_hover = Some(position);
        self.frame_scheduled = true;
    }

    fn run_query(
        &mut self,
        position: Pos2,
        forced: bool,
        ctx: &mut DispatchContext<'_>,
    ) -> Dispatch {
        let logical = ctx.viewport.screen_to_logical(position, ctx.screen);
        let radius = default_radius(
            ctx.viewport.size(),
            ctx.config.neighbor_radius_fraction,
            ctx.config.min_neighbor_radius,
        );
        let neighbors = ctx.index.query(logical, radius, ctx.config.neighbor_limit);
        self.highlighted = neighbors.iter().map(|hit| hit.index).collect();

        let key = neighbors
            .iter()
            .filter_map(|hit| ctx.points.get(hit.index).map(|point| point.id.clone()))
            .collect::<BTreeSet<_>>();
        if !forced && self.last_published.as_ref() == Some(&key) {
            return Dispatch::Nothing;
        }
        self.last_published = Some(key);

        self.request_seq += 1;
        let request_id = self.request_seq;
        let missing = neighbors
            .iter()
            .filter_map(|hit| ctx.points.get(hit.index))
            .filter(|point| !self.cache.contains_key(&point.id))
            .map(|point| point.id.clone())
            .collect::<Vec<_>>();

        if missing.is_empty() {
            self.pending = None;
            return Dispatch::Publish(self.build_records(&neighbors, ctx.points));
        }

        self.pending = Some(PendingResults {
            request_id,
            neighbors,
        });
        Dispatch::Fetch(EnrichmentRequest {
            request_id,
            ids: missing,
        })
    }

    fn build_records(&self, neighbors: &[Neighbor], points: &[Point]) -> Vec<ResultRecord> {
        neighbors
            .iter()
            .filter_map(|hit| {
                let point = points.get(hit.index)?;
                Some(ResultRecord::new(point, hit.distance, self.cache.get(&point.id)))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use eframe::egui::{pos2, vec2};

    use super::*;

    struct Fixture {
        points: Vec<Point>,
        index: SpatialIndex,
        viewport: Viewport,
        config: ExplorerConfig,
        screen: Rect,
    }

    impl Fixture {
        fn new() -> Self {
            let points = [("a", 10.0, 10.0), ("b", 12.0, 10.0), ("c", 80.0, 80.0)]
                .iter()
                .map(|&(id, x, y)| Point {
                    id: PointId::new(id),
                    pos: pos2(x, y),
                    label: "k".to_owned(),
                    topic: None,
                    text: Some(format!("about {id}")),
                })
                .collect::<Vec<_>>();
            let index = SpatialIndex::build(&points, &[0, 1, 2]);
            Self {
                points,
                index,
                viewport: Viewport::new(0.0, 0.0, 100.0, 100.0),
                config: ExplorerConfig::default(),
                screen: Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0)),
            }
        }

        fn ctx(&mut self) -> DispatchContext<'_> {
            DispatchContext {
                points: &self.points,
                index: &self.index,
                viewport: &mut self.viewport,
                screen: self.screen,
                config: &self.config,
            }
        }
    }

    fn click(dispatcher: &mut Dispatcher, fixture: &mut Fixture, x: f32, y: f32) -> Dispatch {
        dispatcher.handle(PointerEvent::Click(pos2(x, y)), &mut fixture.ctx())
    }

    fn fetch_id(dispatch: Dispatch) -> EnrichmentRequest {
        match dispatch {
            Dispatch::Fetch(request) => request,
            other => panic!("expected fetch, got {other:?}"),
        }
    }

    #[test]
    fn moves_coalesce_into_one_query_per_frame() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();
        let now = Instant::now();

        for x in [50.0, 60.0, 11.0] {
            dispatcher.handle(PointerEvent::Move(pos2(x, 10.0)), &mut fixture.ctx());
        }
        assert!(dispatcher.frame_scheduled());
        assert_eq!(dispatcher.state(), InteractionState::Hovering);

        let interval = Duration::from_millis(16);
        let request = fetch_id(dispatcher.run_frame(now, interval, &mut fixture.ctx()));
        assert_eq!(request.request_id, 1);
        assert_eq!(request.ids, vec![PointId::new("a"), PointId::new("b")]);
        assert!(!dispatcher.frame_scheduled());

        dispatcher.handle(PointerEvent::Move(pos2(80.0, 80.0)), &mut fixture.ctx());
        let early = dispatcher.run_frame(now + interval / 3, interval, &mut fixture.ctx());
        assert_eq!(early, Dispatch::Nothing);
        assert!(dispatcher.frame_scheduled());

        let later = dispatcher.run_frame(now + interval * 2, interval, &mut fixture.ctx());
        assert_eq!(fetch_id(later).ids, vec![PointId::new("c")]);
    }

    #[test]
    fn unchanged_hover_does_not_republish_but_click_does() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();
        let interval = Duration::ZERO;
        let now = Instant::now();

        dispatcher.handle(PointerEvent::Move(pos2(11.0, 10.0)), &mut fixture.ctx());
        let request = fetch_id(dispatcher.run_frame(now, interval, &mut fixture.ctx()));
        let published = dispatcher
            .complete(
                EnrichmentResponse {
                    request_id: request.request_id,
                    result: Ok(HashMap::new()),
                },
                &fixture.points,
            )
            .unwrap();
        assert_eq!(published.len(), 2);

        dispatcher.handle(PointerEvent::Move(pos2(11.5, 10.0)), &mut fixture.ctx());
        assert_eq!(dispatcher.run_frame(now, interval, &mut fixture.ctx()), Dispatch::Nothing);

        let click = dispatcher.handle(PointerEvent::Click(pos2(11.5, 10.0)), &mut fixture.ctx());
        assert!(matches!(click, Dispatch::Fetch(_)));
    }

    #[test]
    fn only_latest_enrichment_is_applied() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();

        let a = fetch_id(click(&mut dispatcher, &mut fixture, 11.0, 10.0));
        let b = fetch_id(click(&mut dispatcher, &mut fixture, 80.0, 80.0));
        assert!(b.request_id > a.request_id);

        let mut meta_b = HashMap::new();
        meta_b.insert(
            PointId::new("c"),
            ItemMetadata {
                title: Some("from B".to_owned()),
                ..ItemMetadata::default()
            },
        );
        let applied = dispatcher
            .complete(
                EnrichmentResponse {
                    request_id: b.request_id,
                    result: Ok(meta_b),
                },
                &fixture.points,
            )
            .unwrap();
        assert_eq!(applied[0].payload.title, "from B");

        let mut meta_a = HashMap::new();
        meta_a.insert(PointId::new("a"), ItemMetadata::default());
        let stale = dispatcher.complete(
            EnrichmentResponse {
                request_id: a.request_id,
                result: Ok(meta_a),
            },
            &fixture.points,
        );
        assert!(stale.is_none());
        assert!(dispatcher.cached_metadata(&PointId::new("a")).is_none());
    }

    #[test]
    fn failed_enrichment_degrades_to_local_fields() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();

        let request = fetch_id(click(&mut dispatcher, &mut fixture, 80.0, 80.0));
        let records = dispatcher
            .complete(
                EnrichmentResponse {
                    request_id: request.request_id,
                    result: Err(anyhow!("connection refused")),
                },
                &fixture.points,
            )
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload.title, "about c");
        assert!(!records[0].payload.enriched);
    }

    #[test]
    fn cached_metadata_publishes_without_fetch() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();

        let request = fetch_id(click(&mut dispatcher, &mut fixture, 80.0, 80.0));
        let mut found = HashMap::new();
        found.insert(PointId::new("c"), ItemMetadata::default());
        dispatcher.complete(
            EnrichmentResponse {
                request_id: request.request_id,
                result: Ok(found),
            },
            &fixture.points,
        );

        let again = dispatcher.handle(PointerEvent::Click(pos2(80.0, 80.0)), &mut fixture.ctx());
        match again {
            Dispatch::Publish(records) => {
                assert_eq!(records[0].id, PointId::new("c"));
                assert_eq!(records[0].score, 0.0);
            }
            other => panic!("expected publish, got {other:?}"),
        }
    }

    #[test]
    fn empty_neighborhood_publishes_empty_list() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();
        let dispatch = dispatcher.handle(PointerEvent::Click(pos2(40.0, 60.0)), &mut fixture.ctx());
        assert_eq!(dispatch, Dispatch::Publish(Vec::new()));
        assert!(dispatcher.highlighted().is_empty());
    }

    #[test]
    fn panning_suspends_hover() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();
        let now = Instant::now();

        dispatcher.handle(PointerEvent::DragStart(pos2(50.0, 50.0)), &mut fixture.ctx());
        assert_eq!(dispatcher.state(), InteractionState::Panning);

        dispatcher.handle(PointerEvent::Move(pos2(60.0, 50.0)), &mut fixture.ctx());
        dispatcher.handle(PointerEvent::Drag(vec2(10.0, 0.0)), &mut fixture.ctx());
        assert!(!dispatcher.frame_scheduled());
        let frame = dispatcher.run_frame(now, Duration::ZERO, &mut fixture.ctx());
        assert_eq!(frame, Dispatch::Nothing);
        assert_eq!(fixture.viewport.x, -10.0);

        dispatcher.handle(PointerEvent::DragEnd, &mut fixture.ctx());
        assert_eq!(dispatcher.state(), InteractionState::Idle);

        dispatcher.handle(PointerEvent::Move(pos2(21.0, 10.0)), &mut fixture.ctx());
        assert!(matches!(
            dispatcher.run_frame(now, Duration::ZERO, &mut fixture.ctx()),
            Dispatch::Fetch(_)
        ));
    }

    #[test]
    fn leave_returns_to_idle_and_clears_highlight() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();

        dispatcher.handle(PointerEvent::Click(pos2(11.0, 10.0)), &mut fixture.ctx());
        assert_eq!(dispatcher.highlighted(), &[0, 1]);

        dispatcher.handle(PointerEvent::Move(pos2(12.0, 10.0)), &mut fixture.ctx());
        dispatcher.handle(PointerEvent::Leave, &mut fixture.ctx());
        assert_eq!(dispatcher.state(), InteractionState::Idle);
        assert!(dispatcher.highlighted().is_empty());
        assert!(!dispatcher.frame_scheduled());
    }

    #[test]
    fn reset_invalidates_in_flight_requests() {
        let mut fixture = Fixture::new();
        let mut dispatcher = Dispatcher::new();

        let request = fetch_id(click(&mut dispatcher, &mut fixture, 11.0, 10.0));
        dispatcher.reset();
        let outcome = dispatcher.complete(
            EnrichmentResponse {
                request_id: request.request_id,
                result: Ok(HashMap::new()),
            },
            &fixture.points,
        );
        assert!(outcome.is_none());
    }
}
