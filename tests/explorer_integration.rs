use std::collections::HashMap;
use std::fs;
use std::time::{Duration, Instant};

use eframe::egui::{Pos2, Rect, pos2, vec2};
use tempfile::TempDir;
use topic_explorer::config::ExplorerConfig;
use topic_explorer::dataset::{ItemMetadata, JsonFileMetadata, MetadataSource, load_dataset};
use topic_explorer::explore::{
    ClusterFilter, EnrichmentResponse, Explorer, InteractionState, PointId, PointerEvent,
};

const DATASET: &str = r#"{"id": 1, "x": 0, "y": 0, "label": 7, "topic": "Harbour", "text": "Cranes along the old quay"}
{"id": 2, "x": 1, "y": 0, "label": 7}
{"id": "3", "x": 0, "y": 1, "label": 7}
{"id": 4, "x": 1, "y": 1, "label": 7}
this line is not json
{"id": 5, "x": 10, "y": 10, "label": 12, "topic": "Railway"}
{"id": 6, "x": 11, "y": 10, "label": 12}
{"id": 7, "x": 10, "y": 11, "label": 12, "text": "Signal box"}
{"id": 1.0, "x": 50, "y": 50, "label": 7}
"#;

fn screen() -> Rect {
    Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0))
}

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn explorer_from(contents: &str) -> Explorer {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "points.ndjson", contents);
    let config = ExplorerConfig::default();
    let dataset = load_dataset(&path, config.correlation_threshold).unwrap();
    let mut explorer = Explorer::from_dataset(dataset, config);
    explorer.set_screen(screen());
    explorer
}

fn on_screen(explorer: &Explorer, x: f32, y: f32) -> Pos2 {
    explorer.viewport().logical_to_screen(pos2(x, y), screen())
}

fn result_ids(explorer: &Explorer) -> Vec<String> {
    explorer
        .results()
        .unwrap_or_default()
        .iter()
        .map(|record| record.id.to_string())
        .collect()
}

#[test]
fn load_report_counts_skips_and_duplicates() {
    let explorer = explorer_from(DATASET);
    let report = explorer.report();
    assert_eq!(explorer.points().len(), 7);
    assert_eq!(report.skipped_lines, 1);
    assert_eq!(report.duplicates_dropped, 1);
    assert_eq!(report.fallback_positioned, 0);
    assert!(explorer.notice().is_none());
    assert_eq!(explorer.clusters().len(), 2);
    assert_eq!(explorer.labels().len(), 2);
}

#[test]
fn only_latest_enrichment_reaches_results() {
    let mut explorer = explorer_from(DATASET);
    let now = Instant::now();

    let harbour = on_screen(&explorer, 0.5, 0.5);
    explorer.pointer(PointerEvent::Move(harbour));
    assert_eq!(explorer.interaction_state(), InteractionState::Hovering);
    let request_a = explorer.frame(now).expect("hover should request metadata");
    assert_eq!(request_a.ids.len(), 4);

    let railway = on_screen(&explorer, 10.3, 10.3);
    let request_b = explorer
        .pointer(PointerEvent::Click(railway))
        .expect("click should request metadata");
    assert!(request_b.request_id > request_a.request_id);

    let mut found = HashMap::new();
    found.insert(
        PointId::new("7"),
        ItemMetadata {
            title: Some("Signal box, 1912".to_owned()),
            ..ItemMetadata::default()
        },
    );
    assert!(explorer.complete_enrichment(EnrichmentResponse {
        request_id: request_b.request_id,
        result: Ok(found),
    }));
    assert_eq!(result_ids(&explorer), vec!["5", "6", "7"]);

    assert!(!explorer.complete_enrichment(EnrichmentResponse {
        request_id: request_a.request_id,
        result: Ok(HashMap::new()),
    }));
    assert_eq!(result_ids(&explorer), vec!["5", "6", "7"]);

    let records = explorer.results().unwrap();
    assert_eq!(records[2].payload.title, "Signal box, 1912");
    assert_eq!(records[0].payload.title, "Railway");
    assert_eq!(records[0].source, "Explore");
}

#[test]
fn hover_waits_for_the_refresh_interval() {
    let mut explorer = explorer_from(DATASET);
    let now = Instant::now();

    explorer.pointer(PointerEvent::Move(on_screen(&explorer, 0.5, 0.5)));
    assert!(explorer.frame(now).is_some());

    explorer.pointer(PointerEvent::Move(on_screen(&explorer, 10.2, 10.2)));
    explorer.pointer(PointerEvent::Move(on_screen(&explorer, 10.3, 10.3)));
    assert!(explorer.frame(now + Duration::from_millis(1)).is_none());
    assert!(explorer.frame_scheduled());

    let request = explorer.frame(now + Duration::from_millis(40)).unwrap();
    assert_eq!(request.ids.len(), 3);
}

#[test]
fn filter_limits_queries_to_one_cluster() {
    let mut explorer = explorer_from(DATASET);
    let filter = explorer.resolve_filter("harb").unwrap();
    assert_eq!(filter, ClusterFilter::Cluster("7".to_owned()));
    explorer.set_filter(filter);
    assert_eq!(explorer.active().len(), 4);
    assert_eq!(explorer.clusters().len(), 1);

    let railway = on_screen(&explorer, 10.3, 10.3);
    assert!(explorer.pointer(PointerEvent::Click(railway)).is_none());
    assert_eq!(explorer.results(), Some(&[][..]));

    assert_eq!(explorer.resolve_filter("zzzz"), None);
    assert_eq!(explorer.resolve_filter("all"), Some(ClusterFilter::All));
}

#[test]
fn panning_moves_the_view_without_queries() {
    let mut explorer = explorer_from(DATASET);
    let before = *explorer.viewport();

    assert!(explorer.pointer(PointerEvent::DragStart(pos2(400.0, 300.0))).is_none());
    assert!(explorer.pointer(PointerEvent::Move(pos2(500.0, 300.0))).is_none());
    assert!(explorer.pointer(PointerEvent::Drag(vec2(100.0, 0.0))).is_none());
    assert!(explorer.frame(Instant::now()).is_none());
    assert!(explorer.highlighted().is_empty());
    assert!(explorer.viewport().x < before.x);

    explorer.pointer(PointerEvent::DragEnd);
    assert_eq!(explorer.interaction_state(), InteractionState::Idle);
}

#[test]
fn metadata_file_enriches_results() {
    let dir = TempDir::new().unwrap();
    let metadata_path = write(
        &dir,
        "metadata.json",
        r#"{"1": {"title": "Quay wall", "imageUrl": "https://example.org/quay.jpg"}, "99": {"title": "unused"}}"#,
    );
    let source = JsonFileMetadata::open(&metadata_path).unwrap();
    let mut explorer = explorer_from(DATASET);

    let request = explorer
        .pointer(PointerEvent::Click(on_screen(&explorer, 0.0, 0.0)))
        .unwrap();
    let result = source.fetch(&request.ids);
    assert!(explorer.complete_enrichment(EnrichmentResponse {
        request_id: request.request_id,
        result,
    }));

    let records = explorer.results().unwrap();
    assert_eq!(records[0].id, PointId::new("1"));
    assert_eq!(records[0].score, 0.0);
    assert_eq!(records[0].payload.title, "Quay wall");
    assert_eq!(
        records[0].payload.image_url.as_deref(),
        Some("https://example.org/quay.jpg")
    );
    assert!(records.iter().skip(1).all(|record| !record.payload.enriched));
}

#[test]
fn empty_dataset_is_a_valid_session() {
    let mut explorer = explorer_from("");
    assert!(explorer.points().is_empty());
    assert!(explorer.viewport().width > 0.0 && explorer.viewport().height > 0.0);
    assert!(explorer.label_lods().is_empty());

    explorer.pointer(PointerEvent::Wheel {
        anchor: pos2(400.0, 300.0),
        steps: 1.0,
    });
    assert!(explorer.viewport().width.is_finite());
    assert!(explorer.pointer(PointerEvent::Click(pos2(400.0, 300.0))).is_none());
    assert_eq!(explorer.results(), Some(&[][..]));
}

#[test]
fn colinear_dataset_is_repaired_with_notice() {
    let lines = (0..30)
        .map(|i| format!(r#"{{"id": {i}, "x": {i}, "y": {}, "label": "l{}"}}"#, i * 2, i % 3))
        .collect::<Vec<_>>()
        .join("\n");
    let explorer = explorer_from(&lines);
    assert!(explorer.notice().is_some());
    assert!(explorer.report().correlation.unwrap() > 0.999);

    let radii = explorer
        .points()
        .iter()
        .map(|point| point.pos.to_vec2().length())
        .collect::<Vec<_>>();
    assert!(radii.iter().all(|&r| (0.9..=2.1).contains(&r)));
}

#[test]
fn zoom_changes_label_detail_without_replacing() {
    let mut explorer = explorer_from(DATASET);
    let placements = explorer.labels().to_vec();
    let far = explorer
        .label_lods()
        .iter()
        .map(|(_, lod)| lod.visible)
        .collect::<Vec<_>>();
    assert_eq!(far, vec![false, true]);

    explorer.pointer(PointerEvent::Wheel {
        anchor: on_screen(&explorer, 5.0, 5.0),
        steps: 4.0,
    });
    assert_eq!(explorer.labels(), placements.as_slice());
    assert!(explorer.label_lods().iter().all(|(_, lod)| lod.visible));
}

#[test]
fn oversized_coordinate_does_not_silence_queries() {
    let mut explorer = explorer_from(
        r#"{"id": "a", "x": 0, "y": 0, "label": "k"}
{"id": "b", "x": 1, "y": 0, "label": "k"}
{"id": "c", "x": 0, "y": 1, "label": "k"}
{"id": "big", "x": 1e39, "y": 2, "label": "k"}
"#,
    );
    assert_eq!(explorer.report().fallback_positioned, 1);
    assert!(explorer.points().iter().all(|point| point.pos.is_finite()));
    assert!(explorer.clusters()[0].centroid.is_finite());

    let request = explorer
        .pointer(PointerEvent::Click(on_screen(&explorer, 1.0, 0.0)))
        .expect("click near b should request metadata");
    assert!(request.ids.contains(&PointId::new("b")));
    assert!(!explorer.highlighted().is_empty());
}
