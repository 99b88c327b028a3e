//! Integration tests for a complete feature run
//!
//! These tests drive `FeaturePipeline` end to end: normalization, indexing,
//! relational extraction, block grouping and table assembly.

use footprint_core::config::{ConfigOverrides, LayeredConfig};
use footprint_core::models::{
    BuildingId, DistanceMetric, FeatureTable, FeatureValue, PolygonRecord, RelationalConfig,
    RowStatus, SCHEMA_VERSION,
};
use footprint_core::{FootprintError, IndexError};
use footprint_features::{CancellationToken, FeaturePipeline, Stage};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn run(records: Vec<PolygonRecord>) -> FeatureTable {
    FeaturePipeline::default().run(records, &CancellationToken::new()).unwrap()
}

fn numeric(table: &FeatureTable, id: &str, feature: &str) -> f64 {
    table
        .row(&BuildingId::from(id))
        .and_then(|row| row.value(feature))
        .and_then(FeatureValue::as_f64)
        .unwrap_or_else(|| panic!("{} of {} should be numeric", feature, id))
}

fn bowtie() -> PolygonRecord {
    PolygonRecord::new("bowtie", vec![[0.0, 0.0], [2.0, 2.0], [2.0, 0.0], [0.0, 2.0], [0.0, 0.0]])
}

#[test]
fn test_three_squares_scenario() {
    init_tracing();
    let table = run(vec![
        PolygonRecord::rectangle("a", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("b", 30.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("c", 0.0, 40.0, 20.0, 20.0),
    ]);

    assert_eq!(table.schema_version, SCHEMA_VERSION);
    assert_eq!(table.len(), 3);
    assert_eq!(numeric(&table, "a", "area"), 100.0);
    assert_eq!(numeric(&table, "b", "area"), 100.0);
    assert_eq!(numeric(&table, "c", "area"), 400.0);

    let small = numeric(&table, "a", "compactness");
    let large = numeric(&table, "c", "compactness");
    assert!((small - large).abs() < 1e-12);

    // Centroids: a (5, 5), b (35, 5), c (10, 50)
    assert!((numeric(&table, "a", "nearest_neighbor_distance") - 30.0).abs() < 1e-9);
    assert!((numeric(&table, "b", "nearest_neighbor_distance") - 30.0).abs() < 1e-9);
    let expected_c = 5.0_f64.hypot(45.0);
    assert!((numeric(&table, "c", "nearest_neighbor_distance") - expected_c).abs() < 1e-9);
}

#[test]
fn test_bowtie_is_repaired_or_failed() {
    init_tracing();
    let table = run(vec![bowtie(), PolygonRecord::rectangle("house", 5.0, 0.0, 4.0, 4.0)]);

    let row = table.row(&BuildingId::from("bowtie")).unwrap();
    match row.status {
        RowStatus::Failed => {
            assert!(row.failure.as_deref().unwrap_or_default().contains("Unrepairable"));
        }
        _ => {
            let area = numeric(&table, "bowtie", "area");
            assert!((area - 2.0).abs() < 1e-9, "bowtie area was {}", area);
        }
    }
}

#[test]
fn test_every_input_gets_a_row_in_input_order() {
    init_tracing();
    let records = vec![
        PolygonRecord::rectangle("z", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::new("line", vec![[0.0, 0.0], [5.0, 5.0], [10.0, 10.0], [0.0, 0.0]]),
        PolygonRecord::rectangle("m", 15.0, 0.0, 10.0, 10.0),
        PolygonRecord::new("nan", vec![[0.0, 0.0], [f64::NAN, 1.0], [1.0, 1.0], [0.0, 0.0]]),
    ];
    let ids: Vec<String> = records.iter().map(|r| r.id.to_string()).collect();

    let (table, stats) =
        FeaturePipeline::default().run_with_stats(records, &CancellationToken::new()).unwrap();

    let row_ids: Vec<String> = table.rows.iter().map(|row| row.id.to_string()).collect();
    assert_eq!(row_ids, ids);
    assert_eq!(table.count_status(RowStatus::Failed), 2);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.buildings, 4);
    assert_eq!(stats.ok + stats.partial + stats.failed, 4);

    let failed = table.row(&BuildingId::from("line")).unwrap();
    assert!(failed.values().all(|(_, value)| !value.is_available()));
    assert!(failed.failure.is_some());
}

#[test]
fn test_isolated_building_density_is_unavailable() {
    init_tracing();
    let table = run(vec![
        PolygonRecord::rectangle("town", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("farm", 5_000.0, 5_000.0, 10.0, 10.0),
    ]);

    let row = table.row(&BuildingId::from("farm")).unwrap();
    assert_eq!(row.status, RowStatus::Partial);
    assert!(matches!(row.value("local_density"), Some(FeatureValue::Unavailable(_))));
    assert!(row.value("area").unwrap().is_available());
}

#[test]
fn test_terrace_forms_a_block() {
    init_tracing();
    let table = run(vec![
        PolygonRecord::rectangle("h3", 20.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("h1", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("h2", 10.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("shed", 50.0, 0.0, 5.0, 5.0),
    ]);

    for id in ["h1", "h2", "h3"] {
        let row = table.row(&BuildingId::from(id)).unwrap();
        assert_eq!(row.value("block_id"), Some(&FeatureValue::Categorical("h1".to_string())));
        assert_eq!(numeric(&table, id, "block_size"), 3.0);
        assert_eq!(numeric(&table, id, "block_area"), 300.0);
    }
    assert_eq!(numeric(&table, "shed", "block_size"), 1.0);
    assert_eq!(numeric(&table, "h2", "touches"), 2.0);
    assert!((numeric(&table, "h2", "shared_boundary_ratio") - 0.5).abs() < 1e-9);
}

#[test]
fn test_corner_contact_joins_block() {
    init_tracing();
    let table = run(vec![
        PolygonRecord::rectangle("a", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("b", 10.0, 10.0, 10.0, 10.0),
        PolygonRecord::rectangle("c", 25.0, 0.0, 10.0, 10.0),
    ]);

    for id in ["a", "b"] {
        assert_eq!(numeric(&table, id, "block_size"), 2.0);
        assert_eq!(numeric(&table, id, "block_area"), 200.0);
        assert_eq!(numeric(&table, id, "touches"), 0.0);
    }
    assert_eq!(numeric(&table, "c", "block_size"), 1.0);
}

#[test]
fn test_runs_are_deterministic() {
    init_tracing();
    let records: Vec<PolygonRecord> = (0..40)
        .map(|i| {
            let (x, y) = ((i % 8) as f64 * 12.0, (i / 8) as f64 * 15.0);
            PolygonRecord::rectangle(format!("b{:02}", i), x, y, 10.0 + (i % 3) as f64, 9.0)
        })
        .collect();

    let first = run(records.clone());
    let second = run(records);
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_edge_metric_run() {
    init_tracing();
    let config = RelationalConfig::default().with_distance_metric(DistanceMetric::Edge);
    let table = FeaturePipeline::new(config)
        .run(
            vec![
                PolygonRecord::rectangle("a", 0.0, 0.0, 10.0, 10.0),
                PolygonRecord::rectangle("b", 13.0, 0.0, 10.0, 10.0),
            ],
            &CancellationToken::new(),
        )
        .unwrap();

    assert!((numeric(&table, "a", "nearest_neighbor_distance") - 3.0).abs() < 1e-9);
}

#[test]
fn test_empty_input_is_fatal() {
    let result = FeaturePipeline::default().run(Vec::new(), &CancellationToken::new());
    assert!(matches!(result, Err(FootprintError::Index(IndexError::BuildFailure { .. }))));
}

#[test]
fn test_all_degenerate_input_is_fatal() {
    let records = vec![PolygonRecord::new("flat", vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]])];
    let result = FeaturePipeline::default().run(records, &CancellationToken::new());
    assert!(matches!(result, Err(FootprintError::Index(IndexError::BuildFailure { .. }))));
}

#[test]
fn test_cancelled_run_discards_results() {
    let records = vec![
        PolygonRecord::rectangle("a", 0.0, 0.0, 10.0, 10.0),
        PolygonRecord::rectangle("b", 20.0, 0.0, 10.0, 10.0),
    ];
    let pipeline = FeaturePipeline::default();

    let earlier = pipeline.run(records.clone(), &CancellationToken::new()).unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let result = pipeline.run(records, &token);
    assert!(matches!(result, Err(FootprintError::Cancelled)));

    // Tables from completed runs are owned values and stay intact
    assert_eq!(earlier.len(), 2);
    assert_eq!(earlier.count_status(RowStatus::Failed), 0);
}

#[test]
fn test_cancel_during_run() {
    let records: Vec<PolygonRecord> = (0..10)
        .map(|i| PolygonRecord::rectangle(format!("b{}", i), i as f64 * 20.0, 0.0, 10.0, 10.0))
        .collect();
    let token = CancellationToken::new();
    let trigger = token.clone();

    let result = FeaturePipeline::default().run_with_progress(records, &token, |progress| {
        if progress.stage == Stage::Relational {
            trigger.cancel();
        }
    });
    assert!(matches!(result, Err(FootprintError::Cancelled)));
}

#[test]
fn test_pipeline_from_layered_config() {
    let mut layered = LayeredConfig::with_defaults();
    layered.apply_overrides(ConfigOverrides { k: Some(1), radius: Some(25.0), ..Default::default() });

    let pipeline = FeaturePipeline::from_layered(&layered).unwrap();
    assert_eq!(pipeline.config().k, 1);
    assert_eq!(pipeline.config().radius, 25.0);

    let mut invalid = LayeredConfig::with_defaults();
    invalid.apply_overrides(ConfigOverrides { radius: Some(0.0), ..Default::default() });
    assert!(matches!(
        FeaturePipeline::from_layered(&invalid),
        Err(FootprintError::ConfigInvalid { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn every_record_gets_exactly_one_row(
        cells in prop::collection::vec((0u8..20, 0u8..20, 1.0..8.0f64), 1..30),
    ) {
        let records: Vec<PolygonRecord> = cells
            .iter()
            .enumerate()
            .map(|(i, (cx, cy, size))| {
                PolygonRecord::rectangle(format!("p{}", i), *cx as f64 * 10.0, *cy as f64 * 10.0, *size, *size)
            })
            .collect();

        let table = run(records);
        prop_assert_eq!(table.len(), cells.len());
        for (i, row) in table.rows.iter().enumerate() {
            prop_assert_eq!(row.id.to_string(), format!("p{}", i));
            prop_assert!(row.status != RowStatus::Failed);
            let area = row.value("area").and_then(FeatureValue::as_f64).unwrap_or(-1.0);
            prop_assert!(area > 0.0);
        }
    }
}
