use footprint_core::config::{self, LayeredConfig};
use footprint_core::models::{
    BlockFeatures, BuildingId, FeatureTable, FeatureValue, IntrinsicFeature, IntrinsicFeatures,
    PolygonRecord, RelationalConfig, RelationalFeatures, RowStatus,
};
use footprint_core::{FootprintError, GeometryError, IndexError, Result};
use footprint_geo::{intrinsic, normalize, NormalizedGeometry, SpatialIndex};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

use crate::assemble::assemble;
use crate::blocks::{group_blocks, BlockMember};
use crate::models::{CancellationToken, RunProgress, RunStats, Stage};
use crate::relational::{self, NeighborLookup, RelationalOutcome};

/// Feature extraction pipeline turning polygon records into a feature table
///
/// Each run owns its geometries, cached intrinsic features and spatial
/// index; all of them are dropped when the run returns.
#[derive(Debug, Clone, Default)]
pub struct FeaturePipeline {
    config: RelationalConfig,
}

impl FeaturePipeline {
    /// Create a new pipeline applying `config` to every building
    pub fn new(config: RelationalConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline from resolved layered configuration
    pub fn from_layered(layered: &LayeredConfig) -> Result<Self> {
        Ok(Self::new(layered.resolve()?))
    }

    pub fn config(&self) -> &RelationalConfig {
        &self.config
    }

    /// Run the pipeline and return the feature table
    pub fn run(&self, records: Vec<PolygonRecord>, cancel: &CancellationToken) -> Result<FeatureTable> {
        self.run_with_stats(records, cancel).map(|(table, _)| table)
    }

    /// Run the pipeline and return the table with a run summary
    pub fn run_with_stats(
        &self,
        records: Vec<PolygonRecord>,
        cancel: &CancellationToken,
    ) -> Result<(FeatureTable, RunStats)> {
        self.run_with_progress(records, cancel, |_| {})
    }

    /// Run the pipeline with progress reporting at the start of each stage
    ///
    /// Fails on invalid configuration, empty input, duplicate ids, a failed
    /// index build or cancellation. Per-building failures become row status.
    pub fn run_with_progress<F>(
        &self,
        records: Vec<PolygonRecord>,
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<(FeatureTable, RunStats)>
    where
        F: FnMut(RunProgress),
    {
        config::validate(&self.config)?;

        if records.is_empty() {
            return Err(IndexError::BuildFailure { reason: "input contains no records".to_string() }
                .into());
        }
        check_unique_ids(&records)?;

        let mut stats = RunStats { buildings: records.len(), ..Default::default() };

        // Stage 1: normalize and compute intrinsic features, in parallel
        progress(RunProgress {
            stage: Stage::Normalize,
            total: records.len(),
            message: "Normalizing geometries".to_string(),
        });
        let normalized = timed(Stage::Normalize, &mut stats, || {
            records
                .par_iter()
                .map(|record| {
                    check_cancelled(cancel)?;
                    Ok(normalize_record(record))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut geometries: Vec<NormalizedGeometry> = Vec::new();
        let mut intrinsics: Vec<IntrinsicFeatures> = Vec::new();
        let slots: Vec<std::result::Result<usize, GeometryError>> = normalized
            .into_iter()
            .map(|outcome| {
                outcome.map(|(geometry, features)| {
                    geometries.push(geometry);
                    intrinsics.push(features);
                    geometries.len() - 1
                })
            })
            .collect();

        stats.repaired = geometries.iter().filter(|g| g.was_repaired()).count();
        if geometries.is_empty() {
            return Err(IndexError::BuildFailure {
                reason: "no record survived normalization".to_string(),
            }
            .into());
        }

        // Stage 2: single barrier, build the index
        check_cancelled(cancel)?;
        progress(RunProgress {
            stage: Stage::Index,
            total: geometries.len(),
            message: "Building spatial index".to_string(),
        });
        let index = timed(Stage::Index, &mut stats, || {
            SpatialIndex::build(&geometries, self.config.distance_metric).map_err(FootprintError::from)
        })?;

        // Stage 3: relational features, in parallel over the shared index
        progress(RunProgress {
            stage: Stage::Relational,
            total: geometries.len(),
            message: "Extracting relational features".to_string(),
        });
        let context = RunContext::new(&index, &geometries, &intrinsics);
        let outcomes = timed(Stage::Relational, &mut stats, || {
            geometries
                .par_iter()
                .map(|geometry| {
                    check_cancelled(cancel)?;
                    Ok(relational::extract(geometry.id(), &index, &context, &self.config))
                })
                .collect::<Result<Vec<RelationalOutcome>>>()
        })?;

        // Stage 4: blocks of buildings sharing walls
        check_cancelled(cancel)?;
        progress(RunProgress {
            stage: Stage::Blocks,
            total: geometries.len(),
            message: "Grouping blocks".to_string(),
        });
        let blocks = timed(Stage::Blocks, &mut stats, || {
            let members: Vec<BlockMember<'_>> = geometries
                .iter()
                .zip(&intrinsics)
                .zip(&outcomes)
                .map(|((geometry, features), outcome)| BlockMember {
                    id: geometry.id(),
                    area: features.get(IntrinsicFeature::Area).as_f64(),
                    contacts: &outcome.contacts,
                })
                .collect();
            Ok(group_blocks(&members))
        })?;
        stats.blocks = count_blocks(&blocks);

        // Stage 5: one row per input record, in input order
        check_cancelled(cancel)?;
        progress(RunProgress {
            stage: Stage::Assemble,
            total: records.len(),
            message: "Assembling feature table".to_string(),
        });
        let rows = timed(Stage::Assemble, &mut stats, || {
            let rows = records
                .into_iter()
                .zip(slots)
                .map(|(record, slot)| match slot {
                    Ok(slot) => assemble(
                        record.id,
                        Ok(intrinsics[slot].clone()),
                        outcomes[slot].features.clone(),
                        blocks[slot].clone(),
                    ),
                    Err(err) => {
                        let reason = err.to_string();
                        assemble(
                            record.id,
                            Err(err),
                            RelationalFeatures::unavailable(&reason),
                            BlockFeatures::unavailable(&reason),
                        )
                    }
                })
                .collect::<Vec<_>>();
            Ok(rows)
        })?;

        let table = FeatureTable::new(rows);
        stats.ok = table.count_status(RowStatus::Ok);
        stats.partial = table.count_status(RowStatus::Partial);
        stats.failed = table.count_status(RowStatus::Failed);

        tracing::info!(
            buildings = stats.buildings,
            ok = stats.ok,
            partial = stats.partial,
            failed = stats.failed,
            repaired = stats.repaired,
            blocks = stats.blocks,
            elapsed_ms = stats.total_duration().as_millis() as u64,
            "Feature run complete"
        );

        Ok((table, stats))
    }
}

/// Geometries and cached intrinsic features of a run, served to relational extraction
struct RunContext<'a> {
    index: &'a SpatialIndex<'a>,
    intrinsics: HashMap<&'a BuildingId, &'a IntrinsicFeatures>,
}

impl<'a> RunContext<'a> {
    fn new(
        index: &'a SpatialIndex<'a>,
        geometries: &'a [NormalizedGeometry],
        intrinsics: &'a [IntrinsicFeatures],
    ) -> Self {
        let intrinsics = geometries.iter().map(NormalizedGeometry::id).zip(intrinsics).collect();
        Self { index, intrinsics }
    }
}

impl NeighborLookup for RunContext<'_> {
    fn geometry(&self, id: &BuildingId) -> Option<&NormalizedGeometry> {
        self.index.geometry(id)
    }

    fn intrinsic_value(&self, id: &BuildingId, feature: IntrinsicFeature) -> FeatureValue {
        match self.intrinsics.get(id) {
            Some(features) => features.get(feature).clone(),
            None => FeatureValue::unavailable(format!("unknown building {}", id)),
        }
    }
}

fn normalize_record(
    record: &PolygonRecord,
) -> std::result::Result<(NormalizedGeometry, IntrinsicFeatures), GeometryError> {
    match normalize(record) {
        Ok(geometry) => {
            let features = intrinsic::extract(&geometry);
            Ok((geometry, features))
        }
        Err(err) => {
            tracing::debug!(id = %record.id, error = %err, "Rejected geometry");
            Err(err)
        }
    }
}

fn check_unique_ids(records: &[PolygonRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(&record.id) {
            return Err(FootprintError::DuplicateId { id: record.id.to_string() });
        }
    }
    Ok(())
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(FootprintError::Cancelled)
    } else {
        Ok(())
    }
}

/// Run one stage inside its span and record how long it took
fn timed<T, W>(stage: Stage, stats: &mut RunStats, work: W) -> Result<T>
where
    W: FnOnce() -> Result<T>,
{
    let span = tracing::info_span!("stage", stage = stage.name());
    let _entered = span.enter();

    let started = Instant::now();
    let result = work();
    let elapsed = started.elapsed();
    stats.durations.push((stage, elapsed));

    tracing::info!(
        stage = stage.name(),
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        ok = result.is_ok(),
        "Stage finished"
    );
    result
}

fn count_blocks(blocks: &[BlockFeatures]) -> usize {
    blocks
        .iter()
        .filter_map(|block| match &block.block_id {
            FeatureValue::Categorical(id) => Some(id.as_str()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .len()
}
