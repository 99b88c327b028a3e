use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Run-level cancellation signal shared by every worker of a run
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Stage of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    Index,
    Relational,
    Blocks,
    Assemble,
}

impl Stage {
    pub const ALL: [Stage; 5] =
        [Stage::Normalize, Stage::Index, Stage::Relational, Stage::Blocks, Stage::Assemble];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Index => "index",
            Stage::Relational => "relational",
            Stage::Blocks => "blocks",
            Stage::Assemble => "assemble",
        }
    }
}

/// Progress information reported when a stage starts
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub stage: Stage,
    pub total: usize,
    pub message: String,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    /// Number of input records
    pub buildings: usize,

    /// Rows with every feature available
    pub ok: usize,

    /// Rows with at least one unavailable feature
    pub partial: usize,

    /// Rows whose geometry could not be normalized
    pub failed: usize,

    /// Geometries that needed self-intersection repair
    pub repaired: usize,

    /// Number of blocks, singletons included
    pub blocks: usize,

    /// Wall-clock time per stage
    #[serde(skip)]
    pub durations: Vec<(Stage, Duration)>,
}

impl RunStats {
    pub fn duration(&self, stage: Stage) -> Option<Duration> {
        self.durations.iter().find(|(s, _)| *s == stage).map(|(_, d)| *d)
    }

    pub fn total_duration(&self) -> Duration {
        self.durations.iter().map(|(_, d)| *d).sum()
    }
}
