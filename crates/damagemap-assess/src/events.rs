use damagemap_core::model::ExcludedBuilding;
use damagemap_core::reconcile::ReconcileStats;
use damagemap_core::report::{DamageSummary, Warning};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadGeometry,
    EstimateBounds,
    ProjectAll,
    PartitionBatches,
    ClassifyBatch,
    Aggregate,
    Done,
}

/// Notifications emitted while a tile is assessed. Batch indices are
/// 1-based.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Stage(Stage),
    Warning(&'a Warning),
    Excluded(&'a ExcludedBuilding),
    BatchStarted {
        index: usize,
        total: usize,
        size: usize,
    },
    BatchFinished {
        index: usize,
        total: usize,
        summary: &'a DamageSummary,
        stats: Option<&'a ReconcileStats>,
    },
    BatchFailed {
        index: usize,
        total: usize,
        error: &'a str,
    },
    Cancelled {
        remaining: usize,
    },
}

pub trait PipelineObserver {
    fn on_event(&mut self, event: &PipelineEvent<'_>);
}

impl<F: FnMut(&PipelineEvent<'_>)> PipelineObserver for F {
    fn on_event(&mut self, event: &PipelineEvent<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`, optionally reporting batch progress to a
/// callback as `(batch_index, batch_total)`.
#[derive(Default)]
pub struct TracingObserver {
    progress: Option<Box<dyn FnMut(usize, usize)>>,
}

impl TracingObserver {
    pub fn with_progress(progress: impl FnMut(usize, usize) + 'static) -> Self {
        Self {
            progress: Some(Box::new(progress)),
        }
    }
}

impl PipelineObserver for TracingObserver {
    fn on_event(&mut self, event: &PipelineEvent<'_>) {
        match event {
            PipelineEvent::Stage(stage) => tracing::debug!(?stage, "stage"),
            PipelineEvent::Warning(w) => warn!(code = %w.code, "{}", w.message),
            PipelineEvent::Excluded(ex) => {
                info!(uid = %ex.uid, "excluded: {}", ex.reason)
            }
            PipelineEvent::BatchStarted { index, total, size } => {
                info!(batch = index, total, size, "classifying batch")
            }
            PipelineEvent::BatchFinished {
                index,
                total,
                summary,
                ..
            } => {
                let counts: Vec<String> = summary.iter().map(|(k, v)| format!("{k}={v}")).collect();
                info!(batch = index, total, "batch results: {}", counts.join(", "));
                if let Some(progress) = self.progress.as_mut() {
                    progress(*index, *total);
                }
            }
            PipelineEvent::BatchFailed { index, total, error } => {
                warn!(batch = index, total, "batch failed: {error}")
            }
            PipelineEvent::Cancelled { remaining } => {
                warn!(remaining, "assessment cancelled")
            }
        }
    }
}

/// Cooperative cancellation, checked between batches only.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
