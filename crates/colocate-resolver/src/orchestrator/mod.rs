//! Concurrent resolution of many anchors.
//!
//! Anchors are fanned out over a bounded pool (`buffer_unordered`); each unit
//! owns its own session and retries on transient failures without affecting
//! its siblings. Results are gathered in completion order, snapshotted to the
//! sink every `checkpoint_every` completions, and finally re-keyed by anchor
//! id so the output order never depends on scheduling.

mod evaluate;
mod unit;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use colocate_core::{AnchorLocation, AppConfig, CategoryLexicon, FailSafe, ResolutionResult};
use futures::stream::{self, StreamExt};
use tracing::Instrument;
use uuid::Uuid;

pub use evaluate::{AnchorFindings, Evaluator};
pub use unit::UnitState;

use crate::facts::ReconcilePolicy;
use crate::queries::QueryPlanner;
use crate::retry::RetryPolicy;
use crate::source::{ResultSink, SessionFactory};

/// Label of the snapshot written once every anchor has completed.
pub const FINAL_LABEL: &str = "final";

/// Label of the intermediate snapshot, overwritten every K completions.
/// It is a superset of any prior results that were carried forward, so a
/// crashed run resumes from it.
pub const CHECKPOINT_LABEL: &str = "checkpoint";

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub host_brand: String,
    pub workers: usize,
    pub retry: RetryPolicy,
    pub source_timeout: Duration,
    /// Snapshot every K completions; `0` writes only the final snapshot.
    pub checkpoint_every: usize,
    pub min_reviews: u64,
    pub skip_search_below_min_reviews: bool,
    pub search_radius_meters: f64,
    pub fail_safe: FailSafe,
    pub count_policy: ReconcilePolicy,
}

impl OrchestratorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            host_brand: config.host_brand.clone(),
            workers: config.workers.max(1),
            retry: RetryPolicy::new(config.max_attempts, config.retry_backoff_base_ms),
            source_timeout: config.source_timeout(),
            checkpoint_every: config.checkpoint_every,
            min_reviews: config.min_reviews,
            skip_search_below_min_reviews: config.skip_search_below_min_reviews,
            search_radius_meters: config.search_radius_meters,
            fail_safe: config.fail_safe,
            count_policy: ReconcilePolicy::default(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            host_brand: "Walmart".to_string(),
            workers: 8,
            retry: RetryPolicy::default(),
            source_timeout: Duration::from_secs(45),
            checkpoint_every: 5,
            min_reviews: 10_000,
            skip_search_below_min_reviews: false,
            search_radius_meters: 200.0,
            fail_safe: FailSafe::default(),
            count_policy: ReconcilePolicy::default(),
        }
    }
}

/// Outcome of one [`Orchestrator::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// One result per distinct input anchor, ordered by anchor id.
    pub results: Vec<ResolutionResult>,
    pub resolved: usize,
    pub failed: usize,
    pub carried_forward: usize,
    pub checkpoints_written: usize,
}

pub struct Orchestrator<F: SessionFactory> {
    factory: F,
    planner: QueryPlanner,
    evaluator: Evaluator,
    config: OrchestratorConfig,
}

impl<F: SessionFactory> Orchestrator<F> {
    #[must_use]
    pub fn new(factory: F, lexicon: &CategoryLexicon, config: OrchestratorConfig) -> Self {
        Self {
            planner: QueryPlanner::new(&config.host_brand, lexicon),
            evaluator: Evaluator::new(
                lexicon,
                &config.host_brand,
                config.search_radius_meters,
                config.count_policy,
            ),
            factory,
            config,
        }
    }

    /// Resolve every anchor, carrying forward successful `prior` results.
    ///
    /// Never fails as a whole: per-anchor failures are recorded on their
    /// results and sink failures are logged.
    pub async fn run(
        &self,
        anchors: Vec<AnchorLocation>,
        prior: Vec<ResolutionResult>,
        sink: &dyn ResultSink,
    ) -> RunReport {
        let run_id = Uuid::new_v4();
        let anchors = dedupe_anchors(anchors);

        let mut prior_ok: BTreeMap<String, ResolutionResult> = prior
            .into_iter()
            .filter(ResolutionResult::succeeded)
            .map(|r| (r.anchor_id.clone(), r))
            .collect();

        let mut results: BTreeMap<String, ResolutionResult> = BTreeMap::new();
        let mut pending = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            match prior_ok.remove(&anchor.id) {
                Some(done) => {
                    results.insert(anchor.id.clone(), done);
                }
                None => pending.push(anchor),
            }
        }
        let carried_forward = results.len();
        let total = pending.len();

        tracing::info!(
            %run_id,
            pending = total,
            carried_forward,
            workers = self.config.workers,
            "starting resolution run"
        );

        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut checkpoints_written = 0usize;

        let workers = self.config.workers.max(1);
        let slots = WorkerSlots::new(workers);
        let mut units = stream::iter(pending)
            .map(|anchor| {
                let slots = &slots;
                async move {
                    let worker = slots.acquire();
                    let span = tracing::info_span!("unit", anchor_id = %anchor.id, worker);
                    let result = self.resolve_unit(anchor, run_id).instrument(span).await;
                    slots.release(worker);
                    result
                }
            })
            .buffer_unordered(workers);

        while let Some(result) = units.next().await {
            completed += 1;
            if !result.succeeded() {
                failed += 1;
            }
            tracing::info!(
                anchor_id = %result.anchor_id,
                completed,
                total,
                succeeded = result.succeeded(),
                "unit completed"
            );
            results.insert(result.anchor_id.clone(), result);

            let every = self.config.checkpoint_every;
            if every > 0 && completed % every == 0 && completed < total {
                if persist(sink, &results, CHECKPOINT_LABEL).await {
                    checkpoints_written += 1;
                }
            }
        }

        persist(sink, &results, FINAL_LABEL).await;

        tracing::info!(
            %run_id,
            resolved = completed - failed,
            failed,
            carried_forward,
            "resolution run finished"
        );

        RunReport {
            run_id,
            results: results.into_values().collect(),
            resolved: completed - failed,
            failed,
            carried_forward,
            checkpoints_written,
        }
    }
}

/// Best-effort snapshot. Returns whether the sink accepted it.
async fn persist(
    sink: &dyn ResultSink,
    results: &BTreeMap<String, ResolutionResult>,
    label: &str,
) -> bool {
    let snapshot: Vec<ResolutionResult> = results.values().cloned().collect();
    match sink.persist(&snapshot, label).await {
        Ok(()) => {
            tracing::info!(label, count = snapshot.len(), "snapshot persisted");
            true
        }
        Err(e) => {
            tracing::warn!(label, error = %e, "failed to persist snapshot");
            false
        }
    }
}

fn dedupe_anchors(anchors: Vec<AnchorLocation>) -> Vec<AnchorLocation> {
    let mut seen = HashSet::with_capacity(anchors.len());
    anchors
        .into_iter()
        .filter(|a| {
            let fresh = seen.insert(a.id.clone());
            if !fresh {
                tracing::warn!(anchor_id = %a.id, "duplicate anchor id in input, keeping first");
            }
            fresh
        })
        .collect()
}

/// Free list of worker ids. At most `workers` units are in flight at once, so
/// every unit finds a free id for the span it runs under.
struct WorkerSlots {
    free: Mutex<Vec<usize>>,
}

impl WorkerSlots {
    fn new(workers: usize) -> Self {
        Self {
            free: Mutex::new((0..workers).rev().collect()),
        }
    }

    fn acquire(&self) -> usize {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default()
    }

    fn release(&self, worker: usize) {
        self.free
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(worker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_slots_hand_out_distinct_ids_and_reuse_them() {
        let slots = WorkerSlots::new(3);
        let taken = [slots.acquire(), slots.acquire(), slots.acquire()];
        assert_eq!(taken, [0, 1, 2]);

        slots.release(1);
        assert_eq!(slots.acquire(), 1);
    }

    #[test]
    fn duplicate_anchor_ids_keep_first() {
        let anchors = vec![
            AnchorLocation::new("1", "100 Main St"),
            AnchorLocation::new("2", "200 Oak Ave"),
            AnchorLocation::new("1", "999 Elsewhere Rd"),
        ];
        let kept = dedupe_anchors(anchors);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].raw_address, "100 Main St");
    }
}
