//! One unit of work: resolve a single anchor, with retries.

use std::fmt;
use std::future::Future;

use chrono::Utc;
use colocate_core::{AnchorLocation, ResolutionResult};
use uuid::Uuid;

use super::Orchestrator;
use crate::error::SourceError;
use crate::source::{ListingSource, LookupSource, Session, SessionFactory};

/// Lifecycle of a unit, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    Pending,
    InProgress,
    Succeeded,
    FailedTransient,
    FailedPermanent,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitState::Pending => "pending",
            UnitState::InProgress => "in_progress",
            UnitState::Succeeded => "succeeded",
            UnitState::FailedTransient => "failed_transient",
            UnitState::FailedPermanent => "failed_permanent",
        };
        f.write_str(label)
    }
}

fn transition(anchor_id: &str, attempt: u32, state: UnitState) {
    tracing::debug!(anchor_id, attempt, %state, "unit state");
}

impl<F: SessionFactory> Orchestrator<F> {
    /// Resolve one anchor to completion. Never fails: exhausted or permanent
    /// errors are recorded on the returned result.
    pub(super) async fn resolve_unit(
        &self,
        anchor: AnchorLocation,
        run_id: Uuid,
    ) -> ResolutionResult {
        transition(&anchor.id, 0, UnitState::Pending);

        let retry = self.config.retry;
        let mut session: Option<F::Session> = None;
        let mut queries_run = Vec::new();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            transition(&anchor.id, attempt, UnitState::InProgress);

            let outcome = match self.acquire(&mut session, &anchor.id).await {
                Ok(mut live) => {
                    let outcome = self
                        .attempt(&mut live, &anchor, attempt, run_id, &mut queries_run)
                        .await;
                    let keep = match &outcome {
                        Ok(_) => true,
                        Err(err) => !err.poisons_session(),
                    };
                    if keep {
                        session = Some(live);
                    }
                    outcome
                }
                Err(err) => Err(err),
            };

            let err = match outcome {
                Ok(result) => {
                    transition(&anchor.id, attempt, UnitState::Succeeded);
                    return result;
                }
                Err(err) => err,
            };

            if retry.should_retry(attempt, &err) {
                transition(&anchor.id, attempt, UnitState::FailedTransient);
                let delay = retry.delay_after(attempt, &err);
                tracing::warn!(
                    anchor_id = %anchor.id,
                    attempt,
                    max_attempts = retry.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient source error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            transition(&anchor.id, attempt, UnitState::FailedPermanent);
            tracing::error!(
                anchor_id = %anchor.id,
                attempts = attempt,
                error = %err,
                "anchor resolution failed permanently"
            );
            return self.failed_result(&anchor, run_id, attempt, queries_run, &err);
        }
    }

    /// Reuse the held session if it is still healthy, otherwise replace it.
    async fn acquire(
        &self,
        held: &mut Option<F::Session>,
        anchor_id: &str,
    ) -> Result<F::Session, SourceError> {
        if let Some(session) = held.take() {
            if session.is_healthy() {
                return Ok(session);
            }
            tracing::debug!(anchor_id, "discarding unhealthy session");
        }
        self.bounded(self.factory.open(anchor_id)).await
    }

    /// Run `call` under the configured source timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        tokio::time::timeout(self.config.source_timeout, call)
            .await
            .map_err(|_| SourceError::Timeout {
                secs: self.config.source_timeout.as_secs(),
            })?
    }

    async fn attempt(
        &self,
        session: &mut F::Session,
        anchor: &AnchorLocation,
        attempt: u32,
        run_id: Uuid,
        queries_run: &mut Vec<String>,
    ) -> Result<ResolutionResult, SourceError> {
        let lookup_query = self.planner.lookup_query(anchor, attempt);
        queries_run.push(lookup_query.clone());
        let facts = self
            .bounded(session.fetch_anchor_facts(&lookup_query))
            .await?;
        let findings = self.evaluator.anchor_findings(anchor, &facts);
        let meets_review_threshold = findings.review_count >= self.config.min_reviews;

        let search_skipped = self.config.skip_search_below_min_reviews && !meets_review_threshold;
        let mut raw = Vec::new();
        if search_skipped {
            tracing::info!(
                anchor_id = %anchor.id,
                review_count = findings.review_count,
                min_reviews = self.config.min_reviews,
                "below review threshold, skipping listing searches"
            );
        } else {
            for query in self.planner.listing_queries(anchor) {
                queries_run.push(query.clone());
                let listings = self.bounded(session.search(&query)).await?;
                tracing::debug!(
                    anchor_id = %anchor.id,
                    query = %query,
                    found = listings.len(),
                    "listing search"
                );
                raw.extend(listings.into_iter().map(|l| (query.clone(), l)));
            }
        }

        let matched_candidates = self.evaluator.match_candidates(anchor, raw);
        let has_category_match_nearby = !matched_candidates.is_empty();
        let qualifies = meets_review_threshold && !has_category_match_nearby;

        tracing::info!(
            anchor_id = %anchor.id,
            attempt,
            review_count = findings.review_count,
            has_category_match_nearby,
            qualifies,
            "anchor resolved"
        );

        Ok(ResolutionResult {
            run_id,
            anchor_id: anchor.id.clone(),
            raw_address: anchor.raw_address.clone(),
            formatted_address: findings.formatted_address,
            resolved_city: findings.resolved_city,
            resolved_zip: findings.resolved_zip,
            coordinate: findings.coordinate,
            review_count: findings.review_count,
            meets_review_threshold,
            has_category_match_nearby,
            matched_candidates,
            qualifies,
            address_mismatch: findings.address_mismatch,
            search_skipped,
            attempts: attempt,
            queries_run: queries_run.clone(),
            failure_reason: None,
            resolved_at: Utc::now(),
        })
    }

    fn failed_result(
        &self,
        anchor: &AnchorLocation,
        run_id: Uuid,
        attempts: u32,
        queries_run: Vec<String>,
        err: &SourceError,
    ) -> ResolutionResult {
        let (resolved_city, resolved_zip) = self.evaluator.locate(anchor);
        ResolutionResult {
            run_id,
            anchor_id: anchor.id.clone(),
            raw_address: anchor.raw_address.clone(),
            formatted_address: None,
            resolved_city,
            resolved_zip,
            coordinate: anchor.coordinate,
            review_count: 0,
            meets_review_threshold: false,
            has_category_match_nearby: self.config.fail_safe.assumed_match(),
            matched_candidates: Vec::new(),
            qualifies: false,
            address_mismatch: false,
            search_skipped: false,
            attempts,
            queries_run,
            failure_reason: Some(err.to_string()),
            resolved_at: Utc::now(),
        }
    }
}
