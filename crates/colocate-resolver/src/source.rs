//! Collaborator seams: where lookup data and listings come from, and where
//! results go.
//!
//! Implementations own all transport concerns (browser automation, HTTP,
//! recorded fixtures). The orchestrator only sees these traits.

use std::sync::Arc;

use async_trait::async_trait;
use colocate_core::ResolutionResult;
use serde::{Deserialize, Serialize};

use crate::error::{SinkError, SourceError};
use crate::facts::ReviewText;

/// Raw facts about one anchor as returned by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorFacts {
    /// Address as formatted by the lookup, if it returned one.
    #[serde(default)]
    pub raw_address: Option<String>,
    #[serde(default)]
    pub review_text: ReviewText,
    /// URL or state text that may embed a coordinate pair.
    #[serde(default)]
    pub raw_coordinate_blob: Option<String>,
}

/// One search hit as returned by a listing source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    pub name: String,
    #[serde(default)]
    pub raw_address: String,
    #[serde(default)]
    pub distance_text: Option<String>,
    #[serde(default)]
    pub rating_text: Option<String>,
}

#[async_trait]
pub trait LookupSource: Send {
    async fn fetch_anchor_facts(&mut self, query: &str) -> Result<AnchorFacts, SourceError>;
}

#[async_trait]
pub trait ListingSource: Send {
    async fn search(&mut self, query: &str) -> Result<Vec<RawListing>, SourceError>;
}

/// An exclusive, stateful connection to the data source. Owned by exactly
/// one unit of work at a time and released by dropping it.
pub trait Session: LookupSource + ListingSource {
    /// `false` once the session can no longer be trusted; the orchestrator
    /// then discards it and opens a fresh one.
    fn is_healthy(&self) -> bool;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Session;

    /// Open a new session for the unit resolving `anchor_id`.
    ///
    /// # Errors
    ///
    /// Returns `SourceError::SessionSetup` when no session can be created.
    async fn open(&self, anchor_id: &str) -> Result<Self::Session, SourceError>;
}

/// Destination for checkpoint and final snapshots. Persisting is
/// best-effort: the orchestrator logs failures and carries on.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(&self, results: &[ResolutionResult], label: &str) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: ResultSink + ?Sized> ResultSink for Arc<S> {
    async fn persist(&self, results: &[ResolutionResult], label: &str) -> Result<(), SinkError> {
        (**self).persist(results, label).await
    }
}
