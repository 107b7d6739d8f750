//! Recorded-fixture sessions.
//!
//! A fixture is a JSON document of lookup and search responses keyed by the
//! exact query string. Unknown queries answer with an empty result.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use colocate_resolver::{
    AnchorFacts, ListingSource, LookupSource, RawListing, Session, SessionFactory, SourceError,
};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub lookups: HashMap<String, AnchorFacts>,
    #[serde(default)]
    pub searches: HashMap<String, Vec<RawListing>>,
}

#[derive(Debug, Clone, Default)]
pub struct ReplaySessionFactory {
    fixture: Arc<Fixture>,
}

impl ReplaySessionFactory {
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture: Arc::new(fixture),
        }
    }

    /// Load a fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid fixture.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&text)
            .with_context(|| format!("parsing fixture {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            lookups = fixture.lookups.len(),
            searches = fixture.searches.len(),
            "loaded replay fixture"
        );
        Ok(Self::new(fixture))
    }
}

#[async_trait]
impl SessionFactory for ReplaySessionFactory {
    type Session = ReplaySession;

    async fn open(&self, anchor_id: &str) -> Result<ReplaySession, SourceError> {
        tracing::debug!(anchor_id, "opening replay session");
        Ok(ReplaySession {
            fixture: Arc::clone(&self.fixture),
        })
    }
}

pub struct ReplaySession {
    fixture: Arc<Fixture>,
}

#[async_trait]
impl LookupSource for ReplaySession {
    async fn fetch_anchor_facts(&mut self, query: &str) -> Result<AnchorFacts, SourceError> {
        let facts = self.fixture.lookups.get(query).cloned();
        if facts.is_none() {
            tracing::debug!(query, "no recorded lookup");
        }
        Ok(facts.unwrap_or_default())
    }
}

#[async_trait]
impl ListingSource for ReplaySession {
    async fn search(&mut self, query: &str) -> Result<Vec<RawListing>, SourceError> {
        Ok(self.fixture.searches.get(query).cloned().unwrap_or_default())
    }
}

impl Session for ReplaySession {
    fn is_healthy(&self) -> bool {
        true
    }
}
