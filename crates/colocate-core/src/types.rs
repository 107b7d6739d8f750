//! Domain records shared by the resolver and the persistence sink.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel recorded for any address field that could not be resolved.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// The known reference location being evaluated (a retail store).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorLocation {
    pub id: String,
    pub raw_address: String,
    #[serde(default = "unknown")]
    pub resolved_city: String,
    #[serde(default = "unknown")]
    pub resolved_zip: String,
    #[serde(default)]
    pub coordinate: Option<Coordinate>,
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

impl AnchorLocation {
    #[must_use]
    pub fn new(id: impl Into<String>, raw_address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw_address: raw_address.into(),
            resolved_city: unknown(),
            resolved_zip: unknown(),
            coordinate: None,
        }
    }
}

/// Structured pieces of a free-text address. `None` means unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    pub street_number: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    /// Postal code of the territory mentioned in the address, e.g. `"PR"`.
    pub territory: Option<String>,
}

impl AddressComponents {
    #[must_use]
    pub fn city_or_unknown(&self) -> &str {
        self.city.as_deref().unwrap_or(UNKNOWN)
    }

    #[must_use]
    pub fn zip_or_unknown(&self) -> &str {
        self.zip.as_deref().unwrap_or(UNKNOWN)
    }

    /// The five-digit portion of the zip, ignoring any `+4` extension.
    #[must_use]
    pub fn zip5(&self) -> Option<&str> {
        self.zip.as_deref().map(|z| z.get(..5).unwrap_or(z))
    }
}

/// An unverified business listing discovered while searching near an anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateListing {
    pub name: String,
    pub raw_address: String,
    pub distance_text: Option<String>,
    pub rating_count_text: Option<String>,
    /// The search query that surfaced this listing.
    pub source_query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_target_category: bool,
    /// `None` exactly when `is_target_category` is `false`.
    pub confidence: Option<Confidence>,
    pub matched_keywords: BTreeSet<String>,
    pub is_known_brand: bool,
}

impl ClassificationResult {
    #[must_use]
    pub fn no_match() -> Self {
        Self {
            is_target_category: false,
            confidence: None,
            matched_keywords: BTreeSet::new(),
            is_known_brand: false,
        }
    }
}

/// A candidate that passed both the category and the proximity checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedCandidate {
    pub name: String,
    pub address: String,
    pub source_query: String,
    pub distance_meters: Option<f64>,
    pub same_location: bool,
    /// Short label of the rule that decided `same_location`.
    pub evidence: String,
    pub confidence: Confidence,
    pub matched_keywords: BTreeSet<String>,
    pub is_known_brand: bool,
}

/// The outcome of resolving one anchor in one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub run_id: Uuid,
    pub anchor_id: String,
    pub raw_address: String,
    pub formatted_address: Option<String>,
    pub resolved_city: String,
    pub resolved_zip: String,
    pub coordinate: Option<Coordinate>,
    pub review_count: u64,
    pub meets_review_threshold: bool,
    pub has_category_match_nearby: bool,
    pub matched_candidates: Vec<MatchedCandidate>,
    pub qualifies: bool,
    pub address_mismatch: bool,
    pub search_skipped: bool,
    pub attempts: u32,
    pub queries_run: Vec<String>,
    pub failure_reason: Option<String>,
    pub resolved_at: DateTime<Utc>,
}

impl ResolutionResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure_reason.is_none()
    }
}
