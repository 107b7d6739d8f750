//! Best-effort numeric facts from inconsistently formatted text.
//!
//! Review counts arrive as `"11,958 reviews"`, `"11.958 reseñas"`,
//! `"(11,958)"` or buried in a serialized page-state blob. Several
//! independent strategies each get a chance; whichever succeed are then
//! reconciled by a [`ReconcilePolicy`]. Coordinates and distances follow the
//! same "several patterns, first match wins" approach.

use std::sync::LazyLock;

use colocate_core::Coordinate;
use regex::Regex;
use serde::{Deserialize, Serialize};

static LABELED_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.,]+)\s*(?:reviews?|reseñas?|opiniones|avis)\b")
        .expect("valid labeled count regex")
});
static PARENTHESIZED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*([\d.,]+)\s*\)").expect("valid parenthesized regex"));
static BARE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d.,]*").expect("valid bare number regex"));
static STATE_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)"?(?:review_?count|user_?rating_?count|reviews_?total)"?\s*[:=]\s*"?([\d.,]+)"#,
    )
    .expect("valid state count regex")
});

static COORDINATE_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("at_sign", r"@(-?\d+\.\d+),(-?\d+\.\d+)"),
        ("ll_param", r"[?&]ll=(-?\d+\.\d+),(-?\d+\.\d+)"),
        ("q_param", r"[?&]q=(-?\d+\.\d+),(-?\d+\.\d+)"),
        ("data_param", r"!3d(-?\d+\.\d+)!4d(-?\d+\.\d+)"),
        ("state_blob", r#""(-?\d+\.\d+),\s*(-?\d+\.\d+)""#),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("valid coordinate regex")))
    .collect()
});

static DISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(mi|km|ft|m)\b").expect("valid distance regex")
});

const METERS_PER_MILE: f64 = 1609.34;
const METERS_PER_FOOT: f64 = 0.3048;

// ---------------------------------------------------------------------------
// Count normalization
// ---------------------------------------------------------------------------

/// Turn a matched numeric string into an integer, resolving locale-ambiguous
/// separators.
///
/// With exactly one separator kind (`.` or `,`) and a trailing group of
/// exactly three digits, the separator is a thousands mark and is removed.
/// In every other case all separators are stripped.
///
/// ```
/// use colocate_resolver::facts::normalize_count;
/// assert_eq!(normalize_count("11,958"), Some(11958));
/// assert_eq!(normalize_count("11.958"), Some(11958));
/// assert_eq!(normalize_count("12"), Some(12));
/// ```
#[must_use]
pub fn normalize_count(raw: &str) -> Option<u64> {
    let trimmed = raw.trim().trim_matches(|c| c == '.' || c == ',');
    if trimmed.is_empty() {
        return None;
    }

    let has_dot = trimmed.contains('.');
    let has_comma = trimmed.contains(',');

    let digits: String = match (has_dot, has_comma) {
        (true, false) | (false, true) => {
            let sep = if has_dot { '.' } else { ',' };
            let trailing = trimmed.rsplit(sep).next().unwrap_or_default();
            if trailing.len() == 3 {
                trimmed.split(sep).collect()
            } else {
                trimmed.chars().filter(char::is_ascii_digit).collect()
            }
        }
        _ => trimmed.chars().filter(char::is_ascii_digit).collect(),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Extract a count from a single text fragment such as `"(11,958)"`,
/// `"4.5 stars 1,204 reviews"` or `"12"`.
///
/// Tries a labeled count, then a parenthesized count, then a bare number.
#[must_use]
pub fn extract_count(text: &str) -> Option<u64> {
    labeled_count(text)
        .or_else(|| parenthesized_count(text))
        .or_else(|| {
            BARE_NUMBER_RE
                .find(text)
                .and_then(|m| normalize_count(m.as_str()))
        })
}

fn labeled_count(text: &str) -> Option<u64> {
    LABELED_COUNT_RE
        .captures_iter(text)
        .filter_map(|caps| normalize_count(&caps[1]))
        .max()
}

fn parenthesized_count(text: &str) -> Option<u64> {
    PARENTHESIZED_RE
        .captures_iter(text)
        .filter_map(|caps| normalize_count(&caps[1]))
        .max()
}

fn state_blob_count(text: &str) -> Option<u64> {
    STATE_COUNT_RE
        .captures_iter(text)
        .filter_map(|caps| normalize_count(&caps[1]))
        .max()
}

// ---------------------------------------------------------------------------
// Review count strategies
// ---------------------------------------------------------------------------

/// Raw review-count evidence captured by a lookup source. Every field is
/// optional; absent fields simply make their strategy fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewText {
    /// Text of the element that labels the count, e.g. `"(11.958)"`.
    pub labeled_count: Option<String>,
    /// Accessible-label attribute text, e.g. `"11.958 reseñas"`.
    pub accessible_label: Option<String>,
    /// Visible panel text that may contain parenthesized numbers.
    pub panel_text: Option<String>,
    /// Serialized page/application state.
    pub state_blob: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    LabeledElement,
    AccessibleLabel,
    ParenthesizedScan,
    StateBlob,
}

impl CountStrategy {
    /// All strategies in priority order.
    pub const ALL: [CountStrategy; 4] = [
        CountStrategy::LabeledElement,
        CountStrategy::AccessibleLabel,
        CountStrategy::ParenthesizedScan,
        CountStrategy::StateBlob,
    ];

    fn run(self, text: &ReviewText) -> Option<u64> {
        match self {
            CountStrategy::LabeledElement => text.labeled_count.as_deref().and_then(extract_count),
            CountStrategy::AccessibleLabel => {
                text.accessible_label.as_deref().and_then(labeled_count)
            }
            CountStrategy::ParenthesizedScan => {
                text.panel_text.as_deref().and_then(parenthesized_count)
            }
            CountStrategy::StateBlob => text.state_blob.as_deref().and_then(state_blob_count),
        }
    }
}

/// How to combine the values produced by several successful strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePolicy {
    /// Largest value wins. Truncated captures under-count, so the maximum is
    /// usually closest; the price is occasional over-counting.
    #[default]
    Maximum,
    /// The first strategy in priority order that produced a value wins.
    HighestPriority,
}

/// Runs every count strategy and reconciles the survivors.
#[derive(Debug, Clone, Default)]
pub struct CountExtractor {
    policy: ReconcilePolicy,
}

impl CountExtractor {
    #[must_use]
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self { policy }
    }

    /// Best-effort review count; `0` when no strategy succeeds.
    #[must_use]
    pub fn review_count(&self, text: &ReviewText) -> u64 {
        let hits: Vec<(CountStrategy, u64)> = CountStrategy::ALL
            .iter()
            .filter_map(|s| s.run(text).map(|v| (*s, v)))
            .collect();

        let chosen = match self.policy {
            ReconcilePolicy::Maximum => hits.iter().map(|(_, v)| *v).max(),
            ReconcilePolicy::HighestPriority => hits.first().map(|(_, v)| *v),
        };

        match chosen {
            Some(count) => {
                tracing::debug!(?hits, count, policy = ?self.policy, "review count reconciled");
                count
            }
            None => {
                tracing::debug!("no review count strategy matched");
                0
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinates and distance
// ---------------------------------------------------------------------------

/// Extract a decimal-degree pair from URL-like or state-blob text.
///
/// Patterns are tried in a fixed order; the first in-range match wins.
#[must_use]
pub fn extract_coordinate(text: &str) -> Option<Coordinate> {
    COORDINATE_PATTERNS.iter().find_map(|(name, re)| {
        re.captures_iter(text).find_map(|caps| {
            let lat = caps[1].parse::<f64>().ok()?;
            let lng = caps[2].parse::<f64>().ok()?;
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
                tracing::trace!(pattern = name, lat, lng, "coordinate matched");
                Some(Coordinate { lat, lng })
            } else {
                None
            }
        })
    })
}

/// Convert a listing's distance text (`"0.1 mi"`, `"150 m"`, `"1,2 km"`,
/// `"300 ft"`) to meters.
#[must_use]
pub fn parse_distance_meters(text: &str) -> Option<f64> {
    let caps = DISTANCE_RE.captures(text)?;
    let value = caps[1].replace(',', ".").parse::<f64>().ok()?;
    let meters = match caps[2].to_lowercase().as_str() {
        "mi" => value * METERS_PER_MILE,
        "km" => value * 1000.0,
        "ft" => value * METERS_PER_FOOT,
        _ => value,
    };
    Some(meters)
}

#[cfg(test)]
#[path = "facts_test.rs"]
mod tests;
