//! Heuristic "same building" decision between an anchor address and a
//! candidate address.
//!
//! The resolver walks a fixed ladder of checks and stops at the first one
//! that fires. Every check compares the two sides the same way round, so the
//! verdict is symmetric in its arguments. Unresolved components never count
//! as agreeing with anything.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use colocate_core::{AddressComponents, UNKNOWN};
use regex::Regex;

use crate::address::{strip_non_printable, AddressParser};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid number regex"));
static STREET_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z]+\s+(?:street|st|avenue|ave|road|rd|drive|dr|blvd|boulevard))\b")
        .expect("valid street name regex")
});

const INSIDE_MARKERS: &[&str] = &["inside", "ste", "suite", "kiosk", "local"];

/// Which rule decided a [`Verdict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    ExactMatch,
    ZipAndCity,
    ZipAndTerritory,
    ZipAndHostBrand,
    StreetNumber,
    TerritoryRoadMarkers,
    NoMatch,
}

impl Evidence {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Evidence::ExactMatch => "exact_match",
            Evidence::ZipAndCity => "zip_and_city",
            Evidence::ZipAndTerritory => "zip_and_territory",
            Evidence::ZipAndHostBrand => "zip_and_host_brand",
            Evidence::StreetNumber => "street_number",
            Evidence::TerritoryRoadMarkers => "territory_road_markers",
            Evidence::NoMatch => "no_match",
        }
    }
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub same: bool,
    pub evidence: Evidence,
}

impl Verdict {
    fn matched(evidence: Evidence) -> Self {
        Self {
            same: true,
            evidence,
        }
    }

    fn no_match() -> Self {
        Self {
            same: false,
            evidence: Evidence::NoMatch,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SameLocationResolver {
    parser: AddressParser,
    host_brand: String,
}

impl SameLocationResolver {
    /// `host_brand` is the anchor retailer's name token, e.g. `"Walmart"`.
    #[must_use]
    pub fn new(parser: AddressParser, host_brand: &str) -> Self {
        Self {
            parser,
            host_brand: host_brand.trim().to_lowercase(),
        }
    }

    #[must_use]
    pub fn parser(&self) -> &AddressParser {
        &self.parser
    }

    /// Decide whether `anchor` and `candidate` plausibly name the same
    /// building.
    #[must_use]
    pub fn resolve(&self, anchor: &str, candidate: &str) -> Verdict {
        let verdict = self.decide(anchor, candidate);
        tracing::debug!(
            anchor,
            candidate,
            same = verdict.same,
            evidence = %verdict.evidence,
            "same-location verdict"
        );
        verdict
    }

    fn decide(&self, anchor: &str, candidate: &str) -> Verdict {
        let a = normalize(anchor);
        let b = normalize(candidate);
        if is_blank(&a) || is_blank(&b) {
            return Verdict::no_match();
        }
        if a == b {
            return Verdict::matched(Evidence::ExactMatch);
        }

        let ca = self.parser.parse(anchor);
        let cb = self.parser.parse(candidate);
        let zip_match = zips_match(&ca, &cb);
        let city_match = cities_match(&ca, &cb);

        if zip_match {
            if city_match {
                return Verdict::matched(Evidence::ZipAndCity);
            }
            if ca.territory.is_some() && ca.territory == cb.territory {
                return Verdict::matched(Evidence::ZipAndTerritory);
            }
            if self.mentions_host(&a) || self.mentions_host(&b) {
                return Verdict::matched(Evidence::ZipAndHostBrand);
            }
        }

        let street_match = ca.street_number.is_some() && ca.street_number == cb.street_number;
        if street_match && (zip_match || city_match) {
            return Verdict::matched(Evidence::StreetNumber);
        }

        if (zip_match || city_match) && self.parser.share_road_markers(&a, &b) {
            return Verdict::matched(Evidence::TerritoryRoadMarkers);
        }

        Verdict::no_match()
    }

    fn mentions_host(&self, normalized: &str) -> bool {
        !self.host_brand.is_empty() && normalized.contains(&self.host_brand)
    }

    /// Whether a candidate address places it inside the host retailer
    /// (`"Walmart Supercenter Ste 5"`, `"Kiosk inside Walmart"`).
    #[must_use]
    pub fn inside_host(&self, candidate_address: &str) -> bool {
        let lower = normalize(candidate_address);
        self.mentions_host(&lower)
            && lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| INSIDE_MARKERS.contains(&token))
    }
}

fn is_blank(normalized: &str) -> bool {
    normalized.is_empty() || normalized.eq_ignore_ascii_case(UNKNOWN)
}

fn normalize(raw: &str) -> String {
    strip_non_printable(raw).to_lowercase()
}

fn zips_match(a: &AddressComponents, b: &AddressComponents) -> bool {
    matches!((a.zip5(), b.zip5()), (Some(x), Some(y)) if x == y)
}

fn cities_match(a: &AddressComponents, b: &AddressComponents) -> bool {
    let (Some(x), Some(y)) = (a.city.as_deref(), b.city.as_deref()) else {
        return false;
    };
    let x = x.trim().to_lowercase();
    let y = y.trim().to_lowercase();
    if x.is_empty() || y.is_empty() {
        return false;
    }
    x == y || x.contains(&y) || y.contains(&x)
}

/// Loose plausibility check between an input address and the address a
/// lookup returned for it. Fails only on positive evidence of disagreement:
/// both sides carry numbers and share none, or both name streets and share
/// none.
#[must_use]
pub fn plausibly_same_address(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return true;
    }

    let numbers = |s: &str| -> HashSet<String> {
        NUMBER_RE
            .find_iter(s)
            .map(|m| m.as_str().to_string())
            .collect()
    };
    let streets = |s: &str| -> HashSet<String> {
        STREET_NAME_RE
            .captures_iter(s)
            .map(|caps| caps[1].split_whitespace().collect::<Vec<_>>().join(" "))
            .collect()
    };

    let (na, nb) = (numbers(&a), numbers(&b));
    if !na.is_empty() && !nb.is_empty() && na.is_disjoint(&nb) {
        return false;
    }

    let (sa, sb) = (streets(&a), streets(&b));
    if !sa.is_empty()
        && !sb.is_empty()
        && !sa.iter().any(|s| b.contains(s.as_str()))
        && !sb.iter().any(|s| a.contains(s.as_str()))
    {
        return false;
    }

    true
}

#[cfg(test)]
#[path = "same_location_test.rs"]
mod tests;
