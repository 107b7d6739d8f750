//! Pure per-anchor evaluation: raw source output in, normalized findings and
//! matched candidates out. No I/O happens here.

use colocate_core::{
    AddressComponents, AnchorLocation, CandidateListing, CategoryLexicon, Coordinate,
    MatchedCandidate, UNKNOWN,
};

use crate::address::{strip_non_printable, AddressParser};
use crate::classify::Classifier;
use crate::dedup::dedupe_listings;
use crate::facts::{extract_coordinate, parse_distance_meters, CountExtractor, ReconcilePolicy};
use crate::same_location::{plausibly_same_address, SameLocationResolver};
use crate::source::{AnchorFacts, RawListing};

/// A candidate within this many radii of the anchor counts as nearby.
const RADIUS_ALLOWANCE: f64 = 1.5;

/// What the lookup told us about the anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorFindings {
    pub formatted_address: Option<String>,
    pub resolved_city: String,
    pub resolved_zip: String,
    pub coordinate: Option<Coordinate>,
    pub review_count: u64,
    pub address_mismatch: bool,
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    resolver: SameLocationResolver,
    classifier: Classifier,
    counts: CountExtractor,
    search_radius_meters: f64,
}

impl Evaluator {
    #[must_use]
    pub fn new(
        lexicon: &CategoryLexicon,
        host_brand: &str,
        search_radius_meters: f64,
        count_policy: ReconcilePolicy,
    ) -> Self {
        Self {
            resolver: SameLocationResolver::new(AddressParser::new(lexicon), host_brand),
            classifier: Classifier::new(lexicon),
            counts: CountExtractor::new(count_policy),
            search_radius_meters,
        }
    }

    #[must_use]
    pub fn parser(&self) -> &AddressParser {
        self.resolver.parser()
    }

    /// City and zip for `anchor` from its own address, falling back to
    /// whatever the input already carried.
    #[must_use]
    pub fn locate(&self, anchor: &AnchorLocation) -> (String, String) {
        let comps = self.parser().parse(&anchor.raw_address);
        (
            comps.city.unwrap_or_else(|| anchor.resolved_city.clone()),
            comps.zip.unwrap_or_else(|| anchor.resolved_zip.clone()),
        )
    }

    #[must_use]
    pub fn anchor_findings(&self, anchor: &AnchorLocation, facts: &AnchorFacts) -> AnchorFindings {
        let formatted_address = facts
            .raw_address
            .as_deref()
            .map(strip_non_printable)
            .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case(UNKNOWN));

        let from_lookup = formatted_address
            .as_deref()
            .map(|a| self.parser().parse(a))
            .unwrap_or_default();
        let from_input = self.parser().parse(&anchor.raw_address);
        let merged = AddressComponents {
            street_number: from_lookup.street_number.or(from_input.street_number),
            city: from_lookup.city.or(from_input.city),
            zip: from_lookup.zip.or(from_input.zip),
            territory: from_lookup.territory.or(from_input.territory),
        };

        let resolved_city = merged
            .city
            .clone()
            .unwrap_or_else(|| anchor.resolved_city.clone());
        let resolved_zip = merged
            .zip
            .clone()
            .unwrap_or_else(|| anchor.resolved_zip.clone());

        let coordinate = facts
            .raw_coordinate_blob
            .as_deref()
            .and_then(extract_coordinate)
            .or(anchor.coordinate);

        let address_mismatch = formatted_address
            .as_deref()
            .is_some_and(|f| !plausibly_same_address(&anchor.raw_address, f));
        if address_mismatch {
            tracing::warn!(
                anchor_id = %anchor.id,
                input = %anchor.raw_address,
                lookup = formatted_address.as_deref().unwrap_or_default(),
                "lookup returned a different-looking address"
            );
        }

        AnchorFindings {
            review_count: self.counts.review_count(&facts.review_text),
            formatted_address,
            resolved_city,
            resolved_zip,
            coordinate,
            address_mismatch,
        }
    }

    /// Turn raw listings from every query into deduplicated candidates and
    /// keep those that are both target-category and co-located or nearby.
    #[must_use]
    pub fn match_candidates(
        &self,
        anchor: &AnchorLocation,
        raw: Vec<(String, RawListing)>,
    ) -> Vec<MatchedCandidate> {
        let candidates = dedupe_listings(
            raw.into_iter()
                .map(|(query, listing)| CandidateListing {
                    name: strip_non_printable(&listing.name),
                    raw_address: strip_non_printable(&listing.raw_address),
                    distance_text: listing.distance_text,
                    rating_count_text: listing.rating_text,
                    source_query: query,
                })
                .filter(|c| !c.name.is_empty())
                .collect(),
        );

        candidates
            .into_iter()
            .filter_map(|candidate| self.match_one(anchor, candidate))
            .collect()
    }

    fn match_one(
        &self,
        anchor: &AnchorLocation,
        candidate: CandidateListing,
    ) -> Option<MatchedCandidate> {
        let verdict = self
            .resolver
            .resolve(&anchor.raw_address, &candidate.raw_address);
        let inside = self.resolver.inside_host(&candidate.raw_address);
        let distance_meters = candidate
            .distance_text
            .as_deref()
            .and_then(parse_distance_meters);
        let nearby =
            distance_meters.is_some_and(|d| d <= self.search_radius_meters * RADIUS_ALLOWANCE);

        let class = self.classifier.classify(&candidate.name, verdict.same || inside);
        let confidence = class.confidence.filter(|_| class.is_target_category)?;
        if !(verdict.same || nearby) {
            tracing::debug!(
                anchor_id = %anchor.id,
                candidate = %candidate.name,
                ?distance_meters,
                "target-category listing is neither co-located nor nearby"
            );
            return None;
        }

        let evidence = if verdict.same {
            verdict.evidence.as_str()
        } else {
            "within_radius"
        };
        tracing::info!(
            anchor_id = %anchor.id,
            candidate = %candidate.name,
            %confidence,
            evidence,
            "category match near anchor"
        );

        Some(MatchedCandidate {
            name: candidate.name,
            address: candidate.raw_address,
            source_query: candidate.source_query,
            distance_meters,
            same_location: verdict.same,
            evidence: evidence.to_string(),
            confidence,
            matched_keywords: class.matched_keywords,
            is_known_brand: class.is_known_brand,
        })
    }
}
