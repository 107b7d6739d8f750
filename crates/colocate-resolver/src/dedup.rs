use std::collections::HashSet;

use colocate_core::CandidateListing;

use crate::classify::normalize_name;

/// Drop listings whose normalized name was already seen. The first
/// instance of every name is kept untouched, in its original position.
#[must_use]
pub fn dedupe_listings(listings: Vec<CandidateListing>) -> Vec<CandidateListing> {
    let before = listings.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<CandidateListing> = listings
        .into_iter()
        .filter(|listing| seen.insert(normalize_name(&listing.name)))
        .collect();

    if unique.len() < before {
        tracing::debug!(
            before,
            after = unique.len(),
            "dropped duplicate candidate listings"
        );
    }
    unique
}
