//! Search query construction for one anchor.

use colocate_core::{AnchorLocation, CategoryLexicon};

use crate::address::strip_non_printable;

#[derive(Debug, Clone)]
pub struct QueryPlanner {
    host_brand: String,
    featured_brands: Vec<String>,
}

impl QueryPlanner {
    #[must_use]
    pub fn new(host_brand: &str, lexicon: &CategoryLexicon) -> Self {
        Self {
            host_brand: host_brand.trim().to_string(),
            featured_brands: lexicon
                .featured_brands
                .iter()
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty())
                .collect(),
        }
    }

    /// Query used to look up the anchor itself. The first attempt names the
    /// store number; retries fall back to the broader host-plus-address form.
    #[must_use]
    pub fn lookup_query(&self, anchor: &AnchorLocation, attempt: u32) -> String {
        let address = strip_non_printable(&anchor.raw_address);
        if attempt <= 1 {
            format!("{} Store #{} {address}", self.host_brand, anchor.id)
        } else {
            format!("{} {address}", self.host_brand)
        }
    }

    /// Listing searches for candidates near the anchor, in a fixed order.
    #[must_use]
    pub fn listing_queries(&self, anchor: &AnchorLocation) -> Vec<String> {
        let address = strip_non_printable(&anchor.raw_address);
        let mut queries = vec![
            format!("cell phone repair near {address}"),
            format!("mobile repair store near {address}"),
        ];
        queries.extend(
            self.featured_brands
                .iter()
                .map(|brand| format!("{brand} {} {}", self.host_brand, anchor.id)),
        );
        queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> QueryPlanner {
        QueryPlanner::new("Walmart", &CategoryLexicon::default())
    }

    fn anchor() -> AnchorLocation {
        AnchorLocation::new("1234", "\u{e0c8}100 Main St, Springfield, IL 62701")
    }

    #[test]
    fn first_lookup_names_the_store() {
        assert_eq!(
            planner().lookup_query(&anchor(), 1),
            "Walmart Store #1234 100 Main St, Springfield, IL 62701"
        );
    }

    #[test]
    fn retry_lookup_uses_broader_query() {
        let p = planner();
        assert_eq!(
            p.lookup_query(&anchor(), 2),
            "Walmart 100 Main St, Springfield, IL 62701"
        );
        assert_eq!(p.lookup_query(&anchor(), 2), p.lookup_query(&anchor(), 3));
    }

    #[test]
    fn listing_queries_are_deterministic() {
        let p = planner();
        let queries = p.listing_queries(&anchor());
        assert_eq!(
            queries,
            vec![
                "cell phone repair near 100 Main St, Springfield, IL 62701".to_string(),
                "mobile repair store near 100 Main St, Springfield, IL 62701".to_string(),
                "iFixandRepair Walmart 1234".to_string(),
                "The Fix Walmart 1234".to_string(),
            ]
        );
        assert_eq!(queries, p.listing_queries(&anchor()));
    }
}
