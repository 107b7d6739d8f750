//! Category classification of candidate business names.

use std::collections::BTreeSet;

use colocate_core::{CategoryLexicon, ClassificationResult, Confidence};

/// Lowercase and drop spaces and hyphens, so that `"I FIX-AND REPAIR"`
/// and `"iFixandRepair"` compare equal. Also the deduplication key.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// A lexicon entry with its precomputed normalized form.
#[derive(Debug, Clone)]
struct Term {
    label: String,
    key: String,
}

impl Term {
    fn new(label: &str) -> Self {
        Self {
            label: label.trim().to_string(),
            key: normalize_name(label),
        }
    }
}

fn terms(list: &[String]) -> Vec<Term> {
    list.iter()
        .map(|s| Term::new(s))
        .filter(|t| !t.key.is_empty())
        .collect()
}

/// Pure classifier over an injected lexicon.
#[derive(Debug, Clone)]
pub struct Classifier {
    brands: Vec<Term>,
    category: Vec<Term>,
    strong: Vec<Term>,
    extended: Vec<Term>,
}

impl Classifier {
    #[must_use]
    pub fn new(lexicon: &CategoryLexicon) -> Self {
        Self {
            brands: terms(&lexicon.known_brands),
            category: terms(&lexicon.category_keywords),
            strong: terms(&lexicon.strong_keywords),
            extended: terms(&lexicon.extended_keywords),
        }
    }

    /// Classify a listing name.
    ///
    /// `co_located` is the caller's evidence that the listing sits in the
    /// anchor's building; it lifts a low-confidence hit to medium and has
    /// no other effect.
    #[must_use]
    pub fn classify(&self, name: &str, co_located: bool) -> ClassificationResult {
        let key = normalize_name(name);
        if key.is_empty() {
            return ClassificationResult::no_match();
        }

        let brand_hits = hits(&self.brands, &key);
        if !brand_hits.is_empty() {
            return matched(Confidence::High, brand_hits, true);
        }

        let category_hits = hits(&self.category, &key);
        let has_strong = self.strong.iter().any(|s| key.contains(&s.key));
        if category_hits.len() >= 2 && has_strong {
            return matched(Confidence::Medium, category_hits, false);
        }

        let extended_hits = hits(&self.extended, &key);
        if !extended_hits.is_empty() {
            let confidence = if co_located {
                Confidence::Medium
            } else {
                Confidence::Low
            };
            return matched(confidence, extended_hits, false);
        }

        ClassificationResult::no_match()
    }
}

fn hits(terms: &[Term], key: &str) -> BTreeSet<String> {
    terms
        .iter()
        .filter(|t| key.contains(&t.key))
        .map(|t| t.label.clone())
        .collect()
}

fn matched(
    confidence: Confidence,
    matched_keywords: BTreeSet<String>,
    is_known_brand: bool,
) -> ClassificationResult {
    ClassificationResult {
        is_target_category: true,
        confidence: Some(confidence),
        matched_keywords,
        is_known_brand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(&CategoryLexicon::default())
    }

    #[test]
    fn normalize_name_drops_case_spaces_and_hyphens() {
        assert_eq!(normalize_name("I FIX-AND Repair"), "ifixandrepair");
        assert_eq!(normalize_name("  "), "");
    }

    #[test]
    fn brand_spellings_are_high_with_same_token() {
        let c = classifier();
        for name in ["iFixandRepair", "i-fix-and-repair", "I FIX AND REPAIR"] {
            let result = c.classify(name, false);
            assert!(result.is_target_category, "{name}");
            assert_eq!(result.confidence, Some(Confidence::High), "{name}");
            assert!(result.is_known_brand);
            assert_eq!(
                result.matched_keywords,
                BTreeSet::from(["iFixandRepair".to_string()]),
                "{name}"
            );
        }
    }

    #[test]
    fn two_generic_keywords_with_strong_one_are_medium() {
        let result = classifier().classify("Mobile Repair Center", false);
        assert_eq!(result.confidence, Some(Confidence::Medium));
        assert!(!result.is_known_brand);
        assert!(result.matched_keywords.contains("mobile"));
        assert!(result.matched_keywords.contains("repair"));
    }

    #[test]
    fn generic_keywords_without_strong_one_are_not_medium() {
        let result = classifier().classify("Mobile Phone Outlet", false);
        assert_ne!(result.confidence, Some(Confidence::Medium));
    }

    #[test]
    fn extended_keyword_alone_is_low() {
        let result = classifier().classify("Cricket Wireless", false);
        assert!(result.is_target_category);
        assert_eq!(result.confidence, Some(Confidence::Low));
        assert!(result.matched_keywords.contains("cricket wireless"));
    }

    #[test]
    fn localized_spelling_is_low() {
        let result = classifier().classify("Celulares El Primo", false);
        assert_eq!(result.confidence, Some(Confidence::Low));
    }

    #[test]
    fn co_location_lifts_low_to_medium_only() {
        let c = classifier();
        assert_eq!(
            c.classify("Cricket Wireless", true).confidence,
            Some(Confidence::Medium)
        );
        assert_eq!(
            c.classify("iFixandRepair", true).confidence,
            Some(Confidence::High)
        );
        assert!(!c.classify("Subway", true).is_target_category);
    }

    #[test]
    fn unrelated_names_are_no_match() {
        let c = classifier();
        for name in ["Subway", "McDonald's", "", "Great Clips"] {
            assert_eq!(c.classify(name, false), ClassificationResult::no_match(), "{name}");
        }
    }

    #[test]
    fn classification_ignores_keyword_order() {
        let lexicon = CategoryLexicon::default();
        let mut reversed = lexicon.clone();
        reversed.known_brands.reverse();
        reversed.category_keywords.reverse();
        reversed.extended_keywords.reverse();

        let forward = Classifier::new(&lexicon);
        let backward = Classifier::new(&reversed);
        for name in [
            "iFixandRepair",
            "Mobile Repair Center",
            "Cricket Wireless",
            "Subway",
        ] {
            assert_eq!(forward.classify(name, false), backward.classify(name, false));
        }
    }
}
