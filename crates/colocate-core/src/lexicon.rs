//! Category lexicon: the brand and keyword tables that drive classification
//! and the territory tables that drive address parsing.
//!
//! A lexicon is plain immutable data. The built-in [`CategoryLexicon::default`]
//! covers mobile-device repair in the US and Puerto Rico; deployments can
//! override it with a YAML file via [`load_lexicon`].

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A postal territory whose addresses need their own parsing leniency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    /// Display name as it appears in addresses, e.g. `"Puerto Rico"`.
    pub name: String,
    /// Two-letter postal code, e.g. `"PR"`.
    pub code: String,
    /// Lowercase road/locality tokens typical of the territory
    /// (`"carr"`, `"km"`, `"barrio"`, ...).
    #[serde(default)]
    pub road_markers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLexicon {
    /// Chains and franchises of the target category. Any hit is high confidence.
    pub known_brands: Vec<String>,
    /// Brands used to build targeted search queries. Subset of `known_brands`
    /// in practice, but not required to be.
    #[serde(default)]
    pub featured_brands: Vec<String>,
    /// Generic category words counted toward medium confidence.
    pub category_keywords: Vec<String>,
    /// Category words of which at least one must be present for medium confidence.
    pub strong_keywords: Vec<String>,
    /// Phrases and localized spellings that alone give low confidence.
    #[serde(default)]
    pub extended_keywords: Vec<String>,
    #[serde(default)]
    pub territories: Vec<Territory>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for CategoryLexicon {
    fn default() -> Self {
        Self {
            known_brands: strings(&[
                "iFixandRepair",
                "TalknFix",
                "iTalkandRepair",
                "The Fix",
                "Cellaris",
                "Casemate",
                "uBreakiFix",
                "CPR Cell Phone Repair",
                "Asurion",
                "Experimax",
                "Experimac",
                "iDoctor",
                "iRepair",
                "PhoneFix",
                "Device Pitstop",
                "Wireless Clinic",
                "Cell Doc",
                "Simply Mac",
                "Simply Fix",
                "iCare Repair",
                "ImmedaTech",
                "TechXpress",
                "Techy",
            ]),
            featured_brands: strings(&["iFixandRepair", "The Fix"]),
            category_keywords: strings(&[
                "phone", "repair", "mobile", "cell", "fix", "wireless", "device",
            ]),
            strong_keywords: strings(&["repair", "fix"]),
            extended_keywords: strings(&[
                "mobile repair",
                "phone repair",
                "cell phone",
                "cellular",
                "smartphone",
                "iphone repair",
                "screen repair",
                "battery replacement",
                "tech repair",
                "device repair",
                "boost mobile",
                "cricket wireless",
                "simple mobile",
                "mobile solutions",
                "celular",
                "celulares",
                "reparacion",
                "reparación",
                "telefonos",
                "teléfonos",
            ]),
            territories: vec![Territory {
                name: "Puerto Rico".to_string(),
                code: "PR".to_string(),
                road_markers: strings(&[
                    "carr",
                    "carretera",
                    "km",
                    "bo",
                    "barrio",
                    "urb",
                    "urbanizacion",
                    "urbanización",
                    "sector",
                ]),
            }],
        }
    }
}

/// Load and validate a lexicon from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_lexicon(path: &Path) -> Result<CategoryLexicon, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LexiconFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let lexicon: CategoryLexicon =
        serde_yaml::from_str(&content).map_err(ConfigError::LexiconFileParse)?;

    lexicon.validate()?;

    Ok(lexicon)
}

impl CategoryLexicon {
    /// Check the structural rules a lexicon must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.known_brands.is_empty() {
            return Err(ConfigError::Validation(
                "known_brands must contain at least one entry".to_string(),
            ));
        }

        let lists = [
            ("known_brands", &self.known_brands),
            ("featured_brands", &self.featured_brands),
            ("category_keywords", &self.category_keywords),
            ("strong_keywords", &self.strong_keywords),
            ("extended_keywords", &self.extended_keywords),
        ];
        for (label, entries) in lists {
            if entries.iter().any(|e| e.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{label} contains a blank entry"
                )));
            }
        }

        let category: HashSet<String> = self
            .category_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .collect();
        for strong in &self.strong_keywords {
            if !category.contains(&strong.trim().to_lowercase()) {
                return Err(ConfigError::Validation(format!(
                    "strong keyword '{strong}' is not listed in category_keywords"
                )));
            }
        }

        let mut seen_codes = HashSet::new();
        for territory in &self.territories {
            if territory.name.trim().is_empty() || territory.code.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "territory name and code must be non-empty".to_string(),
                ));
            }
            if !seen_codes.insert(territory.code.to_uppercase()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate territory code: '{}'",
                    territory.code
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_yaml(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_lexicon_is_valid() {
        CategoryLexicon::default().validate().unwrap();
    }

    #[test]
    fn default_lexicon_knows_puerto_rico() {
        let lexicon = CategoryLexicon::default();
        let pr = lexicon
            .territories
            .iter()
            .find(|t| t.code == "PR")
            .unwrap();
        assert_eq!(pr.name, "Puerto Rico");
        assert!(pr.road_markers.iter().any(|m| m == "carr"));
    }

    #[test]
    fn load_lexicon_reads_minimal_file() {
        let file = write_yaml(
            "known_brands: [\"Gadget Doctor\"]\n\
             category_keywords: [phone, repair]\n\
             strong_keywords: [repair]\n",
        );
        let lexicon = load_lexicon(file.path()).unwrap();
        assert_eq!(lexicon.known_brands, vec!["Gadget Doctor".to_string()]);
        assert!(lexicon.extended_keywords.is_empty());
        assert!(lexicon.territories.is_empty());
    }

    #[test]
    fn load_lexicon_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("lexicon.yaml");
        assert!(path.exists(), "lexicon.yaml missing at {path:?}");
        let lexicon = load_lexicon(&path).unwrap();
        assert_eq!(lexicon, CategoryLexicon::default());
    }

    #[test]
    fn load_lexicon_missing_file_is_io_error() {
        let err = load_lexicon(Path::new("/nonexistent/lexicon.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::LexiconFileIo { .. }));
    }

    #[test]
    fn load_lexicon_malformed_yaml_is_parse_error() {
        let file = write_yaml("known_brands: [unterminated\n");
        let err = load_lexicon(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::LexiconFileParse(_)));
    }

    #[test]
    fn validate_rejects_empty_brand_list() {
        let lexicon = CategoryLexicon {
            known_brands: vec![],
            ..CategoryLexicon::default()
        };
        assert!(matches!(
            lexicon.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_blank_keyword() {
        let mut lexicon = CategoryLexicon::default();
        lexicon.extended_keywords.push("  ".to_string());
        let err = lexicon.validate().unwrap_err();
        assert!(err.to_string().contains("extended_keywords"));
    }

    #[test]
    fn validate_rejects_strong_keyword_outside_category() {
        let mut lexicon = CategoryLexicon::default();
        lexicon.strong_keywords.push("screen".to_string());
        let err = lexicon.validate().unwrap_err();
        assert!(err.to_string().contains("screen"));
    }

    #[test]
    fn validate_rejects_duplicate_territory_code() {
        let mut lexicon = CategoryLexicon::default();
        let dup = lexicon.territories[0].clone();
        lexicon.territories.push(dup);
        assert!(matches!(
            lexicon.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
