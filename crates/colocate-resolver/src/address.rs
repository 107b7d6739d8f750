//! Free-text address → [`AddressComponents`].
//!
//! Each field has its own ordered rule list. Rules are tried in priority
//! order and the first one producing a non-empty value commits the field;
//! later rules for that field are never consulted. Fields are extracted
//! independently of one another, so a miss on one never blocks another.

use std::sync::LazyLock;

use colocate_core::{AddressComponents, CategoryLexicon};
use regex::Regex;

static STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{2}\s+(\d{5}(?:-\d{4})?)\b").expect("valid state zip regex")
});
static ZIP_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5}(?:-\d{4})?)\b").expect("valid zip regex"));
static BARE_ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{5})").expect("valid bare zip regex"));

static CITY_STATE_ZIP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\p{L}\s\.]+),\s+[A-Z]{2}\s+\d{5}").expect("valid city/state/zip regex")
});
static CITY_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\p{L}\s\.]+),\s+[A-Z]{2}\b").expect("valid city/state regex")
});
static COMMA_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([\p{L}\s\.]+),").expect("valid comma segment regex"));

static NUMBER_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,5})\b").expect("valid number regex"));
static TRAILING_STATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\s*,?\s*$").expect("valid trailing state regex"));

/// Compiled per-territory patterns.
#[derive(Debug, Clone)]
struct TerritoryRules {
    code: String,
    name_lower: String,
    code_re: Regex,
    city_re: Regex,
    road_markers: Vec<String>,
}

impl TerritoryRules {
    fn mentioned_in(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.name_lower) || self.code_re.is_match(text)
    }
}

/// Working state handed to every rule.
struct ParseContext<'a> {
    text: &'a str,
    territory: Option<&'a TerritoryRules>,
}

type Rule = fn(&ParseContext<'_>) -> Option<String>;

const ZIP_RULES: &[(&str, Rule)] = &[
    ("state_zip", zip_after_state),
    ("zip_token", last_zip_token),
    ("territory_bare_zip", territory_bare_zip),
];

const CITY_RULES: &[(&str, Rule)] = &[
    ("city_state_zip", city_before_state_zip),
    ("city_state", city_before_state),
    ("comma_segment", city_between_commas),
    ("territory_city", city_before_territory),
];

const STREET_NUMBER_RULES: &[(&str, Rule)] = &[("first_number", first_street_number)];

/// Deterministic address parser configured with the lexicon's territories.
#[derive(Debug, Clone)]
pub struct AddressParser {
    territories: Vec<TerritoryRules>,
}

impl AddressParser {
    #[must_use]
    pub fn new(lexicon: &CategoryLexicon) -> Self {
        let territories = lexicon
            .territories
            .iter()
            .map(|t| {
                let name = regex::escape(t.name.trim());
                let code = regex::escape(t.code.trim());
                TerritoryRules {
                    code: t.code.trim().to_uppercase(),
                    name_lower: t.name.trim().to_lowercase(),
                    code_re: Regex::new(&format!(r"\b{code}\b"))
                        .expect("escaped territory code is a valid regex"),
                    city_re: Regex::new(&format!(
                        r"(?i)([\p{{L}}\s\.]+),\s+(?:\d{{5}},\s+)?{name}"
                    ))
                    .expect("escaped territory name is a valid regex"),
                    road_markers: t.road_markers.iter().map(|m| m.to_lowercase()).collect(),
                }
            })
            .collect();
        Self { territories }
    }

    /// Parse a raw address. Never fails: unresolved fields are `None`.
    #[must_use]
    pub fn parse(&self, raw: &str) -> AddressComponents {
        let cleaned = strip_non_printable(raw);
        if cleaned.is_empty() || cleaned.eq_ignore_ascii_case(colocate_core::UNKNOWN) {
            return AddressComponents::default();
        }

        let territory = self.territory_of(&cleaned);
        let ctx = ParseContext {
            text: &cleaned,
            territory,
        };

        let components = AddressComponents {
            street_number: first_match(STREET_NUMBER_RULES, &ctx, "street_number"),
            city: first_match(CITY_RULES, &ctx, "city"),
            zip: first_match(ZIP_RULES, &ctx, "zip"),
            territory: territory.map(|t| t.code.clone()),
        };

        if components.zip.is_none() || components.city.is_none() {
            tracing::debug!(
                address = %cleaned,
                city = components.city_or_unknown(),
                zip = components.zip_or_unknown(),
                "address only partially parsed"
            );
        }

        components
    }

    /// Whether `text` contains any road marker of the territory with `code`.
    #[must_use]
    pub fn has_road_marker(&self, code: &str, text: &str) -> bool {
        let Some(rules) = self.territories.iter().find(|t| t.code == code) else {
            return false;
        };
        let lower = strip_non_printable(text).to_lowercase();
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| rules.road_markers.iter().any(|m| m == token))
    }

    /// Whether both texts carry road markers of one and the same territory.
    #[must_use]
    pub fn share_road_markers(&self, a: &str, b: &str) -> bool {
        self.territories
            .iter()
            .any(|t| self.has_road_marker(&t.code, a) && self.has_road_marker(&t.code, b))
    }

    fn territory_of(&self, text: &str) -> Option<&TerritoryRules> {
        self.territories.iter().find(|t| t.mentioned_in(text))
    }
}

fn first_match(rules: &[(&str, Rule)], ctx: &ParseContext<'_>, field: &str) -> Option<String> {
    rules.iter().find_map(|(name, rule)| {
        let value = rule(ctx)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;
        tracing::trace!(field, rule = name, value = %value, "address rule matched");
        Some(value)
    })
}

/// Remove glyphs that are not printable text (map-pin icons from the
/// private-use area, zero-width marks, control characters). Whitespace of
/// any kind collapses to a single space.
#[must_use]
pub fn strip_non_printable(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else if is_printable(c) {
            out.push(c);
        }
    }
    out.trim().to_string()
}

fn is_printable(c: char) -> bool {
    !c.is_control()
        && !('\u{E000}'..='\u{F8FF}').contains(&c)
        && !matches!(c, '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}')
}

// ---------------------------------------------------------------------------
// Zip rules
// ---------------------------------------------------------------------------

fn zip_after_state(ctx: &ParseContext<'_>) -> Option<String> {
    STATE_ZIP_RE
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

fn last_zip_token(ctx: &ParseContext<'_>) -> Option<String> {
    ZIP_TOKEN_RE
        .captures_iter(ctx.text)
        .last()
        .map(|caps| caps[1].to_string())
}

fn territory_bare_zip(ctx: &ParseContext<'_>) -> Option<String> {
    ctx.territory?;
    BARE_ZIP_RE
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

// ---------------------------------------------------------------------------
// City rules
// ---------------------------------------------------------------------------

fn city_before_state_zip(ctx: &ParseContext<'_>) -> Option<String> {
    CITY_STATE_ZIP_RE
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

fn city_before_state(ctx: &ParseContext<'_>) -> Option<String> {
    CITY_STATE_RE
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

fn city_between_commas(ctx: &ParseContext<'_>) -> Option<String> {
    COMMA_SEGMENT_RE
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

fn city_before_territory(ctx: &ParseContext<'_>) -> Option<String> {
    ctx.territory?
        .city_re
        .captures(ctx.text)
        .map(|caps| caps[1].to_string())
}

// ---------------------------------------------------------------------------
// Street number rules
// ---------------------------------------------------------------------------

/// First standalone 1–5 digit token that is not sitting in the zip slot
/// (directly after a state or territory code, carrying a `-NNNN` suffix, or
/// being that suffix).
fn first_street_number(ctx: &ParseContext<'_>) -> Option<String> {
    NUMBER_TOKEN_RE.captures_iter(ctx.text).find_map(|caps| {
        let token = caps.get(1)?;
        let value = token.as_str();
        let before = &ctx.text[..token.start()];
        if is_zip_extension(before) {
            return None;
        }
        if value.len() == 5 {
            let after = &ctx.text[token.end()..];
            let after_state = TRAILING_STATE_RE.is_match(before);
            let after_territory = ctx.territory.is_some_and(|t| {
                before
                    .trim_end_matches([' ', ','])
                    .to_lowercase()
                    .ends_with(&t.name_lower)
            });
            let has_plus4 = after.starts_with('-')
                && after[1..].chars().take_while(char::is_ascii_digit).count() == 4;
            if after_state || after_territory || has_plus4 {
                return None;
            }
        }
        Some(value.to_string())
    })
}

/// Whether the text before a token ends in `NNNNN-`, making the token a
/// zip+4 extension.
fn is_zip_extension(before: &str) -> bool {
    let Some(body) = before.strip_suffix('-') else {
        return false;
    };
    let digits = body
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .count();
    digits == 5
}

#[cfg(test)]
#[path = "address_test.rs"]
mod tests;
