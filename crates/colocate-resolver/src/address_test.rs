use colocate_core::{CategoryLexicon, UNKNOWN};

use super::*;

fn parser() -> AddressParser {
    AddressParser::new(&CategoryLexicon::default())
}

// -----------------------------------------------------------------------
// strip_non_printable
// -----------------------------------------------------------------------

#[test]
fn strips_map_pin_glyph() {
    assert_eq!(
        strip_non_printable("\u{e0c8}100 Main St, Springfield, IL 62701"),
        "100 Main St, Springfield, IL 62701"
    );
}

#[test]
fn collapses_newlines_and_zero_width_marks() {
    assert_eq!(
        strip_non_printable("100 Main St\n\u{200b}Springfield,\tIL"),
        "100 Main St Springfield, IL"
    );
}

// -----------------------------------------------------------------------
// US addresses
// -----------------------------------------------------------------------

#[test]
fn parses_full_us_address() {
    let comps = parser().parse("100 Main St, Springfield, IL 62701");
    assert_eq!(comps.street_number.as_deref(), Some("100"));
    assert_eq!(comps.city.as_deref(), Some("Springfield"));
    assert_eq!(comps.zip.as_deref(), Some("62701"));
    assert!(comps.territory.is_none());
}

#[test]
fn parses_zip_plus_four() {
    let comps = parser().parse("2200 W Wabash Ave, Springfield, IL 62704-5312");
    assert_eq!(comps.zip.as_deref(), Some("62704-5312"));
    assert_eq!(comps.zip5(), Some("62704"));
    assert_eq!(comps.street_number.as_deref(), Some("2200"));
}

#[test]
fn city_with_period_and_spaces() {
    let comps = parser().parse("5 Ocean Dr, St. Augustine, FL 32080");
    assert_eq!(comps.city.as_deref(), Some("St. Augustine"));
}

#[test]
fn city_state_without_zip() {
    let comps = parser().parse("100 Main St, Springfield, IL");
    assert_eq!(comps.city.as_deref(), Some("Springfield"));
    assert!(comps.zip.is_none());
}

#[test]
fn falls_back_to_comma_segment_for_city() {
    let comps = parser().parse("Calle 5, Bayamón, 00959");
    assert_eq!(comps.city.as_deref(), Some("Bayamón"));
}

#[test]
fn zip_without_state_uses_last_token() {
    let comps = parser().parse("12345 Route 9, Kingston 12401");
    assert_eq!(comps.zip.as_deref(), Some("12401"));
    assert_eq!(comps.street_number.as_deref(), Some("12345"));
}

#[test]
fn zip_extension_is_not_mistaken_for_street_number() {
    let comps = parser().parse("Springfield, IL 62704-5312");
    assert!(comps.street_number.is_none());
    assert_eq!(comps.zip.as_deref(), Some("62704-5312"));

    let comps = parser().parse("Springfield 62704-5312, 18 Elm St");
    assert_eq!(comps.street_number.as_deref(), Some("18"));
}

#[test]
fn zip_is_not_mistaken_for_street_number() {
    let comps = parser().parse("Springfield, IL 62701");
    assert!(comps.street_number.is_none());
    assert_eq!(comps.zip.as_deref(), Some("62701"));
}

#[test]
fn unknown_and_empty_inputs_resolve_nothing() {
    for raw in ["", "   ", "Unknown", "\u{e0c8}"] {
        let comps = parser().parse(raw);
        assert_eq!(comps, AddressComponents::default(), "input {raw:?}");
        assert_eq!(comps.city_or_unknown(), UNKNOWN);
    }
}

// -----------------------------------------------------------------------
// Territory addresses
// -----------------------------------------------------------------------

#[test]
fn detects_territory_by_name() {
    let comps = parser().parse("Carr 2 Km 10, Barrio Garzas, Puerto Rico 00601");
    assert_eq!(comps.territory.as_deref(), Some("PR"));
    assert_eq!(comps.zip.as_deref(), Some("00601"));
    assert_eq!(comps.city.as_deref(), Some("Barrio Garzas"));
}

#[test]
fn detects_territory_by_code() {
    let comps = parser().parse("Carr. 2, Adjuntas, PR 00601");
    assert_eq!(comps.territory.as_deref(), Some("PR"));
    assert_eq!(comps.city.as_deref(), Some("Adjuntas"));
    assert_eq!(comps.zip.as_deref(), Some("00601"));
}

#[test]
fn territory_city_pattern_is_last_resort() {
    let comps = parser().parse("Adjuntas, 00601, Puerto Rico");
    assert_eq!(comps.city.as_deref(), Some("Adjuntas"));
}

#[test]
fn territory_bare_zip_only_with_marker() {
    let with_marker = parser().parse("Plaza Local PR00601 Puerto Rico");
    assert_eq!(with_marker.zip.as_deref(), Some("00601"));

    let without_marker = parser().parse("Plaza Local XY00601");
    assert!(without_marker.zip.is_none());
}

#[test]
fn zip_after_territory_name_is_not_a_street_number() {
    let comps = parser().parse("Adjuntas, Puerto Rico 00601");
    assert!(comps.street_number.is_none());
}

#[test]
fn road_markers_are_token_matched() {
    let p = parser();
    assert!(p.has_road_marker("PR", "Carr. 2 Km 10"));
    assert!(p.has_road_marker("PR", "Urb. Las Flores"));
    assert!(!p.has_road_marker("PR", "100 Carriage Way"));
    assert!(!p.has_road_marker("XX", "Carr. 2"));
}

// -----------------------------------------------------------------------
// Determinism
// -----------------------------------------------------------------------

#[test]
fn parsing_is_deterministic() {
    let p = parser();
    let inputs = [
        "100 Main St, Springfield, IL 62701",
        "Carr 2 Km 10, Barrio Garzas, Puerto Rico 00601",
        "\u{e0c8} 7 Elm, Nowhere",
        "no digits here",
    ];
    for raw in inputs {
        let first = p.parse(raw);
        for _ in 0..5 {
            assert_eq!(p.parse(raw), first);
        }
        assert_eq!(AddressParser::new(&CategoryLexicon::default()).parse(raw), first);
    }
}

#[test]
fn shared_road_markers_need_both_sides() {
    let p = parser();
    assert!(p.share_road_markers("Carr 2 Km 10", "Bo. Garzas, Adjuntas"));
    assert!(!p.share_road_markers("Carr 2 Km 10", "100 Main St"));
}
