use super::*;

// -----------------------------------------------------------------------
// normalize_count / extract_count
// -----------------------------------------------------------------------

#[test]
fn thousands_separator_either_locale() {
    assert_eq!(extract_count("(11,958)"), Some(11_958));
    assert_eq!(extract_count("(11.958)"), Some(11_958));
}

#[test]
fn short_numbers_are_not_treated_as_thousands() {
    assert_eq!(extract_count("(12)"), Some(12));
    assert_eq!(normalize_count("1,2"), Some(12));
}

#[test]
fn mixed_separators_strip_everything() {
    assert_eq!(normalize_count("1.234,567"), Some(1_234_567));
    assert_eq!(normalize_count("1,234,567"), Some(1_234_567));
}

#[test]
fn trailing_separator_is_ignored() {
    assert_eq!(normalize_count("1,204,"), Some(1_204));
}

#[test]
fn non_numeric_is_none() {
    assert_eq!(normalize_count(""), None);
    assert_eq!(normalize_count(",."), None);
    assert_eq!(extract_count("no reviews yet"), None);
}

#[test]
fn labeled_count_wins_over_rating() {
    assert_eq!(extract_count("4.5 stars 1,204 reviews"), Some(1_204));
    assert_eq!(extract_count("11.958 reseñas"), Some(11_958));
}

// -----------------------------------------------------------------------
// CountExtractor
// -----------------------------------------------------------------------

fn review_text() -> ReviewText {
    ReviewText {
        labeled_count: Some("(11.958)".to_string()),
        accessible_label: Some("11,958 reviews".to_string()),
        panel_text: Some("Walmart Supercenter 4.2 (1,195) Open 24 hours".to_string()),
        state_blob: None,
    }
}

#[test]
fn maximum_policy_takes_largest_strategy_value() {
    let extractor = CountExtractor::default();
    assert_eq!(extractor.review_count(&review_text()), 11_958);
}

#[test]
fn priority_policy_takes_first_successful_strategy() {
    let text = ReviewText {
        labeled_count: None,
        ..review_text()
    };
    let extractor = CountExtractor::new(ReconcilePolicy::HighestPriority);
    assert_eq!(extractor.review_count(&text), 11_958);

    let truncated = ReviewText {
        labeled_count: Some("(1,195)".to_string()),
        ..review_text()
    };
    assert_eq!(extractor.review_count(&truncated), 1_195);
    assert_eq!(CountExtractor::default().review_count(&truncated), 11_958);
}

#[test]
fn state_blob_strategy() {
    let text = ReviewText {
        state_blob: Some(r#"{"name":"Walmart","reviewCount":"23,411","rating":4.1}"#.to_string()),
        ..ReviewText::default()
    };
    assert_eq!(CountExtractor::default().review_count(&text), 23_411);
}

#[test]
fn no_strategy_yields_zero() {
    assert_eq!(CountExtractor::default().review_count(&ReviewText::default()), 0);
    let text = ReviewText {
        panel_text: Some("Open now".to_string()),
        ..ReviewText::default()
    };
    assert_eq!(CountExtractor::default().review_count(&text), 0);
}

// -----------------------------------------------------------------------
// Coordinates
// -----------------------------------------------------------------------

#[test]
fn coordinate_from_at_sign_url() {
    let coord = extract_coordinate("https://maps.example.com/place/@39.7817,-89.6501,17z").unwrap();
    assert!((coord.lat - 39.7817).abs() < f64::EPSILON);
    assert!((coord.lng + 89.6501).abs() < f64::EPSILON);
}

#[test]
fn coordinate_from_query_params() {
    let ll = extract_coordinate("https://maps.example.com/?ll=18.1630,-66.7222&z=14").unwrap();
    assert!((ll.lat - 18.163).abs() < f64::EPSILON);

    let q = extract_coordinate("/maps?q=18.1630,-66.7222").unwrap();
    assert!((q.lng + 66.7222).abs() < f64::EPSILON);
}

#[test]
fn coordinate_from_data_segment_and_blob() {
    let data = extract_coordinate("/data=!4m5!3m4!3d18.1630!4d-66.7222").unwrap();
    assert!((data.lat - 18.163).abs() < f64::EPSILON);

    let blob = extract_coordinate(r#"[null,"18.1630, -66.7222",null]"#).unwrap();
    assert!((blob.lng + 66.7222).abs() < f64::EPSILON);
}

#[test]
fn out_of_range_coordinates_are_skipped() {
    assert!(extract_coordinate("@123.0000,45.0000").is_none());
    let coord = extract_coordinate("@123.0000,45.0000 &ll=10.5000,20.5000").unwrap();
    assert!((coord.lat - 10.5).abs() < f64::EPSILON);
}

#[test]
fn no_coordinate_is_none() {
    assert!(extract_coordinate("no coordinates here").is_none());
}

// -----------------------------------------------------------------------
// Distance
// -----------------------------------------------------------------------

#[test]
fn distance_units_convert_to_meters() {
    let close = |text: &str, expected: f64| {
        let meters = parse_distance_meters(text).unwrap();
        assert!((meters - expected).abs() < 1e-6, "{text}: {meters}");
    };
    close("0.1 mi", 160.934);
    close("150 m", 150.0);
    close("1.2 km", 1200.0);
    close("1,2 km", 1200.0);
    close("300 ft", 91.44);
}

#[test]
fn distance_without_unit_is_none() {
    assert!(parse_distance_meters("nearby").is_none());
    assert!(parse_distance_meters("12").is_none());
}
