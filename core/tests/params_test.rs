use spotlight_core::params::keys;
use spotlight_core::NavParams;

#[test]
fn parses_query_string_with_percent_encoding() {
    let params =
        NavParams::from_query("?highlightTest=test_123&testName=VO2%20M%C3%A1ximo&tab=results");
    assert_eq!(params.get(keys::HIGHLIGHT_TEST), Some("test_123"));
    assert_eq!(params.get(keys::TEST_NAME), Some("VO2 Máximo"));
    assert_eq!(params.get("tab"), Some("results"));
}

#[test]
fn plus_decodes_to_space() {
    let params = NavParams::from_query("examName=Maratona+de+SP");
    assert_eq!(params.get(keys::EXAM_NAME), Some("Maratona de SP"));
}

#[test]
fn malformed_pairs_are_skipped() {
    let params = NavParams::from_query("a=1&%GG=2&=3&b=%Z9&c");
    assert_eq!(params.get("a"), Some("1"));
    // bare key keeps an empty value
    assert_eq!(params.get("c"), Some(""));
    assert_eq!(params.len(), 2);
}

#[test]
fn to_query_is_sorted_and_round_trips() {
    let params = NavParams::new()
        .with("b", "2")
        .with("a", "um dois")
        .with("c", "á");
    let query = params.to_query();
    assert_eq!(query, "a=um%20dois&b=2&c=%C3%A1");
    assert_eq!(NavParams::from_query(&query), params);
}

#[test]
fn strip_highlight_leaves_unrelated_keys() {
    let mut params = NavParams::new()
        .with(keys::HIGHLIGHT_TEST, "test_123")
        .with(keys::TEST_NAME, "VO2 Máximo")
        .with(keys::NOTIFICATION_TIME, "1700000000000")
        .with("tab", "results");
    assert!(params.has_highlight());

    params.strip_highlight();
    assert!(!params.has_highlight());
    assert_eq!(params.len(), 1);
    assert_eq!(params.get("tab"), Some("results"));
}

#[test]
fn strip_highlight_removes_every_owned_key() {
    let mut params = NavParams::new();
    for key in keys::ALL {
        params.set(key, "x");
    }
    params.strip_highlight();
    assert!(params.is_empty());
}
