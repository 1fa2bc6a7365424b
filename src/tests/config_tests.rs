use crate::config::{parse_queries, Config, ConfigError, QUERIES_ENV};
use crate::mailer::BREVO_API_URL;
use crate::spreadsheets::TimestampColumn;
use std::collections::HashMap;
use std::time::Duration;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn minimal() -> Vec<(&'static str, &'static str)> {
    vec![
        (QUERIES_ENV, r#"{"Łódź mieszkania wynajem": "https://www.olx.pl/api/v1/offers/?limit=40"}"#),
        ("BREVO_API_KEY", "secret"),
        ("MAIL_SENDER_EMAIL", "bot@example.com"),
        ("MAIL_RECIPIENT_EMAIL", "me@example.com"),
    ]
}

#[test]
fn minimal_env_uses_defaults() {
    let cfg = Config::from_lookup(lookup_from(&minimal())).unwrap();

    assert_eq!(cfg.queries.len(), 1);
    assert_eq!(cfg.queries[0].name, "Łódź mieszkania wynajem");
    assert_eq!(cfg.mail.api_url, BREVO_API_URL);
    assert_eq!(cfg.mail.sender_name, "OLX Notifier");
    assert_eq!(cfg.fetch_timeout, Duration::from_secs(30));
    assert_eq!(cfg.retry.max_attempts, 5);
    assert_eq!(cfg.limits.max_pages, 50);
    assert_eq!(cfg.timestamp, TimestampColumn::Original);
    assert!(!cfg.keep_exports);
}

#[test]
fn overrides_are_applied() {
    let mut pairs = minimal();
    pairs.extend([
        ("FETCH_MAX_ATTEMPTS", "2"),
        ("FETCH_MAX_PAGES", "7"),
        ("FETCH_TIMEOUT_SECS", "5"),
        ("FETCH_BACKOFF_SECS", "0"),
        ("EXPORT_TIMESTAMP", "utc"),
        ("EXPORT_DIR", "/var/tmp/olx"),
        ("KEEP_EXPORTS", "true"),
    ]);

    let cfg = Config::from_lookup(lookup_from(&pairs)).unwrap();

    assert_eq!(cfg.retry.max_attempts, 2);
    assert_eq!(cfg.retry.base_delay, Duration::ZERO);
    assert_eq!(cfg.limits.max_pages, 7);
    assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
    assert_eq!(cfg.timestamp, TimestampColumn::Utc);
    assert_eq!(cfg.export_dir.to_str(), Some("/var/tmp/olx"));
    assert!(cfg.keep_exports);
}

#[test]
fn missing_credentials_are_named() {
    let pairs: Vec<_> = minimal()
        .into_iter()
        .filter(|(k, _)| *k != "BREVO_API_KEY")
        .collect();

    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

    assert_eq!(err, ConfigError::Missing("BREVO_API_KEY"));
}

#[test]
fn zero_attempts_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("FETCH_MAX_ATTEMPTS", "0"));

    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { key: "FETCH_MAX_ATTEMPTS", .. }));
}

#[test]
fn zero_page_cap_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("FETCH_MAX_PAGES", "0"));

    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { key: "FETCH_MAX_PAGES", .. }));
}

#[test]
fn oversized_backoff_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("FETCH_BACKOFF_SECS", "18446744073709551615"));

    let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

    assert!(matches!(err, ConfigError::Invalid { key: "FETCH_BACKOFF_SECS", .. }));
}

#[test]
fn unknown_timestamp_mode_is_rejected() {
    let mut pairs = minimal();
    pairs.push(("EXPORT_TIMESTAMP", "epoch"));

    assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
}

#[test]
fn queries_come_back_sorted_by_name() {
    let queries = parse_queries(
        r#"{"rooms": "https://olx.pl/api/rooms", "flats": "https://olx.pl/api/flats"}"#,
    )
    .unwrap();

    let names: Vec<&str> = queries.iter().map(|q| q.name.as_str()).collect();
    assert_eq!(names, ["flats", "rooms"]);
}

#[test]
fn bad_query_maps_are_rejected() {
    assert!(parse_queries("{}").is_err());
    assert!(parse_queries("not json").is_err());
    assert!(parse_queries(r#"{"x": "not a url"}"#).is_err());
    assert!(parse_queries(r#"{"x": "ftp://olx.pl/api"}"#).is_err());
}
