use amber_monitor::error::MonitorError;

#[test]
fn error_constructors() {
    assert!(matches!(
        MonitorError::config("x"),
        MonitorError::Config { .. }
    ));
    assert!(matches!(MonitorError::io("x"), MonitorError::Io { .. }));
    assert!(matches!(
        MonitorError::network("x"),
        MonitorError::Network { .. }
    ));
    assert!(matches!(
        MonitorError::validation("f", "m"),
        MonitorError::Validation { .. }
    ));
    assert!(matches!(
        MonitorError::api(502),
        MonitorError::Api { status_code: 502 }
    ));
}

#[test]
fn banner_messages() {
    assert_eq!(
        MonitorError::MissingCredential.to_string(),
        "API key not found. Please login again."
    );
    assert_eq!(
        MonitorError::rate_limited(30).to_string(),
        "Rate limit exceeded. Please try again in 30 seconds."
    );
    assert_eq!(MonitorError::api(404).to_string(), "API Error: 404");
    assert_eq!(
        MonitorError::NoSiteId.to_string(),
        "No site ID found. Please login again."
    );
}

#[test]
fn only_rate_limits_carry_a_wait() {
    assert_eq!(MonitorError::rate_limited(7).wait_seconds(), Some(7));
    assert_eq!(MonitorError::InvalidCredential.wait_seconds(), None);
    assert_eq!(MonitorError::api(500).wait_seconds(), None);
}

#[test]
fn credential_failures_are_terminal() {
    assert!(MonitorError::MissingCredential.is_terminal());
    assert!(MonitorError::InvalidCredential.is_terminal());
    assert!(!MonitorError::rate_limited(1).is_terminal());
    assert!(!MonitorError::NoSiteId.is_terminal());
}

#[test]
fn chrono_parse_errors_become_validation() {
    let err: MonitorError = chrono::NaiveDate::parse_from_str("nope", "%Y-%m-%d")
        .unwrap_err()
        .into();
    assert!(matches!(err, MonitorError::Validation { .. }));
}
