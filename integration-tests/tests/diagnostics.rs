use integration_tests::harness::{init_test_tracing, run_fixture};
use tracing::Level;

#[test]
fn malformed_lines_are_logged_with_reason() {
    // Arrange
    let events = init_test_tracing();

    // Act
    let outcome = run_fixture("comma.log");

    // Assert
    let events = events.lock().unwrap();
    let mut reasons: Vec<&str> = events
        .iter()
        .filter(|e| e.level == Level::WARN)
        .filter(|e| e.message() == Some("skipping malformed log line"))
        .filter_map(|e| e.field("reason"))
        .collect();
    reasons.sort();

    assert_eq!(reasons, vec!["bad_latency", "field_count"]);
    assert_eq!(outcome.summary.parse_failures, 2);

    let finished = events
        .iter()
        .find(|e| e.message() == Some("log analysis finished"))
        .unwrap();
    assert_eq!(finished.level, Level::INFO);
    assert_eq!(finished.field("admitted"), Some("5"));
    assert!(events.iter().any(|e| e.target.starts_with("logscope_core")));
}
