mod common;

use chrono::Duration;
use journey_insights::aggregator::{
    build_funnel, build_funnel_with, furthest_step, segment, step_details, EventMatcher, FunnelStep,
    Session, UnmatchedPolicy,
};
use journey_insights::loader::{load_file, Event};
use journey_insights::utils::config::AnalysisConfig;
use pretty_assertions::assert_eq;

fn sessions_of(events: Vec<Event>) -> Vec<Session> {
    segment(&events, Duration::minutes(30))
}

fn fixture_sessions() -> Vec<Session> {
    let loaded = load_file(common::fixture("sessions.jsonl")).unwrap();
    segment(&loaded.events, Duration::minutes(30))
}

fn counts(sessions: &[Session], steps: &[FunnelStep]) -> Vec<usize> {
    build_funnel(sessions, steps).steps.iter().map(|r| r.count).collect()
}

#[test]
fn test_checkout_session_reaches_checkout() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products/headphones-xyz"),
        common::page("u1", 60, "/cart"),
        common::page("u1", 120, "/checkout"),
        common::event("u1", 180, "/checkout", "div.error-message", "Payment declined"),
        common::event("u1", 240, "/checkout", "button.retry", "Retry"),
        common::event("u1", 300, "/checkout", "button.cancel", "Cancel"),
    ]);
    let steps = common::path_steps();

    assert_eq!(furthest_step(&sessions[0], &steps), Some(2));
    assert_eq!(counts(&sessions, &steps), vec![1, 1, 1]);
}

#[test]
fn test_products_only_session_stops_at_products() {
    let sessions = sessions_of(vec![
        common::page("u2", 0, "/random"),
        common::page("u2", 30, "/products"),
    ]);

    assert_eq!(counts(&sessions, &common::path_steps()), vec![1, 0, 0]);
}

#[test]
fn test_lookalike_paths_do_not_reach_products() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products-archive"),
        common::page("u2", 0, "/productsale"),
        common::page("u3", 0, "/products/mug"),
    ]);

    let report = build_funnel(&sessions, &common::path_steps());

    assert_eq!(report.steps[0].count, 1);
    assert_eq!(report.unmatched, 2);
}

#[test]
fn test_skipped_and_out_of_order_steps_count_as_reached() {
    let sessions = sessions_of(vec![
        // Checkout before products, cart never visited
        common::page("u1", 0, "/checkout"),
        common::page("u1", 60, "/products/mug"),
    ]);

    let report = build_funnel(&sessions, &common::path_steps());
    let rows: Vec<(usize, usize)> = report.steps.iter().map(|r| (r.count, r.dropped)).collect();

    assert_eq!(rows, vec![(1, 0), (1, 0), (1, 1)]);
}

#[test]
fn test_repeated_step_visits_count_once() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products/a"),
        common::page("u1", 10, "/products/b"),
        common::page("u1", 20, "/products/a"),
    ]);

    assert_eq!(counts(&sessions, &common::path_steps()), vec![1, 0, 0]);
}

#[test]
fn test_unmatched_sessions_excluded_by_default() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products/a"),
        common::page("u2", 0, "/about"),
    ]);

    let report = build_funnel(&sessions, &common::path_steps());

    assert_eq!(report.total_sessions, 2);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.steps[0].count, 1);
    assert_eq!(report.steps[0].conversion_rate, 0.5);
}

#[test]
fn test_count_at_entry_policy() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products/a"),
        common::page("u2", 0, "/about"),
    ]);

    let report = build_funnel_with(&sessions, &common::path_steps(), UnmatchedPolicy::CountAtEntry);

    assert_eq!(report.unmatched, 0);
    assert_eq!(report.steps[0].count, 2);
    assert_eq!(report.steps[0].dropped, 2);
    assert_eq!(report.steps[0].conversion_rate, 1.0);
}

#[test]
fn test_always_true_entry_step_admits_every_session() {
    let mut steps = vec![FunnelStep::new("Visited", EventMatcher::any())];
    steps.extend(common::path_steps());

    let sessions = sessions_of(vec![
        common::page("u1", 0, "/about"),
        common::page("u2", 0, "/cart"),
    ]);

    let report = build_funnel(&sessions, &steps);
    let counts: Vec<usize> = report.steps.iter().map(|r| r.count).collect();

    assert_eq!(report.unmatched, 0);
    assert_eq!(counts, vec![2, 1, 1, 0]);
}

#[test]
fn test_zero_count_rates_are_zero() {
    let sessions = sessions_of(vec![common::page("u1", 0, "/about")]);

    let report = build_funnel(&sessions, &common::path_steps());

    assert!(report.steps.iter().all(|r| r.count == 0));
    assert!(report.steps.iter().all(|r| r.conversion_rate == 0.0));
}

#[test]
fn test_fixture_default_funnel() {
    let sessions = fixture_sessions();
    let config = AnalysisConfig::default();

    let report = build_funnel(&sessions, &config.steps);
    let rows: Vec<(&str, usize, usize)> = report
        .steps
        .iter()
        .map(|r| (r.label.as_str(), r.count, r.dropped))
        .collect();

    assert_eq!(
        rows,
        vec![
            ("Viewed Product", 4, 1),
            ("Added to Cart", 3, 1),
            ("Viewed Cart", 2, 0),
            ("Checkout Started", 2, 1),
            ("Order Placed", 1, 1),
        ]
    );
    assert_eq!(report.total_sessions, 5);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.steps[1].conversion_rate, 0.75);
    assert_eq!(report.steps[4].conversion_rate, 0.5);
    assert_eq!(report.overall_conversion(), 0.25);
}

#[test]
fn test_monotonic_and_bounded() {
    let sessions = fixture_sessions();
    let config = AnalysisConfig::default();

    for report in [
        build_funnel(&sessions, &config.steps),
        build_funnel(&sessions, &common::path_steps()),
        build_funnel_with(&sessions, &config.steps, UnmatchedPolicy::CountAtEntry),
    ] {
        for pair in report.steps.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
        for row in &report.steps {
            assert!((0.0..=1.0).contains(&row.conversion_rate));
        }
        let dropped: usize = report.steps.iter().map(|r| r.dropped).sum();
        assert_eq!(dropped, report.steps[0].count);
    }
}

#[test]
fn test_build_funnel_is_idempotent() {
    let sessions = fixture_sessions();
    let steps = AnalysisConfig::default().steps;

    assert_eq!(build_funnel(&sessions, &steps), build_funnel(&sessions, &steps));
}

#[test]
fn test_step_details_for_cart() {
    let sessions = fixture_sessions();
    let steps = AnalysisConfig::default().steps;

    let details = step_details(&sessions, &steps, 1, UnmatchedPolicy::Exclude).unwrap();

    assert_eq!(details.label, "Added to Cart");
    assert_eq!(details.total, 3);
    assert_eq!(details.moved_forward, 2);
    assert_eq!(details.dropped, 1);
    assert_eq!(details.dropped_sessions, vec!["u4#2".to_string()]);
}

#[test]
fn test_step_details_last_step_and_out_of_range() {
    let sessions = fixture_sessions();
    let steps = AnalysisConfig::default().steps;

    let last = step_details(&sessions, &steps, 4, UnmatchedPolicy::Exclude).unwrap();
    assert_eq!(last.total, 1);
    assert_eq!(last.moved_forward, 0);
    assert_eq!(last.dropped_sessions, vec!["u3#1".to_string()]);

    assert!(step_details(&sessions, &steps, 5, UnmatchedPolicy::Exclude).is_none());
}
