mod common;

use chrono::Duration;
use journey_insights::aggregator::{
    classify_errors, loss_reasons, segment, user_overview, CategoryRule, EventMatcher, ErrorRules,
    Matcher, Session, UserOverview,
};
use journey_insights::loader::{load_file, Event};
use journey_insights::utils::config::{AnalysisConfig, NO_ERROR_REASON, UNCATEGORIZED_LABEL};
use pretty_assertions::assert_eq;

fn fixture_sessions() -> Vec<Session> {
    let loaded = load_file(common::fixture("sessions.jsonl")).unwrap();
    segment(&loaded.events, Duration::minutes(30))
}

fn sessions_of(events: Vec<Event>) -> Vec<Session> {
    segment(&events, Duration::minutes(30))
}

fn banner(user: &str, secs: i64, path: &str, text: &str) -> Event {
    common::event(user, secs, path, "div.error-message", text)
}

fn place_order(user: &str, secs: i64) -> Event {
    common::event(user, secs, "/checkout", "button.place-order", "Place order")
}

#[test]
fn test_declined_payment_then_cancel_is_abandoned() {
    let sessions = sessions_of(vec![
        common::page("u1", 0, "/products/headphones-xyz"),
        common::page("u1", 60, "/checkout"),
        banner("u1", 120, "/checkout", "Payment declined"),
        common::event("u1", 180, "/checkout", "button.cancel", "Cancel"),
    ]);

    let report = classify_errors(&sessions, &ErrorRules::default());

    assert_eq!(report.total_errors, 1);
    assert!(!report.occurrences[0].followed_by_purchase);

    let declined = report.category("Payment declined").unwrap();
    assert_eq!(declined.occurrences, 1);
    assert_eq!(declined.sessions, 1);
    assert_eq!(declined.abandoned, 1);
    assert_eq!(declined.abandonment_rate, 1.0);
}

#[test]
fn test_error_recovered_by_later_purchase() {
    let sessions = sessions_of(vec![
        banner("u1", 0, "/checkout", "Payment declined"),
        place_order("u1", 60),
        banner("u1", 120, "/checkout", "Card was declined again"),
    ]);

    let report = classify_errors(&sessions, &ErrorRules::default());
    let followed: Vec<bool> = report.occurrences.iter().map(|o| o.followed_by_purchase).collect();

    // Only the error before the purchase counts as recovered
    assert_eq!(followed, vec![true, false]);

    let declined = report.category("Payment declined").unwrap();
    assert_eq!(declined.occurrences, 2);
    assert_eq!(declined.sessions, 1);
    assert_eq!(declined.abandoned, 1);
    assert_eq!(declined.abandonment_rate, 0.5);
}

#[test]
fn test_purchase_in_another_session_does_not_count() {
    let sessions = sessions_of(vec![
        banner("u1", 0, "/checkout", "Payment declined"),
        place_order("u1", 4000),
    ]);

    let report = classify_errors(&sessions, &ErrorRules::default());

    assert_eq!(sessions.len(), 2);
    assert!(!report.occurrences[0].followed_by_purchase);
}

#[test]
fn test_occurrences_sum_to_error_like_events() {
    let sessions = sessions_of(vec![
        banner("u1", 0, "/checkout", "Payment declined"),
        banner("u1", 10, "/checkout", "Field is required"),
        banner("u1", 20, "/checkout", "Something odd"),
        common::event("u1", 30, "/cart", "span.notice", "Item unavailable"),
        common::page("u1", 40, "/cart"),
        banner("u2", 0, "/checkout", "Please try again later"),
    ]);
    let rules = ErrorRules::default();

    let report = classify_errors(&sessions, &rules);
    let error_like = sessions
        .iter()
        .flat_map(|s| s.events.iter())
        .filter(|e| rules.is_error_like(e))
        .count();
    let summed: usize = report.categories.iter().map(|c| c.occurrences).sum();

    assert_eq!(report.total_errors, 5);
    assert_eq!(summed, error_like);
    assert_eq!(summed, report.total_errors);

    let counts: Vec<(&str, usize)> = report
        .categories
        .iter()
        .map(|c| (c.label.as_str(), c.occurrences))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("Payment declined", 1),
            ("Out of stock", 1),
            ("Invalid input", 1),
            ("Server error", 1),
            (UNCATEGORIZED_LABEL, 1),
        ]
    );
}

#[test]
fn test_categories_listed_even_when_empty() {
    let report = classify_errors(&[], &ErrorRules::default());

    assert_eq!(report.total_errors, 0);
    assert_eq!(report.categories.len(), 5);
    assert!(report.categories.iter().all(|c| c.abandonment_rate == 0.0));
}

#[test]
fn test_custom_rules_with_pattern() {
    let rules = ErrorRules {
        signatures: vec![],
        categories: vec![CategoryRule::new(
            "Timeout",
            EventMatcher::on_text(Matcher::pattern(r"(?i)timed?\s*out").unwrap()),
        )],
        purchase: EventMatcher::on_css(Matcher::exact("button.buy")),
    };
    let sessions = sessions_of(vec![
        common::event("u1", 0, "/pay", "p", "Request timed out"),
        common::event("u1", 10, "/pay", "div.error-message", "Payment declined"),
    ]);

    let report = classify_errors(&sessions, &rules);

    assert_eq!(report.total_errors, 1);
    assert_eq!(report.occurrences[0].category, "Timeout");
}

#[test]
fn test_fixture_errors() {
    let sessions = fixture_sessions();

    let report = classify_errors(&sessions, &ErrorRules::default());
    let tagged: Vec<(&str, &str)> = report
        .occurrences
        .iter()
        .map(|o| (o.session_id.as_str(), o.category.as_str()))
        .collect();

    assert_eq!(tagged, vec![("u1#1", "Payment declined"), ("u4#2", "Out of stock")]);
    assert_eq!(report.category("Out of stock").unwrap().abandoned, 1);
    assert_eq!(report.category(UNCATEGORIZED_LABEL).unwrap().occurrences, 0);
}

#[test]
fn test_fixture_loss_reasons() {
    let sessions = fixture_sessions();
    let config = AnalysisConfig::default();

    let reasons = loss_reasons(&sessions, &config.entry_matcher(), &config.errors);
    let summary: Vec<(&str, usize, Vec<String>)> = reasons
        .iter()
        .map(|r| (r.reason.as_str(), r.count, r.sessions.clone()))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("/cart - Item out of stock", 1, vec!["u4#2".to_string()]),
            ("/checkout - Payment declined", 1, vec!["u1#1".to_string()]),
            (NO_ERROR_REASON, 1, vec!["u2#1".to_string()]),
        ]
    );
}

#[test]
fn test_loss_reasons_sorted_by_count_and_use_first_error() {
    let sessions = sessions_of(vec![
        common::page("a", 0, "/products/x"),
        banner("a", 10, "/checkout", "Payment declined"),
        banner("a", 20, "/cart", "Item out of stock"),
        common::page("b", 0, "/products/x"),
        banner("b", 10, "/checkout", "Payment declined"),
        common::page("c", 0, "/products/x"),
        banner("c", 10, "", ""),
        common::page("d", 0, "/about"),
        banner("d", 10, "/checkout", "Payment declined"),
    ]);
    let config = AnalysisConfig::default();

    let reasons = loss_reasons(&sessions, &config.entry_matcher(), &config.errors);
    let summary: Vec<(&str, usize)> = reasons.iter().map(|r| (r.reason.as_str(), r.count)).collect();

    // "d" never entered the funnel
    assert_eq!(summary, vec![("/checkout - Payment declined", 2), ("/ - Error", 1)]);
}

#[test]
fn test_fixture_overview() {
    let overview = user_overview(&fixture_sessions());

    assert_eq!(
        overview,
        UserOverview {
            users: 4,
            multi_session_users: 1,
            single_session_users: 3,
            sessions: 5,
            events: 17,
        }
    );
}
