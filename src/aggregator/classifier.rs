//! Error classification for the insights view.
//!
//! An event is error-like when it matches one of the error signatures or any
//! category rule. Each error-like event lands in exactly one bucket: the first
//! matching rule, or `uncategorized`. Summing occurrences over all buckets
//! therefore gives the number of error-like events.

use super::matcher::{matches_any, EventMatcher, Matcher};
use super::session::Session;
use crate::loader::Event;
use crate::utils::config::UNCATEGORIZED_LABEL;
use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Maps matching events to a category label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub label: String,

    #[serde(flatten)]
    pub rule: EventMatcher,
}

impl CategoryRule {
    pub fn new(label: impl Into<String>, rule: EventMatcher) -> Self {
        Self {
            label: label.into(),
            rule,
        }
    }
}

/// Everything the classifier needs to know
///
/// Fields missing from a config file keep their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRules {
    /// Generic error shapes (e.g. an error banner's selector)
    pub signatures: Vec<EventMatcher>,

    /// Checked in order; first match wins
    pub categories: Vec<CategoryRule>,

    /// Marks a completed purchase
    pub purchase: EventMatcher,
}

impl Default for ErrorRules {
    fn default() -> Self {
        let banner = || Matcher::contains("error-message");
        let phrase = |p: &str| Matcher::contains_ignore_case(p);

        Self {
            signatures: vec![EventMatcher::on_css(banner())],
            categories: vec![
                CategoryRule::new("Payment declined", EventMatcher::on_text(phrase("declined"))),
                CategoryRule::new("Out of stock", EventMatcher::on_text(phrase("out of stock"))),
                CategoryRule::new("Out of stock", EventMatcher::on_text(phrase("unavailable"))),
                CategoryRule::new(
                    "Invalid input",
                    EventMatcher::on_css(banner()).with_text(phrase("invalid")),
                ),
                CategoryRule::new(
                    "Invalid input",
                    EventMatcher::on_css(banner()).with_text(phrase("required")),
                ),
                CategoryRule::new(
                    "Server error",
                    EventMatcher::on_css(banner()).with_text(phrase("try again")),
                ),
            ],
            purchase: EventMatcher::on_path(Matcher::exact("/checkout"))
                .with_css(Matcher::exact("button.place-order")),
        }
    }
}

impl ErrorRules {
    /// Bucket for an event, or `None` when it is not error-like
    pub fn categorize<'a>(&'a self, event: &Event) -> Option<&'a str> {
        if let Some(rule) = self.categories.iter().find(|c| c.rule.matches(event)) {
            return Some(rule.label.as_str());
        }

        matches_any(&self.signatures, event).then_some(UNCATEGORIZED_LABEL)
    }

    pub fn is_error_like(&self, event: &Event) -> bool {
        self.categorize(event).is_some()
    }
}

/// One tagged error event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorOccurrence {
    pub category: String,
    pub session_id: String,
    pub user_id: String,
    pub path: String,
    pub text: String,
    pub event_time: DateTime<Utc>,

    /// A purchase event appears later in the same session
    pub followed_by_purchase: bool,
}

/// Per-category totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub label: String,

    /// Tagged events in this category
    pub occurrences: usize,

    /// Distinct sessions with at least one occurrence
    pub sessions: usize,

    /// Occurrences with no later purchase in their session
    pub abandoned: usize,

    /// `abandoned / occurrences`, 0 when there are none
    pub abandonment_rate: f64,
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Configured categories in rule order, then `uncategorized`
    pub categories: Vec<CategoryStats>,

    /// Number of error-like events
    pub total_errors: usize,

    /// Every occurrence in session order
    pub occurrences: Vec<ErrorOccurrence>,
}

impl ErrorReport {
    pub fn category(&self, label: &str) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.label == label)
    }
}

/// Running totals for one category
///
/// **Private** - internal accumulator
struct Bucket {
    label: String,
    occurrences: usize,
    abandoned: usize,
    sessions: BTreeSet<String>,
}

impl Bucket {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            occurrences: 0,
            abandoned: 0,
            sessions: BTreeSet::new(),
        }
    }

    fn into_stats(self) -> CategoryStats {
        CategoryStats {
            abandonment_rate: super::funnel::rate(self.abandoned, self.occurrences),
            label: self.label,
            occurrences: self.occurrences,
            sessions: self.sessions.len(),
            abandoned: self.abandoned,
        }
    }
}

/// Tag and aggregate error events across sessions
///
/// **Public** - main entry point for the insights view
///
/// # Arguments
/// * `sessions` - Output of the segmenter
/// * `rules` - Signatures, category rules and purchase signature
///
/// # Returns
/// Category totals plus the individual occurrences
pub fn classify_errors(sessions: &[Session], rules: &ErrorRules) -> ErrorReport {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    let configured = rules.categories.iter().map(|c| c.label.as_str());
    for label in configured.chain(std::iter::once(UNCATEGORIZED_LABEL)) {
        if !slots.contains_key(label) {
            slots.insert(label.to_string(), buckets.len());
            buckets.push(Bucket::new(label));
        }
    }

    let mut occurrences = Vec::new();

    for session in sessions {
        let last_purchase = session.events.iter().rposition(|e| rules.purchase.matches(e));

        for (position, event) in session.events.iter().enumerate() {
            let Some(label) = rules.categorize(event) else {
                continue;
            };

            let followed_by_purchase = last_purchase.is_some_and(|p| p > position);
            let bucket = &mut buckets[slots[label]];
            bucket.occurrences += 1;
            if !followed_by_purchase {
                bucket.abandoned += 1;
            }
            bucket.sessions.insert(session.id.clone());

            occurrences.push(ErrorOccurrence {
                category: label.to_string(),
                session_id: session.id.clone(),
                user_id: session.user_id.clone(),
                path: event.path.clone(),
                text: event.text.clone(),
                event_time: event.event_time,
                followed_by_purchase,
            });
        }
    }

    debug!("Classified {} error events", occurrences.len());

    ErrorReport {
        categories: buckets.into_iter().map(Bucket::into_stats).collect(),
        total_errors: occurrences.len(),
        occurrences,
    }
}
