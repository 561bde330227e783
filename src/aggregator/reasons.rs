//! Why sessions that entered the funnel never converted.
//!
//! Each non-converting session gets one reason: its first error-like event,
//! labelled `"{path} - {text}"`, or `"No error"` when it saw none.

use super::classifier::ErrorRules;
use super::matcher::EventMatcher;
use super::session::Session;
use crate::loader::Event;
use crate::utils::config::{DEFAULT_ERROR_PATH, DEFAULT_ERROR_TEXT, NO_ERROR_REASON};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sessions lost for one reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossReason {
    pub reason: String,
    pub count: usize,

    /// Session ids, sorted
    pub sessions: Vec<String>,
}

/// Group entered-but-not-converted sessions by reason
///
/// **Public** - insights view
///
/// # Arguments
/// * `sessions` - Output of the segmenter
/// * `entry` - A session entered if any event matches this
/// * `rules` - Error-like events and the purchase signature that counts as converted
///
/// # Returns
/// Reasons sorted by count (descending), then by label
pub fn loss_reasons(sessions: &[Session], entry: &EventMatcher, rules: &ErrorRules) -> Vec<LossReason> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for session in sessions {
        let entered = session.events.iter().any(|e| entry.matches(e));
        let converted = session.events.iter().any(|e| rules.purchase.matches(e));
        if !entered || converted {
            continue;
        }

        let reason = session
            .events
            .iter()
            .find(|e| rules.is_error_like(e))
            .map(reason_label)
            .unwrap_or_else(|| NO_ERROR_REASON.to_string());

        grouped.entry(reason).or_default().push(session.id.clone());
    }

    let mut reasons: Vec<LossReason> = grouped
        .into_iter()
        .map(|(reason, mut sessions)| {
            sessions.sort();
            LossReason {
                reason,
                count: sessions.len(),
                sessions,
            }
        })
        .collect();

    // BTreeMap already ordered labels; stable sort keeps that for equal counts
    reasons.sort_by(|a, b| b.count.cmp(&a.count));
    reasons
}

/// **Private** - `"{path} - {text}"` with fallbacks for empty fields
fn reason_label(event: &Event) -> String {
    let path = if event.path.is_empty() { DEFAULT_ERROR_PATH } else { event.path.as_str() };
    let text = if event.text.is_empty() { DEFAULT_ERROR_TEXT } else { event.text.as_str() };
    format!("{} - {}", path, text)
}
