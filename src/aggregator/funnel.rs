//! Conversion funnel over sessions.
//!
//! Each session is scored by the furthest step it reached. Reaching step `k`
//! counts as reaching every step before it, whatever the visit order, so
//! `count[i] >= count[i + 1]` always holds.

use super::matcher::EventMatcher;
use super::session::Session;
use crate::loader::Event;
use log::debug;
use serde::{Deserialize, Serialize};

/// One canonical stage of the conversion path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStep {
    /// Display label, e.g. "Viewed Product"
    pub label: String,

    /// Which events mark this step as reached
    #[serde(flatten)]
    pub rule: EventMatcher,
}

impl FunnelStep {
    pub fn new(label: impl Into<String>, rule: EventMatcher) -> Self {
        Self {
            label: label.into(),
            rule,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.rule.matches(event)
    }
}

/// What to do with sessions that match no step at all
///
/// A site-root entry step that every session starts at is written as a step
/// with no matcher fields (`EventMatcher::any()`). A step with `path = "/"`
/// only matches events on the root path itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Leave them out of every step and report them as unmatched
    #[default]
    Exclude,

    /// Count them as having entered the first step
    CountAtEntry,
}

/// One row of the funnel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelRow {
    pub label: String,

    /// Sessions whose furthest step is this one or later
    pub count: usize,

    /// `count / previous count`; the first row is relative to all sessions.
    /// Zero when the denominator is zero.
    pub conversion_rate: f64,

    /// Sessions whose furthest step is exactly this one
    pub dropped: usize,
}

/// Funnel over a whole session set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelReport {
    pub steps: Vec<FunnelRow>,

    /// Every session considered, matched or not
    pub total_sessions: usize,

    /// Sessions that matched no step (always 0 under `CountAtEntry`)
    pub unmatched: usize,
}

impl FunnelReport {
    /// Sessions that reached the last step over those that entered
    pub fn overall_conversion(&self) -> f64 {
        match (self.steps.first(), self.steps.last()) {
            (Some(first), Some(last)) => rate(last.count, first.count),
            _ => 0.0,
        }
    }
}

/// Drill-down numbers for one step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDetails {
    pub index: usize,

    pub label: String,

    /// Sessions at this step or beyond
    pub total: usize,

    /// Sessions that went on to the next step (0 for the last step)
    pub moved_forward: usize,

    /// `total - moved_forward`
    pub dropped: usize,

    /// Ids of the dropped sessions, sorted
    pub dropped_sessions: Vec<String>,
}

/// Highest step index matched by any event of the session
///
/// **Public** - also used by the CLI drill-down
pub fn furthest_step(session: &Session, steps: &[FunnelStep]) -> Option<usize> {
    (0..steps.len())
        .rev()
        .find(|&i| session.events.iter().any(|e| steps[i].matches(e)))
}

/// Furthest step after applying the unmatched policy
///
/// **Private** - `None` means the session is outside the funnel
fn reached_step(session: &Session, steps: &[FunnelStep], policy: UnmatchedPolicy) -> Option<usize> {
    if steps.is_empty() {
        return None;
    }

    match (furthest_step(session, steps), policy) {
        (Some(i), _) => Some(i),
        (None, UnmatchedPolicy::CountAtEntry) => Some(0),
        (None, UnmatchedPolicy::Exclude) => None,
    }
}

/// Build the funnel, excluding sessions that match no step
///
/// **Public** - main entry point for funnel building
///
/// # Arguments
/// * `sessions` - Output of the segmenter
/// * `steps` - Ordered step definitions
///
/// # Returns
/// One row per step, in step order
pub fn build_funnel(sessions: &[Session], steps: &[FunnelStep]) -> FunnelReport {
    build_funnel_with(sessions, steps, UnmatchedPolicy::Exclude)
}

/// Build the funnel with an explicit [`UnmatchedPolicy`]
///
/// **Public** - counts are integers, each rate is computed once from two counts
pub fn build_funnel_with(
    sessions: &[Session],
    steps: &[FunnelStep],
    policy: UnmatchedPolicy,
) -> FunnelReport {
    debug!("Building funnel of {} steps over {} sessions", steps.len(), sessions.len());

    // Sessions ending exactly at each step
    let mut ended_at = vec![0usize; steps.len()];
    let mut unmatched = 0usize;

    for session in sessions {
        match reached_step(session, steps, policy) {
            Some(i) => ended_at[i] += 1,
            None => unmatched += 1,
        }
    }

    let counts = reach_counts(&ended_at);

    let rows = steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            let previous = if i == 0 { sessions.len() } else { counts[i - 1] };
            FunnelRow {
                label: step.label.clone(),
                count: counts[i],
                conversion_rate: rate(counts[i], previous),
                dropped: ended_at[i],
            }
        })
        .collect();

    FunnelReport {
        steps: rows,
        total_sessions: sessions.len(),
        unmatched,
    }
}

/// Suffix sums: sessions reaching each step or beyond
///
/// **Private** - internal aggregation
fn reach_counts(ended_at: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; ended_at.len()];
    let mut running = 0;
    for i in (0..ended_at.len()).rev() {
        running += ended_at[i];
        counts[i] = running;
    }
    counts
}

/// Drill-down for the step at `index`
///
/// **Public** - "who moved forward and who didn't" view
///
/// # Returns
/// `None` when `index` is out of range
pub fn step_details(
    sessions: &[Session],
    steps: &[FunnelStep],
    index: usize,
    policy: UnmatchedPolicy,
) -> Option<StepDetails> {
    let step = steps.get(index)?;

    let mut total = 0;
    let mut moved_forward = 0;
    let mut dropped_sessions = Vec::new();

    for session in sessions {
        let Some(reached) = reached_step(session, steps, policy) else {
            continue;
        };
        if reached < index {
            continue;
        }

        total += 1;
        if reached > index {
            moved_forward += 1;
        } else {
            dropped_sessions.push(session.id.clone());
        }
    }

    dropped_sessions.sort();

    Some(StepDetails {
        index,
        label: step.label.clone(),
        total,
        moved_forward,
        dropped: total - moved_forward,
        dropped_sessions,
    })
}

/// Look a step up by label, ignoring ASCII case
pub fn find_step<'a>(steps: &'a [FunnelStep], label: &str) -> Option<(usize, &'a FunnelStep)> {
    steps
        .iter()
        .enumerate()
        .find(|(_, step)| step.label.eq_ignore_ascii_case(label.trim()))
}

/// Ratio of two counts, 0 when the denominator is 0
pub fn rate(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
