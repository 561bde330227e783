//! Split each user's events into sessions.
//!
//! A session is a maximal run of one user's events in which no gap between
//! consecutive events exceeds the idle threshold. A gap exactly equal to the
//! threshold does not split.

use crate::loader::Event;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// How session boundaries are decided
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStrategy {
    /// Split on idle gaps only
    #[default]
    IdleGap,

    /// Also split where the tracker's recorded session id changes.
    /// Pairs of events lacking an id fall back to the idle-gap rule.
    Recorded,
}

/// One user's contiguous run of events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// `"{user_id}#{n}"` (1-based per user), or the recorded session id
    pub id: String,

    pub user_id: String,

    /// Events in chronological order, never empty
    pub events: Vec<Event>,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,
}

impl Session {
    /// Build a session from a non-empty run of events
    ///
    /// **Private** - sessions are only produced by the segmenter
    fn from_run(id: String, events: Vec<Event>) -> Self {
        let first = &events[0];
        let start_time = first.event_time;
        let user_id = first.user_id.clone();
        let end_time = events[events.len() - 1].event_time;

        Self {
            id,
            user_id,
            events,
            start_time,
            end_time,
        }
    }

    /// Time between first and last event (zero for a single event)
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Segment events into idle-gap sessions
///
/// **Public** - main entry point for session building
///
/// # Arguments
/// * `events` - Loader output; each user's events already time-sorted
/// * `idle_threshold` - Largest gap that keeps two events in one session
///
/// # Returns
/// Sessions grouped by user (users in order of first appearance),
/// each user's sessions in chronological order
pub fn segment(events: &[Event], idle_threshold: Duration) -> Vec<Session> {
    segment_with(events, idle_threshold, SessionStrategy::IdleGap)
}

/// Segment events using an explicit [`SessionStrategy`]
///
/// **Public** - used when the tracker's own session ids should be honored
pub fn segment_with(
    events: &[Event],
    idle_threshold: Duration,
    strategy: SessionStrategy,
) -> Vec<Session> {
    debug!(
        "Segmenting {} events (idle threshold {}s, {:?})",
        events.len(),
        idle_threshold.num_seconds(),
        strategy
    );

    let mut sessions = Vec::new();
    // Ids handed out so far, across all users
    let mut used_ids: HashSet<String> = HashSet::new();

    for user_events in group_by_user(events) {
        let mut run: Vec<Event> = Vec::new();
        let mut ordinal = 0usize;

        for event in user_events {
            if let Some(prev) = run.last() {
                if starts_new_session(prev, event, idle_threshold, strategy) {
                    ordinal += 1;
                    let finished = std::mem::take(&mut run);
                    let id = session_id(&finished, ordinal, strategy, &mut used_ids);
                    sessions.push(Session::from_run(id, finished));
                }
            }
            run.push(event.clone());
        }

        if !run.is_empty() {
            ordinal += 1;
            let id = session_id(&run, ordinal, strategy, &mut used_ids);
            sessions.push(Session::from_run(id, run));
        }
    }

    debug!("Built {} sessions", sessions.len());

    sessions
}

/// Group events per user, users in order of first appearance
///
/// **Private** - input order within a user is preserved
fn group_by_user(events: &[Event]) -> Vec<Vec<&Event>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Event>> = Vec::new();

    for event in events {
        let slot = *index.entry(event.user_id.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(event);
    }

    groups
}

/// Decide whether `next` opens a new session after `prev`
///
/// **Private** - boundary rule
fn starts_new_session(
    prev: &Event,
    next: &Event,
    idle_threshold: Duration,
    strategy: SessionStrategy,
) -> bool {
    let idle = next.event_time - prev.event_time > idle_threshold;

    match (strategy, &prev.session_id, &next.session_id) {
        (SessionStrategy::Recorded, Some(a), Some(b)) => idle || a != b,
        _ => idle,
    }
}

/// Pick the id for a finished run
///
/// **Private** - a recorded id is used once across all users; repeats and
/// sessions without one get `"{user_id}#{n}"`
fn session_id(
    run: &[Event],
    ordinal: usize,
    strategy: SessionStrategy,
    used_ids: &mut HashSet<String>,
) -> String {
    let recorded = match strategy {
        SessionStrategy::Recorded => run.iter().find_map(|e| e.session_id.clone()),
        SessionStrategy::IdleGap => None,
    };

    let id = recorded
        .filter(|id| !used_ids.contains(id))
        .unwrap_or_else(|| format!("{}#{}", run[0].user_id, ordinal));

    used_ids.insert(id.clone());
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event_at(user: &str, secs: i64, session: Option<&str>) -> Event {
        Event {
            user_id: user.to_string(),
            session_id: session.map(str::to_string),
            path: "/".to_string(),
            css: String::new(),
            text: String::new(),
            value: None,
            event_time: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_single_event_is_zero_length_session() {
        let sessions = segment(&[event_at("u1", 0, None)], Duration::minutes(30));

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "u1#1");
        assert_eq!(sessions[0].duration(), Duration::zero());
    }

    #[test]
    fn test_users_keep_first_appearance_order() {
        let events = vec![
            event_at("zed", 0, None),
            event_at("amy", 5, None),
            event_at("zed", 10, None),
        ];

        let sessions = segment(&events, Duration::minutes(30));
        let users: Vec<&str> = sessions.iter().map(|s| s.user_id.as_str()).collect();

        assert_eq!(users, vec!["zed", "amy"]);
        assert_eq!(sessions[0].len(), 2);
    }

    #[test]
    fn test_recorded_strategy_splits_on_id_change() {
        let events = vec![
            event_at("u1", 0, Some("s-a")),
            event_at("u1", 10, Some("s-b")),
            event_at("u1", 20, None),
        ];

        let sessions = segment_with(&events, Duration::minutes(30), SessionStrategy::Recorded);

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "s-a");
        assert_eq!(sessions[1].id, "s-b");
        assert_eq!(sessions[1].len(), 2);
    }

    #[test]
    fn test_recorded_id_reused_falls_back_to_ordinal() {
        let events = vec![
            event_at("u1", 0, Some("s-a")),
            event_at("u1", 10, Some("s-b")),
            event_at("u1", 20, Some("s-a")),
        ];

        let sessions = segment_with(&events, Duration::minutes(30), SessionStrategy::Recorded);
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();

        assert_eq!(ids, vec!["s-a", "s-b", "u1#3"]);
    }
}
