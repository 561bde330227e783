//! Per-step event drill-down.

use super::funnel::FunnelStep;
use super::session::Session;
use crate::loader::Event;
use serde::{Deserialize, Serialize};

/// Matching events of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvents {
    pub session_id: String,
    pub user_id: String,
    pub events: Vec<Event>,
}

/// Every event that matches `step`, session by session
///
/// **Public** - main entry point for drill-down
///
/// Events keep session order and, within a session, chronological order.
/// Empty when no session reaches the step.
pub fn events_at_step(sessions: &[Session], step: &FunnelStep) -> Vec<Event> {
    sessions
        .iter()
        .flat_map(|session| session.events.iter())
        .filter(|event| step.matches(event))
        .cloned()
        .collect()
}

/// Same as [`events_at_step`], grouped per session
///
/// Sessions with no matching event are left out.
pub fn events_at_step_grouped(sessions: &[Session], step: &FunnelStep) -> Vec<SessionEvents> {
    sessions
        .iter()
        .filter_map(|session| {
            let events: Vec<Event> = session
                .events
                .iter()
                .filter(|event| step.matches(event))
                .cloned()
                .collect();

            (!events.is_empty()).then(|| SessionEvents {
                session_id: session.id.clone(),
                user_id: session.user_id.clone(),
                events,
            })
        })
        .collect()
}

pub fn session_by_id<'a>(sessions: &'a [Session], id: &str) -> Option<&'a Session> {
    sessions.iter().find(|s| s.id == id)
}
