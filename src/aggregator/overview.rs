//! Headline counts about users and their sessions.

use super::session::Session;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverview {
    pub users: usize,
    pub multi_session_users: usize,
    pub single_session_users: usize,
    pub sessions: usize,
    pub events: usize,
}

pub fn user_overview(sessions: &[Session]) -> UserOverview {
    let mut per_user: HashMap<&str, usize> = HashMap::new();
    for session in sessions {
        *per_user.entry(session.user_id.as_str()).or_insert(0) += 1;
    }

    let multi_session_users = per_user.values().filter(|&&n| n > 1).count();

    UserOverview {
        users: per_user.len(),
        multi_session_users,
        single_session_users: per_user.len() - multi_session_users,
        sessions: sessions.len(),
        events: sessions.iter().map(Session::len).sum(),
    }
}
