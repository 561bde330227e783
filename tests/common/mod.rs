#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use journey_insights::aggregator::{EventMatcher, FunnelStep, Matcher};
use journey_insights::loader::Event;
use std::path::PathBuf;

/// Base time plus `secs`
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::seconds(secs)
}

pub fn event(user: &str, secs: i64, path: &str, css: &str, text: &str) -> Event {
    Event {
        user_id: user.to_string(),
        session_id: None,
        path: path.to_string(),
        css: css.to_string(),
        text: text.to_string(),
        value: None,
        event_time: at(secs),
    }
}

pub fn page(user: &str, secs: i64, path: &str) -> Event {
    event(user, secs, path, "a.link", "")
}

/// `/products/*` -> `/cart` -> `/checkout`
pub fn path_steps() -> Vec<FunnelStep> {
    ["/products/*", "/cart", "/checkout"]
        .iter()
        .map(|p| FunnelStep::new(*p, EventMatcher::on_path(Matcher::from_shorthand(p))))
        .collect()
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}
