//! Aggregation of loaded events into sessions, funnels and insights.
//!
//! This module transforms the loader's event table into:
//! - Sessions (idle-gap segmentation)
//! - A conversion funnel with per-step drill-down
//! - Error categories and loss reasons
//!
//! Every entry point is a pure function over borrowed, immutable input.

pub mod classifier;
pub mod funnel;
pub mod inspector;
pub mod matcher;
pub mod overview;
pub mod reasons;
pub mod session;

// Re-export main types and functions
pub use classifier::{classify_errors, CategoryRule, CategoryStats, ErrorOccurrence, ErrorReport, ErrorRules};
pub use funnel::{
    build_funnel, build_funnel_with, find_step, furthest_step, step_details, FunnelReport, FunnelRow,
    FunnelStep, StepDetails, UnmatchedPolicy,
};
pub use inspector::{events_at_step, events_at_step_grouped, session_by_id, SessionEvents};
pub use matcher::{EventMatcher, Matcher};
pub use overview::{user_overview, UserOverview};
pub use reasons::{loss_reasons, LossReason};
pub use session::{segment, segment_with, Session, SessionStrategy};
