//! Journey Insights
//!
//! Turns a storefront interaction log into three views:
//! a step-by-step conversion funnel, per-step event drill-down,
//! and an aggregated error/insight summary.
//!
//! ## Pipeline
//!
//! ```text
//! load -> segment -> build_funnel / events_at_step / classify_errors
//! ```
//!
//! The analytical functions are pure and share no state; each can be
//! called on its own immutable session set.
//!
//! ```ignore
//! use journey_insights::aggregator::{build_funnel, segment};
//! use journey_insights::loader::load_file;
//! use journey_insights::utils::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let loaded = load_file("sessions.json")?;
//! let sessions = segment(&loaded.events, config.idle_threshold());
//! let funnel = build_funnel(&sessions, &config.steps);
//! ```

pub mod aggregator;
pub mod commands;
pub mod loader;
pub mod output;
pub mod utils;
