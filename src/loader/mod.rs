//! Event log loading and normalization.
//!
//! This module handles:
//! - Reading JSON array or JSON Lines event sources
//! - Validating required fields per record
//! - Normalizing timestamps to second resolution
//! - Sorting events by user, time and ingestion order

pub mod event_log;
pub mod schema;

// Re-export main types
pub use event_log::{load, load_file, load_str, parse_event_time, LoadedEvents};
pub use schema::Event;
