//! Report JSON schema.
//!
//! This module defines the structure of report files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::{ErrorReport, FunnelReport, LossReason, UserOverview};
use serde::{Deserialize, Serialize};

/// Top-level report written to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// When the report was generated (RFC 3339)
    pub generated_at: String,

    /// Where the events came from
    pub source: String,

    pub events_loaded: usize,

    pub records_skipped: usize,

    pub overview: UserOverview,

    pub funnel: FunnelReport,

    pub errors: ErrorReport,

    pub loss_reasons: Vec<LossReason>,
}
