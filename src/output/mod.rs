//! Output writers for analysis reports.
//!
//! This module handles:
//! - Versioned JSON reports (write and read back)
//! - Plain-text tables for the terminal

pub mod json;
pub mod schema;
pub mod text;

// Re-export main functions
pub use json::{read_report, report_to_string, validate_path, write_report};
pub use schema::AnalysisReport;
pub use text::{render_errors, render_funnel, render_loss_reasons, render_overview, render_step_details};
