//! CLI command implementations.
//!
//! Commands orchestrate the various library components to perform user tasks.

pub mod analyze;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use analyze::{
    build_report, execute_analyze, execute_funnel, execute_insights, execute_inspect, prepare,
    resolve_step, validate_args, Analysis,
};
pub use models::{AnalyzeArgs, InspectArgs};
pub use utils::{display_version, print_default_config, validate_input_file};
