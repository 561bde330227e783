use crate::loader::load_file;
use crate::utils::config::{AnalysisConfig, SCHEMA_VERSION};
use crate::utils::error::LoadError;
use anyhow::{Context, Result};
use std::path::Path;

/// Load an event log without analysing it and report what was kept
pub fn validate_input_file(file_path: &Path) -> Result<()> {
    println!("Validating event log: {}", file_path.display());

    match load_file(file_path) {
        Ok(loaded) => {
            println!("✓ Valid event log");
            println!("  Events loaded: {}", loaded.events.len());
            println!("  Records skipped: {}", loaded.skipped);
            for rejection in &loaded.rejected {
                println!("    - {}", rejection);
            }
            Ok(())
        }
        Err(LoadError::EmptyInput { skipped }) => {
            println!("✗ No valid events ({} records skipped)", skipped);
            Ok(())
        }
        Err(e) => Err(e).context("Failed to read event log"),
    }
}

/// Print the built-in configuration as TOML
pub fn print_default_config() -> Result<()> {
    let toml = AnalysisConfig::default()
        .to_toml_string()
        .context("Failed to render default config")?;
    println!("{}", toml);
    Ok(())
}

/// Display version information
pub fn display_version() {
    println!("Journey Insights v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Conversion funnel, step drill-down and error insights for storefront event logs.");
}
