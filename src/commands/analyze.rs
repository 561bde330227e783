//! Analysis command implementations.
//!
//! Every command follows the same pipeline:
//! 1. Loads the analysis config
//! 2. Loads and validates the event log
//! 3. Segments events into sessions
//! 4. Runs the requested aggregation(s)
//! 5. Prints tables and/or writes the JSON report

use super::models::{AnalyzeArgs, InspectArgs};
use crate::aggregator::{
    build_funnel_with, classify_errors, events_at_step_grouped, find_step, loss_reasons,
    segment_with, step_details, user_overview, FunnelStep, Session,
};
use crate::loader::{load_file, LoadedEvents};
use crate::output::{
    render_errors, render_funnel, render_loss_reasons, render_overview, render_step_details,
    validate_path, write_report, AnalysisReport,
};
use crate::utils::config::{load_config_or_default, AnalysisConfig, SCHEMA_VERSION};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{debug, info};
use std::path::Path;
use std::time::Instant;

/// Loaded events, their sessions and the config that produced them
#[derive(Debug, Clone)]
pub struct Analysis {
    pub config: AnalysisConfig,
    pub loaded: LoadedEvents,
    pub sessions: Vec<Session>,
}

/// Load config and events, then segment
///
/// **Public** - shared first half of every command
///
/// # Errors
/// * Config file unreadable or invalid
/// * Event log unreadable, or no valid events in it
pub fn prepare(input: &Path, config: Option<&Path>) -> Result<Analysis> {
    let config = load_config_or_default(config).context("Failed to load analysis config")?;

    let loaded = load_file(input)
        .with_context(|| format!("Failed to load events from {}", input.display()))?;

    let sessions = segment_with(&loaded.events, config.idle_threshold(), config.session_strategy);

    debug!(
        "Prepared {} events into {} sessions",
        loaded.events.len(),
        sessions.len()
    );

    Ok(Analysis {
        config,
        loaded,
        sessions,
    })
}

/// Run every aggregation and assemble the report
///
/// **Public** - pure; no I/O
pub fn build_report(analysis: &Analysis, source: &str) -> AnalysisReport {
    let config = &analysis.config;
    let sessions = &analysis.sessions;

    AnalysisReport {
        version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        source: source.to_string(),
        events_loaded: analysis.loaded.events.len(),
        records_skipped: analysis.loaded.skipped,
        overview: user_overview(sessions),
        funnel: build_funnel_with(sessions, &config.steps, config.unmatched),
        errors: classify_errors(sessions, &config.errors),
        loss_reasons: loss_reasons(sessions, &config.entry_matcher(), &config.errors),
    }
}

/// Validate analyze arguments before doing any work
///
/// # Errors
/// * Input file missing
/// * Output path empty or a directory
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if !args.input.is_file() {
        bail!("Input file not found: {}", args.input.display());
    }

    if let Some(config) = &args.config {
        if !config.is_file() {
            bail!("Config file not found: {}", config.display());
        }
    }

    if let Some(output) = &args.output {
        validate_path(output).context("Invalid output path")?;
    }

    Ok(())
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
pub fn execute_analyze(args: AnalyzeArgs) -> Result<()> {
    let start_time = Instant::now();

    info!("Step 1/3: Loading events from {}...", args.input.display());
    let analysis = prepare(&args.input, args.config.as_deref())?;

    info!("Step 2/3: Aggregating {} sessions...", analysis.sessions.len());
    let report = build_report(&analysis, &args.input.display().to_string());

    info!("Step 3/3: Writing output...");
    if let Some(output) = &args.output {
        write_report(&report, output).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", output.display());
    }

    if args.print_summary {
        print_skipped(report.records_skipped);
        println!("{}", render_overview(&report.overview));
        println!();
        println!("{}", render_funnel(&report.funnel));
        println!();
        println!("{}", render_errors(&report.errors));
        println!();
        println!("{}", render_loss_reasons(&report.loss_reasons));
    }

    info!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Execute the funnel command
pub fn execute_funnel(input: &Path, config: Option<&Path>) -> Result<()> {
    let analysis = prepare(input, config)?;
    let report = build_funnel_with(&analysis.sessions, &analysis.config.steps, analysis.config.unmatched);

    print_skipped(analysis.loaded.skipped);
    println!("{}", render_funnel(&report));

    Ok(())
}

/// Execute the insights command
pub fn execute_insights(input: &Path, config: Option<&Path>) -> Result<()> {
    let analysis = prepare(input, config)?;
    let errors = classify_errors(&analysis.sessions, &analysis.config.errors);
    let reasons = loss_reasons(
        &analysis.sessions,
        &analysis.config.entry_matcher(),
        &analysis.config.errors,
    );

    print_skipped(analysis.loaded.skipped);
    println!("{}", render_errors(&errors));
    println!();
    println!("{}", render_loss_reasons(&reasons));

    Ok(())
}

/// Execute the inspect command
///
/// # Errors
/// * `--step` names no configured step
pub fn execute_inspect(args: InspectArgs) -> Result<()> {
    let analysis = prepare(&args.input, args.config.as_deref())?;
    let steps = &analysis.config.steps;

    let (index, step) = resolve_step(steps, &args.step)?;

    let details = step_details(&analysis.sessions, steps, index, analysis.config.unmatched)
        .context("Step index out of range")?;
    let events = events_at_step_grouped(&analysis.sessions, step);

    print_skipped(analysis.loaded.skipped);
    println!("{}", render_step_details(&details, &events, args.limit));

    Ok(())
}

/// Find a step by label or 1-based number
///
/// **Public** - exposed for command tests
pub fn resolve_step<'a>(steps: &'a [FunnelStep], selector: &str) -> Result<(usize, &'a FunnelStep)> {
    if let Some(found) = find_step(steps, selector) {
        return Ok(found);
    }

    if let Ok(number) = selector.trim().parse::<usize>() {
        if let Some(step) = number.checked_sub(1).and_then(|i| steps.get(i)) {
            return Ok((number - 1, step));
        }
    }

    let labels: Vec<&str> = steps.iter().map(|s| s.label.as_str()).collect();
    bail!("Unknown step '{}'. Available steps: {}", selector, labels.join(", "))
}

/// **Private** - surface skip counts instead of hiding them
fn print_skipped(skipped: usize) {
    if skipped > 0 {
        println!("  ⚠️  {} malformed records were skipped", skipped);
    }
}
