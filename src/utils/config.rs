//! Configuration and constants.
//!
//! Analysis inputs (funnel steps, idle threshold, error rules) are supplied by
//! the caller through [`AnalysisConfig`], optionally loaded from TOML.
//! The default reproduces the storefront funnel:
//! product view, add to cart, cart, checkout, order placed.

use crate::aggregator::classifier::ErrorRules;
use crate::aggregator::funnel::{FunnelStep, UnmatchedPolicy};
use crate::aggregator::matcher::{EventMatcher, Matcher};
use crate::aggregator::session::SessionStrategy;
use crate::utils::error::ConfigError;
use chrono::Duration;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default idle gap that still keeps events in one session (30 minutes)
pub const DEFAULT_IDLE_THRESHOLD_SECS: i64 = 30 * 60;

/// Bucket for error-like events that fail every category rule
pub const UNCATEGORIZED_LABEL: &str = "uncategorized";

/// Loss reason for sessions without any error event
pub const NO_ERROR_REASON: &str = "No error";
pub const DEFAULT_ERROR_PATH: &str = "/";
pub const DEFAULT_ERROR_TEXT: &str = "Error";

// Integer timestamps at or above this magnitude are epoch milliseconds
pub const EPOCH_MILLIS_THRESHOLD: u64 = 100_000_000_000;

pub const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// Field names for record parsing (exporters disagree on casing)
pub const USER_ID_FIELD_NAMES: &[&str] = &["user_id", "userId"];
pub const SESSION_ID_FIELD_NAMES: &[&str] = &["session_id", "sessionId"];
pub const PATH_FIELD_NAMES: &[&str] = &["path"];
pub const CSS_FIELD_NAMES: &[&str] = &["css"];
pub const TEXT_FIELD_NAMES: &[&str] = &["text"];
pub const VALUE_FIELD_NAMES: &[&str] = &["value"];
pub const EVENT_TIME_FIELD_NAMES: &[&str] = &["event_time", "eventTime", "timestamp"];

/// Complete analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest gap (seconds) between events of one session
    pub idle_threshold_secs: i64,

    pub session_strategy: SessionStrategy,

    /// Treatment of sessions that match no funnel step
    pub unmatched: UnmatchedPolicy,

    /// Ordered funnel steps
    pub steps: Vec<FunnelStep>,

    /// Error signatures, categories and purchase signature
    pub errors: ErrorRules,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            idle_threshold_secs: DEFAULT_IDLE_THRESHOLD_SECS,
            session_strategy: SessionStrategy::default(),
            unmatched: UnmatchedPolicy::default(),
            steps: default_steps(),
            errors: ErrorRules::default(),
        }
    }
}

/// **Private** - storefront funnel used when no config file is given
fn default_steps() -> Vec<FunnelStep> {
    vec![
        FunnelStep::new("Viewed Product", EventMatcher::on_path(Matcher::prefix("/products"))),
        FunnelStep::new("Added to Cart", EventMatcher::on_css(Matcher::exact("button.add-to-cart"))),
        FunnelStep::new(
            "Viewed Cart",
            EventMatcher::on_path(Matcher::exact("/cart")).with_css(Matcher::exact("button.checkout")),
        ),
        FunnelStep::new("Checkout Started", EventMatcher::on_path(Matcher::exact("/checkout"))),
        FunnelStep::new(
            "Order Placed",
            EventMatcher::on_path(Matcher::exact("/checkout"))
                .with_css(Matcher::exact("button.place-order")),
        ),
    ]
}

impl AnalysisConfig {
    pub fn idle_threshold(&self) -> Duration {
        Duration::seconds(self.idle_threshold_secs)
    }

    /// Matcher for "entered the funnel": the first step's rule
    pub fn entry_matcher(&self) -> EventMatcher {
        self.steps
            .first()
            .map(|step| step.rule.clone())
            .unwrap_or_default()
    }

    /// Check invariants serde cannot express
    ///
    /// # Errors
    /// * `ConfigError::Invalid` - negative threshold, empty or duplicate step
    ///   labels, a catch-all rule where one is not allowed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_threshold_secs < 0 {
            return Err(ConfigError::Invalid(format!(
                "idle_threshold_secs must be >= 0, got {}",
                self.idle_threshold_secs
            )));
        }

        if self.steps.is_empty() {
            return Err(ConfigError::Invalid("at least one funnel step is required".to_string()));
        }

        let mut seen = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            if step.label.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("step {} has an empty label", i + 1)));
            }
            if !seen.insert(step.label.to_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!("duplicate step label '{}'", step.label)));
            }
            // Only the entry step may accept every event
            if i > 0 && step.rule.is_unconstrained() {
                return Err(ConfigError::Invalid(format!(
                    "step '{}' has no path, css or text matcher",
                    step.label
                )));
            }
        }

        for rule in &self.errors.categories {
            if rule.label.trim().is_empty() {
                return Err(ConfigError::Invalid("error category with empty label".to_string()));
            }
            if rule.rule.is_unconstrained() {
                return Err(ConfigError::Invalid(format!(
                    "error category '{}' would match every event",
                    rule.label
                )));
            }
        }

        if self.errors.signatures.iter().any(EventMatcher::is_unconstrained) {
            return Err(ConfigError::Invalid("error signature would match every event".to_string()));
        }

        if self.errors.purchase.is_unconstrained() {
            return Err(ConfigError::Invalid("purchase signature would match every event".to_string()));
        }

        Ok(())
    }

    /// Render as TOML (what `journey config` prints)
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Load and validate a TOML configuration file
///
/// # Arguments
/// * `path` - Path to the TOML configuration file
///
/// # Errors
/// * `ConfigError::Io` - File cannot be read
/// * `ConfigError::Toml` - TOML is invalid (including bad patterns)
/// * `ConfigError::Invalid` - Semantic validation failed
///
/// # Example
/// ```ignore
/// let config = load_config("analysis.toml")?;
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    info!("Loading analysis config from: {}", path.display());

    let contents = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = toml::from_str(&contents)?;
    config.validate()?;

    debug!(
        "Config: {} steps, {} error categories, idle threshold {}s",
        config.steps.len(),
        config.errors.categories.len(),
        config.idle_threshold_secs
    );

    Ok(config)
}

/// Load `path` when given, otherwise use the built-in default
pub fn load_config_or_default(path: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            debug!("No config file given, using default storefront funnel");
            Ok(AnalysisConfig::default())
        }
    }
}
