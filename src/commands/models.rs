use std::path::PathBuf;

/// Arguments shared by every command that runs an analysis
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Event log (JSON array or JSON Lines)
    pub input: PathBuf,

    /// Analysis config TOML (built-in storefront funnel when absent)
    pub config: Option<PathBuf>,

    /// Where to write the JSON report
    pub output: Option<PathBuf>,

    /// Print text tables to stdout
    pub print_summary: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("sessions.json"),
            config: None,
            output: None,
            print_summary: true,
        }
    }
}

/// Arguments for the inspect command
#[derive(Debug, Clone)]
pub struct InspectArgs {
    pub input: PathBuf,

    pub config: Option<PathBuf>,

    /// Step label (case-insensitive) or 1-based step number
    pub step: String,

    /// Max sessions listed
    pub limit: usize,
}

impl Default for InspectArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("sessions.json"),
            config: None,
            step: String::new(),
            limit: 50,
        }
    }
}
