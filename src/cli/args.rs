//! CLI argument definitions
//!
//! All Clap derive structs for `scrollstage` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Scroll-driven section animation orchestrator.
#[derive(Parser, Debug)]
#[command(name = "scrollstage", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "SCROLLSTAGE_COLOR")]
    pub color: ColorChoice,

    /// Log output format.
    #[arg(long, default_value = "human", global = true, env = "SCROLLSTAGE_LOG_FORMAT")]
    pub log_format: OutputFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scroll trace against a stage and print the frames.
    Simulate(SimulateArgs),

    /// Validate stage configuration files.
    Validate(ValidateArgs),

    /// Print the scroll spans a stage lays out for a viewport.
    Spans(SpansArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Simulate
// ============================================================================

/// Arguments for `simulate`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("input").multiple(false))]
pub struct SimulateArgs {
    /// Path to the YAML stage configuration.
    #[arg(short, long, env = "SCROLLSTAGE_CONFIG")]
    pub config: PathBuf,

    /// Path to a YAML scroll trace.
    #[arg(short, long, group = "input")]
    pub trace: Option<PathBuf>,

    /// Comma-separated scroll offsets, replayed in order.
    #[arg(long, group = "input", value_delimiter = ',', allow_hyphen_values = true)]
    pub offsets: Vec<f64>,

    /// Virtual time between consecutive `--offsets` samples.
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Viewport height in pixels (ignored with `--trace`).
    #[arg(long, default_value_t = 900.0)]
    pub viewport: f64,

    /// Sections whose host target is missing.
    #[arg(long, value_delimiter = ',')]
    pub missing: Vec<usize>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Write structured stage events (JSONL) to this file.
    #[arg(long, env = "SCROLLSTAGE_EVENTS_FILE")]
    pub events: Option<PathBuf>,

    /// Expose Prometheus metrics on this port for the duration of the run.
    #[arg(long, env = "SCROLLSTAGE_METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

// ============================================================================
// Validate / Spans / Version
// ============================================================================

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `spans`.
#[derive(Args, Debug)]
pub struct SpansArgs {
    /// Path to the YAML stage configuration.
    #[arg(short, long, env = "SCROLLSTAGE_CONFIG")]
    pub config: PathBuf,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 900.0)]
    pub viewport: f64,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
