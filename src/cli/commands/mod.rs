//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod simulate;
pub mod spans;
pub mod validate;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::config::loader::LoadWarning;
use crate::error::{ConfigError, ScrollStageError};

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), ScrollStageError> {
    match cli.command {
        Commands::Simulate(args) => simulate::run(&args).await,
        Commands::Validate(args) => validate::run(&args),
        Commands::Spans(args) => spans::run(&args),
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Logs loader warnings at `warn` level.
fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}

/// Rejects a viewport height that cannot lay out spans.
fn check_viewport(viewport: f64) -> Result<(), ConfigError> {
    if viewport.is_finite() && viewport > 0.0 {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        field: "viewport".to_string(),
        value: viewport.to_string(),
        expected: "a positive height in pixels".to_string(),
    })
}
