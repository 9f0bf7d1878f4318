//! `validate` command
//!
//! Loads each configuration file through the full loader pipeline and
//! reports errors and warnings without mounting anything.

use std::path::Path;

use serde_json::json;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::loader::{ConfigLoader, LoadResult};
use crate::error::{ConfigError, ScrollStageError};

/// Validate every file and print a report.
///
/// All files are checked before returning, so one bad file does not hide
/// problems in the rest.
///
/// # Errors
///
/// Returns the first file's config error when any file fails to load.
pub fn run(args: &ValidateArgs) -> Result<(), ScrollStageError> {
    let loader = ConfigLoader::with_defaults();
    let mut first_failure: Option<ConfigError> = None;
    let mut reports = Vec::with_capacity(args.files.len());

    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        let outcome = loader.load(path);
        match args.format {
            OutputFormat::Human => print_human(path, &outcome),
            OutputFormat::Json => reports.push(json_report(path, &outcome)),
        }
        match outcome {
            Ok(result) => super::log_warnings(&result.warnings),
            Err(e) => {
                first_failure.get_or_insert(e);
            }
        }
    }

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    first_failure.map_or(Ok(()), |e| Err(e.into()))
}

fn print_human(path: &Path, outcome: &Result<LoadResult, ConfigError>) {
    match outcome {
        Ok(result) => {
            println!(
                "{}: ok ({} sections, {} warnings)",
                path.display(),
                result.config.sections.len(),
                result.warnings.len()
            );
            for warning in &result.warnings {
                println!("  warning: {warning}");
            }
        }
        Err(ConfigError::ValidationError { errors, .. }) => {
            println!("{}: invalid", path.display());
            for issue in errors {
                println!("  {issue}");
            }
        }
        Err(e) => println!("{}: {e}", path.display()),
    }
}

fn json_report(path: &Path, outcome: &Result<LoadResult, ConfigError>) -> serde_json::Value {
    match outcome {
        Ok(result) => json!({
            "file": path.display().to_string(),
            "valid": true,
            "sections": result.config.sections.len(),
            "errors": [],
            "warnings": result
                .warnings
                .iter()
                .map(|w| json!({ "path": w.location, "message": w.message }))
                .collect::<Vec<_>>(),
        }),
        Err(ConfigError::ValidationError { errors, .. }) => json!({
            "file": path.display().to_string(),
            "valid": false,
            "errors": errors
                .iter()
                .map(|i| json!({ "path": i.path, "message": i.message }))
                .collect::<Vec<_>>(),
            "warnings": [],
        }),
        Err(e) => json!({
            "file": path.display().to_string(),
            "valid": false,
            "errors": [{ "path": null, "message": e.to_string() }],
            "warnings": [],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempfile::NamedTempFile;

    fn write(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const VALID: &str = "
stage:
  name: demo
sections:
  - title: Hero
  - title: Second
";

    const INVALID: &str = "
stage:
  name: ''
sections:
  - title: ''
";

    #[test]
    fn test_valid_files_pass() {
        let file = write(VALID);
        let args = ValidateArgs {
            files: vec![file.path().to_path_buf()],
            format: OutputFormat::Json,
        };
        assert!(run(&args).is_ok());
    }

    #[test]
    fn test_invalid_file_fails_after_checking_all() {
        let bad = write(INVALID);
        let good = write(VALID);
        let args = ValidateArgs {
            files: vec![bad.path().to_path_buf(), good.path().to_path_buf()],
            format: OutputFormat::Human,
        };
        let err = run(&args).unwrap_err();
        assert!(matches!(
            err,
            ScrollStageError::Config(ConfigError::ValidationError { .. })
        ));
        assert_eq!(err.exit_code(), crate::error::ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            files: vec!["/nonexistent/stage.yaml".into()],
            format: OutputFormat::Human,
        };
        assert!(matches!(
            run(&args),
            Err(ScrollStageError::Config(ConfigError::MissingFile { .. }))
        ));
    }

    #[test]
    fn test_json_report_shape() {
        let file = write(INVALID);
        let outcome = ConfigLoader::with_defaults().load(file.path());
        let report = json_report(file.path(), &outcome);
        assert_eq!(report["valid"], false);
        assert!(report["errors"].as_array().unwrap().len() >= 2);
    }
}
