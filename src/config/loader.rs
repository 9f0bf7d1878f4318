//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size limit check
//! 2. BOM strip
//! 3. Environment variable expansion (on raw text)
//! 4. YAML parsing
//! 5. Deserialization to typed config
//! 6. Validation
//! 7. Section renumbering and freeze with `Arc`

use crate::config::schema::StageConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for configuration size.
    pub config_limits: ConfigLimits,
}

/// Limits for configuration size.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum number of sections.
    pub max_sections: usize,

    /// Maximum number of stat items in one panel.
    pub max_panel_items: usize,

    /// Maximum configuration file size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_sections: env_or("SCROLLSTAGE_MAX_SECTIONS", 200),
            max_panel_items: env_or("SCROLLSTAGE_MAX_PANEL_ITEMS", 32),
            max_config_size: env_or("SCROLLSTAGE_MAX_CONFIG_SIZE", 1024 * 1024),
        }
    }
}

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<StageConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
///
/// Handles the full pipeline from YAML text to a frozen [`StageConfig`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation reports errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        let limit = self.options.config_limits.max_config_size;
        let file_size = usize::try_from(metadata.len()).unwrap_or(limit.saturating_add(1));
        check_size(file_size, limit)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_from_str(&raw, path)
    }

    /// Loads configuration from in-memory text. `source` is only used in
    /// error messages and warnings.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], minus file access.
    pub fn load_from_str(&self, content: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        let limits = &self.options.config_limits;
        check_size(content.len(), limits.max_config_size)?;

        let mut warnings = Vec::new();

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(content, source)?;
        warnings.extend(env_sub.warnings);

        let root: Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: source.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let mut config: StageConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize configuration: {e}"),
            })?;

        let mut validator = Validator::new();
        let validation = validator.validate(&config, limits);
        if validation.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: validation.errors,
            });
        }

        warnings.extend(validation.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        for (position, section) in config.sections.iter_mut().enumerate() {
            section.index = position;
        }

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

fn check_size(size: usize, limit: usize) -> Result<(), ConfigError> {
    if size > limit {
        return Err(ConfigError::InvalidValue {
            field: "file_size".to_string(),
            value: format!("{size} bytes"),
            expected: format!("at most {limit} bytes"),
        });
    }
    Ok(())
}

// ============================================================================
// Environment Substitution
// ============================================================================

/// Expands environment variable references in raw YAML text.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset, with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = Self::parse_var_spec(&mut chars, source_path)?;
                    match std::env::var(&spec.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match (spec.default, spec.required) {
                            (Some(default), _) => result.push_str(&default),
                            (None, Some(message)) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    location: message,
                                });
                            }
                            (None, None) => self.warnings.push(LoadWarning {
                                message: format!(
                                    "Environment variable '{}' is not set, using empty string",
                                    spec.name
                                ),
                                location: Some(source_path.display().to_string()),
                            }),
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    /// Parses the inside of `${...}`; the opening brace is already consumed.
    fn parse_var_spec(
        chars: &mut std::iter::Peekable<std::str::Chars>,
        source_path: &Path,
    ) -> Result<VarSpec, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarSpec {
                        name,
                        default: None,
                        required: None,
                    });
                }
                ':' => match chars.peek() {
                    Some('-') => {
                        chars.next();
                        let default = Self::read_until_close(chars, source_path)?;
                        return Ok(VarSpec {
                            name,
                            default: Some(default),
                            required: None,
                        });
                    }
                    Some('?') => {
                        chars.next();
                        let message = Self::read_until_close(chars, source_path)?;
                        return Ok(VarSpec {
                            name,
                            default: None,
                            required: Some(message),
                        });
                    }
                    _ => name.push(':'),
                },
                _ => name.push(c),
            }
        }

        Err(ConfigError::ParseError {
            path: source_path.to_path_buf(),
            line: None,
            message: format!("Unclosed environment variable reference: ${{{name}"),
        })
    }

    /// Reads up to the matching `}`, allowing nested braces.
    fn read_until_close(
        chars: &mut std::iter::Peekable<std::str::Chars>,
        source_path: &Path,
    ) -> Result<String, ConfigError> {
        let mut value = String::new();
        let mut depth = 1;

        for c in chars.by_ref() {
            match c {
                '{' => {
                    depth += 1;
                    value.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                    value.push(c);
                }
                _ => value.push(c),
            }
        }

        Err(ConfigError::ParseError {
            path: PathBuf::from(source_path),
            line: None,
            message: "Unclosed environment variable reference".to_string(),
        })
    }
}

struct VarSpec {
    name: String,
    default: Option<String>,
    required: Option<String>,
}

/// Reads `name` from the environment, falling back to `default` when unset
/// or unparsable.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = "stage:\n  name: demo\nsections:\n  - title: Hero\n  - title: One\n";

    fn load(content: &str) -> Result<LoadResult, ConfigError> {
        ConfigLoader::with_defaults().load_from_str(content, Path::new("test.yaml"))
    }

    #[test]
    fn test_env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "value: ${SCROLLSTAGE_TEST_NONEXISTENT_VAR_XYZ123:-fallback}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "value: fallback");
    }

    #[test]
    fn test_env_substitution_simple() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("path: ${PATH}", Path::new("test.yaml")).unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
    }

    #[test]
    fn test_env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute(
            "value: ${SCROLLSTAGE_TEST_REQUIRED_XYZ123:?must be set}",
            Path::new("test.yaml"),
        );
        match result {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "SCROLLSTAGE_TEST_REQUIRED_XYZ123");
                assert_eq!(location, "must be set");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute("price: $$100", Path::new("test.yaml")).unwrap();
        assert_eq!(result, "price: $100");
    }

    #[test]
    fn test_env_substitution_missing_warning() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("value: ${SCROLLSTAGE_TEST_WARN_XYZ123}", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "value: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("SCROLLSTAGE_TEST_WARN_XYZ123"));
    }

    #[test]
    fn test_env_substitution_unclosed() {
        let mut sub = EnvSubstitution::new();
        assert!(sub.substitute("value: ${OPEN", Path::new("test.yaml")).is_err());
    }

    #[test]
    fn test_load_minimal() {
        let result = load(MINIMAL).unwrap();
        assert_eq!(result.config.stage.name, "demo");
        assert_eq!(result.config.sections.len(), 2);
        assert_eq!(result.config.sections[1].index, 1);
    }

    #[test]
    fn test_load_strips_bom() {
        let content = format!("\u{feff}{MINIMAL}");
        assert!(load(&content).is_ok());
    }

    #[test]
    fn test_load_empty_is_parse_error() {
        assert!(matches!(load(""), Err(ConfigError::ParseError { .. })));
        assert!(matches!(load("# nothing\n"), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_unknown_ease_is_parse_error() {
        let content = format!("{MINIMAL}timeline:\n  ease: bouncy\n");
        assert!(matches!(load(&content), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_load_validation_error_collects_all() {
        let content = "stage:\n  name: ''\ntimeline:\n  enter_end: 0.9\n  exit_start: 0.1\nsections:\n  - title: ''\n";
        match load(content) {
            Err(ConfigError::ValidationError { errors, .. }) => {
                assert!(errors.len() >= 3, "got {errors:?}");
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_oversized_connector_count() {
        let content = format!("{MINIMAL}    panel:\n      connectors: 100000000000\n");
        match load(&content) {
            Err(ConfigError::ValidationError { errors, .. }) => {
                assert!(
                    errors.iter().any(|e| e.path == "sections[1].panel.connectors"),
                    "got {errors:?}"
                );
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_load_renumbers_misnumbered_sections() {
        let content = "stage:\n  name: demo\nsections:\n  - title: Hero\n  - title: One\n    index: 4\n";
        let result = load(content).unwrap();
        assert_eq!(result.config.sections[1].index, 1);
        assert!(result.warnings.iter().any(|w| w.message.contains("index")));
    }

    #[test]
    fn test_size_limit() {
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_config_size: 10,
                ..ConfigLimits::default()
            },
        });
        let result = loader.load_from_str(MINIMAL, Path::new("test.yaml"));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.sections.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::with_defaults().load(Path::new("/nonexistent/stage.yaml"));
        assert!(matches!(result, Err(ConfigError::MissingFile { .. })));
    }
}
