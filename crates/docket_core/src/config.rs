//! Runtime configuration for the document core.
//!
//! # Responsibility
//! - Carry tunables (staleness window, id length, app account) with defaults.
//! - Describe where and how verbosely the core writes its logs.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid JSON config.
//! - `validate()` is called by every constructor that accepts external input.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default cool-down between two bulk remote pulls of one project.
pub const DEFAULT_STALENESS_WINDOW_SECS: u64 = 24 * 60 * 60;
/// Default length of generated document path segments.
pub const DEFAULT_DOCUMENT_ID_LENGTH: usize = 7;
/// Account that owns the shared project template and type widgets.
pub const DEFAULT_APP_ACCOUNT: &str = "docket.app";

const DEFAULT_MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_MAX_LOG_FILES: usize = 5;
const MAX_DOCUMENT_ID_LENGTH: usize = 32;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid config value for `{field}`: {message}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables shared by the repository, synchronizer and project service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Account hosting `widget/templates.project.doc` and `type/project`.
    pub app_account: String,
    /// Minimum interval between two non-forced project pulls.
    pub staleness_window_secs: u64,
    /// Number of characters in a generated document id.
    pub document_id_length: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            app_account: DEFAULT_APP_ACCOUNT.to_string(),
            staleness_window_secs: DEFAULT_STALENESS_WINDOW_SECS,
            document_id_length: DEFAULT_DOCUMENT_ID_LENGTH,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON config, filling omitted fields with defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_account.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "app_account",
                message: "must not be blank".to_string(),
            });
        }
        if self.document_id_length == 0 || self.document_id_length > MAX_DOCUMENT_ID_LENGTH {
            return Err(ConfigError::InvalidValue {
                field: "document_id_length",
                message: format!("expected 1..={MAX_DOCUMENT_ID_LENGTH}"),
            });
        }
        if i64::try_from(self.staleness_window_secs).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "staleness_window_secs",
                message: "out of range".to_string(),
            });
        }
        Ok(())
    }

    /// Staleness window as a signed duration for timestamp arithmetic.
    pub fn staleness_window(&self) -> TimeDelta {
        i64::try_from(self.staleness_window_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// Default `template.src` for newly created projects.
    pub fn default_template_src(&self) -> String {
        format!("{}/widget/templates.project.doc", self.app_account)
    }

    /// `type.src` stamped on every project record.
    pub fn project_type_src(&self) -> String {
        format!("{}/type/project", self.app_account)
    }
}

/// Log sink settings consumed by `init_logging`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive).
    pub level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: String,
    #[serde(default = "default_max_log_file_size_bytes")]
    pub max_file_size_bytes: u64,
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>, log_dir: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            log_dir: log_dir.into(),
            max_file_size_bytes: DEFAULT_MAX_LOG_FILE_SIZE_BYTES,
            max_files: DEFAULT_MAX_LOG_FILES,
        }
    }
}

fn default_max_log_file_size_bytes() -> u64 {
    DEFAULT_MAX_LOG_FILE_SIZE_BYTES
}

fn default_max_log_files() -> usize {
    DEFAULT_MAX_LOG_FILES
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, LoggingConfig, DEFAULT_STALENESS_WINDOW_SECS};
    use chrono::TimeDelta;

    #[test]
    fn empty_json_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty config should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.staleness_window(), TimeDelta::hours(24));
        assert_eq!(config.staleness_window_secs, DEFAULT_STALENESS_WINDOW_SECS);
    }

    #[test]
    fn rejects_zero_id_length() {
        let err = CoreConfig::from_json_str(r#"{"document_id_length": 0}"#)
            .expect_err("zero length must be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "document_id_length",
                ..
            }
        ));
    }

    #[test]
    fn template_sources_follow_app_account() {
        let config = CoreConfig {
            app_account: "builder.near".to_string(),
            ..CoreConfig::default()
        };
        assert_eq!(
            config.default_template_src(),
            "builder.near/widget/templates.project.doc"
        );
        assert_eq!(config.project_type_src(), "builder.near/type/project");
    }

    #[test]
    fn logging_config_fills_rotation_defaults() {
        let parsed: LoggingConfig =
            serde_json::from_str(r#"{"level": "info", "log_dir": "/tmp/docket"}"#)
                .expect("logging config should parse");
        assert_eq!(parsed, LoggingConfig::new("info", "/tmp/docket"));
    }
}
