//! Optional TOML settings.
//!
//! ```toml
//! [output]
//! pretty = true
//!
//! [query]
//! absent = "default"
//! default_value = 0.0
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every section and field may be omitted.

use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::stream::AbsentPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub output: OutputConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON results
    pub pretty: bool,
    /// Print one line per element instead of JSON
    pub lines: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AbsentMode {
    #[default]
    Empty,
    Default,
    Fail,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    pub absent: AbsentMode,
    /// Substitute for an absent average when `absent = "default"`
    pub default_value: f64,
}

impl QueryConfig {
    pub fn absent_policy(&self) -> AbsentPolicy {
        match self.absent {
            AbsentMode::Empty => AbsentPolicy::Empty,
            AbsentMode::Default => AbsentPolicy::Default(self.default_value),
            AbsentMode::Fail => AbsentPolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Settings, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        match path {
            None => Ok(Settings::default()),
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Settings::from_toml(&text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.query.absent_policy(), AbsentPolicy::Empty);
    }

    #[test]
    fn absent_policy_from_file() {
        let settings = Settings::from_toml(
            r#"
            [query]
            absent = "default"
            default_value = -1.5
            "#,
        )
        .unwrap();
        assert_eq!(settings.query.absent_policy(), AbsentPolicy::Default(-1.5));

        let settings = Settings::from_toml("[query]\nabsent = \"fail\"").unwrap();
        assert_eq!(settings.query.absent_policy(), AbsentPolicy::Fail);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml("[output]\npretty = true").unwrap();
        assert!(settings.output.pretty);
        assert!(!settings.output.lines);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn unknown_absent_mode_is_rejected() {
        assert!(matches!(
            Settings::from_toml("[query]\nabsent = \"sometimes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/sluice.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
