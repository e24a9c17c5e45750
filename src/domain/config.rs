use std::{io, path::Path};

use serde::{Deserialize, Serialize};

use crate::domain::flag::FlagStyle;

/// Configuration for the editing core.
///
/// Read from a TOML file such as:
///
/// ```toml
/// _version = "1"
/// history_limit = 50
/// expand_bus_notation = true
/// flag_style = "separate"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Maximum number of undo steps kept per document.
    ///
    /// `None` keeps the whole history.
    history_limit: Option<usize>,

    /// Whether literal specs such as `data[0:3]` also match every name in
    /// the bus range (`data[0]` … `data[3]`).
    pub expand_bus_notation: bool,

    /// How flags are written when a document is saved.
    pub flag_style: FlagStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: None,
            expand_bus_notation: default_expand_bus_notation(),
            flag_style: FlagStyle::default(),
        }
    }
}

/// Errors from reading or writing a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[source] io::Error),
    /// The file is not valid configuration TOML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be rendered as TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// The file could not be written.
    #[error("failed to write config file: {0}")]
    Write(#[source] io::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(ConfigError::Write)
    }

    /// Returns the undo history bound, if any.
    #[must_use]
    pub const fn history_limit(&self) -> Option<usize> {
        self.history_limit
    }

    /// Bounds the undo history. A limit of zero disables the bound.
    pub const fn set_history_limit(&mut self, limit: Option<usize>) {
        self.history_limit = match limit {
            Some(0) | None => None,
            Some(limit) => Some(limit),
        };
    }
}

const fn default_expand_bus_notation() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// Zero or absent means unbounded.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        history_limit: Option<usize>,

        #[serde(default = "default_expand_bus_notation")]
        expand_bus_notation: bool,

        #[serde(default)]
        flag_style: FlagStyle,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                history_limit,
                expand_bus_notation,
                flag_style,
            } => {
                let mut config = Self {
                    history_limit: None,
                    expand_bus_notation,
                    flag_style,
                };
                config.set_history_limit(history_limit);
                config
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            history_limit: config.history_limit,
            expand_bus_notation: config.expand_bus_notation,
            flag_style: config.flag_style,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nhistory_limit = 50\nexpand_bus_notation = false\nflag_style = \"compound\"\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.history_limit(), Some(50));
        assert!(!config.expand_bus_notation);
        assert_eq!(config.flag_style, FlagStyle::Compound);
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(matches!(error, ConfigError::Read(_)));
        assert!(error.to_string().starts_with("failed to read config file:"));
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nhistory_limit = \"fifty\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn zero_history_limit_means_unbounded() {
        let config: Config = toml::from_str("_version = \"1\"\nhistory_limit = 0\n").unwrap();
        assert_eq!(config.history_limit(), None);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("lotus.toml");

        let mut config = Config::default();
        config.set_history_limit(Some(10));
        config.flag_style = FlagStyle::Compound;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
