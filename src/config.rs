use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Fixed relative path of the startup configuration file.
pub const CONFIG_FILE: &str = "config.properties";

/// Startup configuration. Loaded once, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
}

/// Errors that make startup impossible. All of them are fatal: the binary
/// prints the message and exits non-zero.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file does not exist.
    NotFound { path: PathBuf },

    /// The configuration file exists but could not be read.
    Read { path: PathBuf, source: io::Error },

    /// A required entry is absent from the file.
    MissingKey { path: PathBuf, key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotFound { path } => {
                write!(
                    f,
                    "Configuration file not found at {}. Create it with apiUrl and apiKey entries.",
                    path.display()
                )
            }
            ConfigError::Read { path, source } => {
                write!(f, "Failed to read configuration at {}: {}", path.display(), source)
            }
            ConfigError::MissingKey { path, key } => {
                write!(f, "Configuration at {} is missing the '{}' entry", path.display(), key)
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_FILE))
    }

    /// Parse a line-oriented `key=value` file. Keys are matched
    /// case-insensitively and both halves are trimmed; lines without a `=`
    /// or with an unrecognized key are ignored.
    pub fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut api_url = None;
        let mut api_key = None;

        for line in contents.lines() {
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();
                if key.eq_ignore_ascii_case("apiUrl") {
                    api_url = Some(value.to_string());
                } else if key.eq_ignore_ascii_case("apiKey") {
                    api_key = Some(value.to_string());
                }
            }
        }

        let api_url = api_url.ok_or_else(|| ConfigError::MissingKey {
            path: path.to_path_buf(),
            key: "apiUrl",
        })?;
        let api_key = api_key.ok_or_else(|| ConfigError::MissingKey {
            path: path.to_path_buf(),
            key: "apiKey",
        })?;

        Ok(Config { api_url, api_key })
    }
}
