//! # Configuration Utilities
//!
//! TOML configuration shared by the command-line tool and the web server.
//!
//! ```toml
//! [server]
//! address = "127.0.0.1:5000"
//! output_dir = "outputs"
//!
//! [throttle]
//! max_attempts = 3
//! lockout_secs = 30
//! ```
//!
//! Every section and field is optional; missing values fall back to the
//! defaults shown above.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::throttle::ThrottleConfig;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: InkConfig = load_config("config/ink.toml")?;
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: T = toml::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    /// HTTP listener and storage paths.
    pub server: ServerSection,
    /// Wrong-password throttling.
    pub throttle: ThrottleConfig,
}

impl InkConfig {
    /// Load from `path`, or use defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

/// Web server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address (e.g., "127.0.0.1:5000")
    pub address: String,
    /// Where generated carrier PNGs are written and served from.
    pub output_dir: PathBuf,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5000".to_string(),
            output_dir: PathBuf::from("outputs"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_config_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[throttle]\nlockout_secs = 60").unwrap();

        let config: InkConfig = load_config(file.path()).unwrap();

        assert_eq!(config.throttle.max_attempts, 3);
        assert_eq!(config.throttle.lockout_secs, 60);
        assert_eq!(config.server, ServerSection::default());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result: Result<InkConfig> = load_config("/nonexistent/ink.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_no_path_means_defaults() {
        let config = InkConfig::load_or_default(None).unwrap();
        assert_eq!(config.server.address, "127.0.0.1:5000");
        assert_eq!(config.throttle, ThrottleConfig::default());
    }
}
