//! INI configuration file.
//!
//! Located at `<config_dir>/pbrtex/config.ini` unless an explicit path is
//! given. Every key is optional; command-line arguments override the file.
//!
//! ```ini
//! [render]
//! backend = software
//!
//! [environment]
//! output_size = 512
//! irradiance_size = 32
//! prefilter_size = 256
//!
//! [logging]
//! level = info
//! file = /tmp/pbrtex.log
//! ```

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::render::BackendKind;

const RENDER: &str = "render";
const ENVIRONMENT: &str = "environment";
const LOGGING: &str = "logging";

/// Log levels accepted in `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pbrtex")
        .join("config.ini")
}

/// `[render]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSettings {
    pub backend: BackendKind,
}

/// `[environment]` section: cube-map sizes used when the command line omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentDefaults {
    pub output_size: Option<u32>,
    pub irradiance_size: Option<u32>,
    pub prefilter_size: Option<u32>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub render: RenderSettings,
    pub environment: EnvironmentDefaults,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load the file at the default location, or defaults if there is none.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load an explicit file. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                reason: parse.to_string(),
            },
        })?;
        Self::from_ini(&ini)
    }

    /// Build from parsed INI data.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some(RENDER)) {
            if let Some(value) = section.get("backend") {
                config.render.backend = value.parse().map_err(|reason| ConfigError::InvalidValue {
                    section: RENDER.to_string(),
                    key: "backend".to_string(),
                    value: value.to_string(),
                    reason,
                })?;
            }
        }

        if let Some(section) = ini.section(Some(ENVIRONMENT)) {
            let size = |key: &str| -> Result<Option<u32>, ConfigError> {
                section.get(key).map(|value| parse_size(key, value)).transpose()
            };
            config.environment = EnvironmentDefaults {
                output_size: size("output_size")?,
                irradiance_size: size("irradiance_size")?,
                prefilter_size: size("prefilter_size")?,
            };
        }

        if let Some(section) = ini.section(Some(LOGGING)) {
            if let Some(value) = section.get("level") {
                let level = value.trim().to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        section: LOGGING.to_string(),
                        key: "level".to_string(),
                        value: value.to_string(),
                        reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
                    });
                }
                config.logging.level = level;
            }
            config.logging.file = section
                .get("file")
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(PathBuf::from);
        }

        Ok(config)
    }
}

fn parse_size(key: &str, value: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        section: ENVIRONMENT.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let size: u32 = value
        .trim()
        .parse()
        .map_err(|_| invalid("not an unsigned integer"))?;
    if size == 0 || size > crate::source::MAX_DIMENSION {
        return Err(invalid("size must be in 1..=65535"));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.ini");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "[render]\nbackend = gpu\n\n[environment]\noutput_size = 512\nirradiance_size = 32\nprefilter_size = 256\n\n[logging]\nlevel = DEBUG\nfile = /tmp/pbrtex.log\n",
        );

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.render.backend, BackendKind::Gpu);
        assert_eq!(config.environment.output_size, Some(512));
        assert_eq!(config.environment.irradiance_size, Some(32));
        assert_eq!(config.environment.prefilter_size, Some(256));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/pbrtex.log")));
    }

    #[test]
    fn test_empty_config_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "");
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[environment]\nprefilter_size = 64\n");

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.render, RenderSettings::default());
        assert_eq!(config.environment.output_size, None);
        assert_eq!(config.environment.prefilter_size, Some(64));
        assert_eq!(config.logging, LoggingSettings::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let result = ConfigFile::load_from(&dir.path().join("absent.ini"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[render]\nbackend = metal\n");
        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("[render] backend"));
    }

    #[test]
    fn test_invalid_sizes_are_rejected() {
        let dir = TempDir::new().unwrap();
        for value in ["0", "-4", "big", "70000"] {
            let path = write_config(&dir, &format!("[environment]\noutput_size = {}\n", value));
            assert!(ConfigFile::load_from(&path).is_err(), "{}", value);
        }
    }

    #[test]
    fn test_invalid_log_level_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[logging]\nlevel = loud\n");
        assert!(matches!(
            ConfigFile::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir() {
        let path = config_file_path();
        assert!(path.ends_with("pbrtex/config.ini"));
    }
}
