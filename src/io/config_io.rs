use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Config file name looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "tickler.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load configuration.
///
/// An explicit `path` must exist. Otherwise `tickler.toml` in `data_dir` is
/// used when present, and built-in defaults when not.
pub fn read_config(path: Option<&Path>, data_dir: &Path) -> Result<Config, ConfigError> {
    let (config_path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (data_dir.join(CONFIG_FILE_NAME), false),
    };

    let text = match fs::read_to_string(&config_path) {
        Ok(t) => t,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: config_path,
                source: e,
            });
        }
    };

    let config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: config_path.clone(),
        source: e,
    })?;
    tracing::debug!(path = %config_path.display(), "loaded config");
    Ok(config)
}

/// Resolve the data file named by the config against the data directory.
pub fn resolve_data_file(config: &Config, data_dir: &Path) -> PathBuf {
    let file = Path::new(&config.store.file);
    if file.is_absolute() {
        file.to_path_buf()
    } else {
        data_dir.join(file)
    }
}
