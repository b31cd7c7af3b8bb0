use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::upload::validate::UploadLimits;

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub server: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_file_size: Option<u64>,
    pub allowed_extensions: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct Config {
    pub server: String,
    pub timeout: Duration,
    pub limits: UploadLimits,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        let mut limits = UploadLimits::default();
        if let Some(max) = file.max_file_size {
            limits.max_file_size = max;
        }
        if let Some(extensions) = file.allowed_extensions {
            limits = limits.with_extensions(extensions);
        }
        Config {
            server: args
                .server
                .clone()
                .or(file.server)
                .unwrap_or_else(|| DEFAULT_SERVER.to_string()),
            timeout: Duration::from_secs(
                args.timeout.or(file.timeout_secs).unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            limits,
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("picman.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let user_config = config_dir.join("picman").join("config.toml");
        if user_config.exists() {
            return Some(user_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
