//! Loading [`StreamOutConfig`], plus platform path defaults.

use std::path::PathBuf;

use stream_out_types::StreamOutConfig;
use thiserror::Error;

pub const APP_NAME: &str = "stream-out";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[source] confy::ConfyError),
    #[error("no {0} directory on this platform")]
    NoPlatformDir(&'static str),
}

/// Load the user config. A missing file is created with defaults.
pub fn try_load_config() -> Result<StreamOutConfig, ConfigError> {
    confy::load(APP_NAME, CONFIG_NAME).map_err(ConfigError::Load)
}

/// Where the config file lives, for display.
pub fn config_path() -> Option<PathBuf> {
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).ok()
}

/// Output folder: the configured one, or `<data dir>/stream-out/stream_out`.
pub fn resolve_output_dir(config: &StreamOutConfig) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = &config.output_dir {
        return Ok(dir.clone());
    }
    dirs::data_dir()
        .map(|p| p.join(APP_NAME).join("stream_out"))
        .ok_or(ConfigError::NoPlatformDir("data"))
}

/// State file: the configured one, or `<config dir>/stream-out/state.json`.
pub fn resolve_state_file(config: &StreamOutConfig) -> Result<PathBuf, ConfigError> {
    if let Some(path) = &config.state_file {
        return Ok(path.clone());
    }
    dirs::config_dir()
        .map(|p| p.join(APP_NAME).join("state.json"))
        .ok_or(ConfigError::NoPlatformDir("config"))
}
