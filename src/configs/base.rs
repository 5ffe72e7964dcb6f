use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
  #[serde(default)]
  pub output: OutputConfig,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  /// Loads `config.toml`, then `config.default.toml`, from the working
  /// directory. Built-in defaults apply when neither exists.
  pub fn load() -> AnyResult<Self> {
    let config_path = ["config.toml", "config.default.toml"]
      .into_iter()
      .find(|p| Path::new(p).exists());

    let Some(config_path) = config_path else {
      crate::log_println!("No config.toml found, using built-in defaults");
      return Ok(Self::default());
    };

    crate::log_println!("Loading configuration from: {}", config_path);

    let config_str = std::fs::read_to_string(config_path)?;
    if config_str.is_empty() {
      return Err(format!("{} is empty", config_path).into());
    }

    Self::from_toml(&config_str)
  }

  pub fn from_toml(config_str: &str) -> AnyResult<Self> {
    let config: Config = toml::from_str(config_str)?;
    if config.output.sample_rate == 0 {
      return Err("output.sample_rate must be non-zero".into());
    }
    Ok(config)
  }
}
