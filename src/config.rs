use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// Process-wide configuration, resolved once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Page size for list calls (server default of 10 when unset)
  pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the task API, e.g. http://127.0.0.1:8080
  pub url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tsk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tsk/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tsk/config.yaml\n\
                 with an `api.url` entry pointing at the task API."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tsk.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tsk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Parsed API base URL.
  pub fn base_url(&self) -> Result<Url> {
    Url::parse(&self.api.url).map_err(|e| eyre!("Invalid API base URL {}: {}", self.api.url, e))
  }

  pub fn page_size(&self) -> u32 {
    self.page_size.unwrap_or(10)
  }

  /// Get the API bearer token from environment variables.
  ///
  /// Checks TSK_API_TOKEN first, then TASKS_API_TOKEN as fallback.
  pub fn api_token() -> Result<String> {
    std::env::var("TSK_API_TOKEN")
      .or_else(|_| std::env::var("TASKS_API_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set TSK_API_TOKEN or TASKS_API_TOKEN environment variable.")
      })
  }
}
