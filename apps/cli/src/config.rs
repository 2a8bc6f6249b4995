//! Configuration management.
//!
//! Settings are layered: built-in defaults, then a TOML file
//! (`~/.config/vimeops/config.toml`, `%APPDATA%/vimeops/config.toml` on
//! Windows), then environment variables, then command line flags.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vimeops_batch::Credentials;

/// Tool configuration, built once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upload and rename root.
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Download root.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    #[serde(default)]
    pub access_token: String,

    /// Rename size threshold in megabytes.
    #[serde(default = "default_threshold")]
    pub threshold_mb: u64,

    /// Where the progress records live.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_threshold() -> u64 {
    10
}

fn default_state_dir() -> PathBuf {
    config_dir().join("state")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: None,
            download_dir: None,
            client_id: String::new(),
            client_secret: String::new(),
            access_token: String::new(),
            threshold_mb: default_threshold(),
            state_dir: default_state_dir(),
        }
    }
}

impl Config {
    /// Loads the configuration file.
    ///
    /// Without `explicit`, a missing default file yields the defaults. A
    /// file that does not parse is logged and ignored.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => config_path(),
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "configuration loaded");
                Ok(config)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
                Ok(Self::default())
            }
        }
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("CLIENT_ID") {
            self.client_id = v;
        }
        if let Some(v) = var("CLIENT_SECRET") {
            self.client_secret = v;
        }
        if let Some(v) = var("ACCESS_TOKEN") {
            self.access_token = v;
        }
        if let Some(v) = var("INPUT_DIR") {
            self.input_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("DOWNLOAD_DIR") {
            self.download_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("VIMEOPS_STATE_DIR") {
            self.state_dir = PathBuf::from(v);
        }
        if let Some(v) = var("THRESHOLD") {
            match v.trim().parse() {
                Ok(threshold) => self.threshold_mb = threshold,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid THRESHOLD"),
            }
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.client_id, &self.client_secret, &self.access_token)
    }
}

/// Returns the platform-specific configuration directory.
fn config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("vimeops")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config").join("vimeops")
    }
}

fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}
