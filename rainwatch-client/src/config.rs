//! Monitor configuration.
//!
//! TOML file in the OS config directory, loaded at startup or falling
//! back to defaults. `RAINWATCH_DEVICE_URL` overrides the device URL
//! without touching the file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub device_url: String,
    pub poll_interval_secs: u64,
    pub series_capacity: usize,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Player invocation for the rain alert; `{volume}` in an argument
    /// is replaced with the volume as a 0-100 percentage.
    pub player_command: Vec<String>,
    pub volume: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            // ESP32 softAP default address
            device_url: "http://192.168.4.1".to_string(),
            poll_interval_secs: 5,
            series_capacity: 10,
            audio: AudioConfig {
                player_command: vec![
                    "mpv".to_string(),
                    "--really-quiet".to_string(),
                    "--loop".to_string(),
                    "--volume={volume}".to_string(),
                    "rain-alert.ogg".to_string(),
                ],
                volume: 0.2,
            },
        }
    }
}

impl MonitorConfig {
    /// Load config from the OS-specific location, or defaults when the
    /// file does not exist yet. A broken file is an error rather than a
    /// silent fallback.
    pub async fn load() -> Result<Self> {
        let mut config = match Self::config_file_path() {
            Ok(path) if path.exists() => {
                let content = tokio::fs::read_to_string(&path).await?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };

        if let Ok(url) = std::env::var("RAINWATCH_DEVICE_URL") {
            config.device_url = url;
        }
        Ok(config)
    }

    /// Save config, creating the parent directory if needed. Used for
    /// first-run scaffolding so the file exists to edit.
    pub async fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, content).await?;
        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push("rainwatch");
        path.push("config.toml");
        Ok(path)
    }

    pub fn is_first_time_setup() -> bool {
        Self::config_file_path()
            .map(|p| !p.exists())
            .unwrap_or(true)
    }
}
