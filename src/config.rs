//! Configuration for the somnolog recorder.

use crate::bridge::types::Channel;
use crate::writer::FlushPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the recorder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for per-session output files
    pub session_path: PathBuf,

    /// Directory for state (cumulative stats, session registry)
    pub data_path: PathBuf,

    /// Which channels to stream, and at what rate
    pub channels: ChannelConfig,

    /// Buffer bounds for the stream writer
    pub flush: FlushPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("somnolog");

        Self {
            session_path: data_dir.join("sessions"),
            data_path: data_dir,
            channels: ChannelConfig::default(),
            flush: FlushPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("somnolog")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.session_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Which channels to stream, and the per-channel notification rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub accel: bool,
    pub gyro: bool,
    pub temp: bool,
    pub accel_rate_hz: f32,
    pub gyro_rate_hz: f32,
    pub temp_rate_hz: f32,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            accel: true,
            gyro: true,
            temp: false,
            accel_rate_hz: 50.0,
            gyro_rate_hz: 50.0,
            temp_rate_hz: 1.0,
        }
    }
}

impl ChannelConfig {
    /// Parse channel enables from a comma-separated string.
    ///
    /// Rates keep their defaults; set them separately.
    pub fn from_csv(s: &str) -> Self {
        let names: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();

        Self {
            accel: names.iter().any(|n| n == "accel" || n == "all"),
            gyro: names.iter().any(|n| n == "gyro" || n == "all"),
            temp: names.iter().any(|n| n == "temp" || n == "all"),
            ..Self::default()
        }
    }

    /// Check if at least one channel is enabled.
    pub fn any_enabled(&self) -> bool {
        self.accel || self.gyro || self.temp
    }

    /// Enabled channels paired with their configured rates.
    pub fn enabled(&self) -> Vec<(Channel, f32)> {
        let mut channels = Vec::new();
        if self.accel {
            channels.push((Channel::Accel, self.accel_rate_hz));
        }
        if self.gyro {
            channels.push((Channel::Gyro, self.gyro_rate_hz));
        }
        if self.temp {
            channels.push((Channel::Temp, self.temp_rate_hz));
        }
        channels
    }

    /// Sum of the enabled channel rates.
    pub fn aggregate_rate_hz(&self) -> f32 {
        self.enabled().iter().map(|(_, rate)| rate).sum()
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
