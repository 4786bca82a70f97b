//! Configuration for the rimsense host and classifier.

use crate::wire::WireFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Classifier thresholds, injected once per session.
///
/// Defaults suit a rim-mounted sensor pod; tune per installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierParams {
    /// Acceleration magnitude (g) above which an impact is registered
    pub impact_threshold_g: f64,

    /// Ball is considered through the net when distance < this (mm)
    pub distance_threshold_mm: u16,

    /// Minimum return signal rate for a basket reading
    pub signal_rate_threshold: u16,

    /// Window after an impact in which a basket reading counts as a make
    pub max_time_after_impact_s: f64,

    /// Cooldown after a resolved shot during which samples are ignored
    pub blackout_window_s: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            impact_threshold_g: 4.0,
            distance_threshold_mm: 350,
            signal_rate_threshold: 1000,
            max_time_after_impact_s: 0.5,
            blackout_window_s: 1.0,
        }
    }
}

impl ClassifierParams {
    /// Reject unusable thresholds before a session starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.impact_threshold_g.is_finite() && self.impact_threshold_g > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "impact_threshold_g must be positive, got {}",
                self.impact_threshold_g
            )));
        }
        if self.distance_threshold_mm == 0 {
            return Err(ConfigError::Invalid(
                "distance_threshold_mm must be positive".to_string(),
            ));
        }
        if !(self.max_time_after_impact_s.is_finite() && self.max_time_after_impact_s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "max_time_after_impact_s must be positive, got {}",
                self.max_time_after_impact_s
            )));
        }
        if !(self.blackout_window_s.is_finite() && self.blackout_window_s > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "blackout_window_s must be positive, got {}",
                self.blackout_window_s
            )));
        }
        Ok(())
    }
}

/// Main configuration for the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the receiver binds
    pub listen_addr: String,

    /// Well-known datagram port
    pub port: u16,

    /// Wire format spoken by this deployment (never auto-negotiated)
    pub wire_format: WireFormat,

    /// Depth of the bounded ingestion queue between the receive thread
    /// and the processor
    pub ingest_queue_depth: usize,

    /// Classifier thresholds
    pub classifier: ClassifierParams,

    /// Path for exporting session event files
    pub export_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rimsense");

        Self {
            listen_addr: "0.0.0.0".to_string(),
            port: 12345,
            wire_format: WireFormat::Fixed,
            ingest_queue_depth: 100,
            classifier: ClassifierParams::default(),
            export_path: data_dir.join("sessions"),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rimsense")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path)?;
        Ok(())
    }

    /// Socket address string for the receiver bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 12345);
        assert_eq!(config.wire_format, WireFormat::Fixed);
        assert_eq!(config.ingest_queue_depth, 100);
        assert_eq!(config.bind_addr(), "0.0.0.0:12345");
    }

    #[test]
    fn test_default_params_validate() {
        assert!(ClassifierParams::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = ClassifierParams::default();
        params.impact_threshold_g = -1.0;
        assert!(params.validate().is_err());

        let mut params = ClassifierParams::default();
        params.blackout_window_s = 0.0;
        assert!(params.validate().is_err());

        let mut params = ClassifierParams::default();
        params.max_time_after_impact_s = f64::NAN;
        assert!(params.validate().is_err());

        let mut params = ClassifierParams::default();
        params.distance_threshold_mm = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.port, config.port);
        assert_eq!(back.wire_format, config.wire_format);
    }
}
