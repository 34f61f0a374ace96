// Configuration utilities
// Author: Gabriel Demetrios Lafis

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub download: DownloadConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

/// CSV input configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub delimiter: char,
}

/// Filtered-data download configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub file_name: String,
}

/// Dashboard presentation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub histogram_bins: usize,
    pub preview_rows: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig { delimiter: ',' }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        DownloadConfig {
            file_name: "filtered_data.csv".to_string(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            histogram_bins: 30,
            preview_rows: 20,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a `.json`, `.yaml` or `.yml` file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let config: Config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                serde_json::from_str(&contents).map_err(|e| AppError::Config(e.to_string()))?
            }
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&contents).map_err(|e| AppError::Config(e.to_string()))?
            }
            _ => {
                return Err(AppError::Config(format!(
                    "Unsupported config file format: {}",
                    path.display()
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings no view can work with
    pub fn validate(&self) -> AppResult<()> {
        if !self.input.delimiter.is_ascii() {
            return Err(AppError::Config(format!(
                "CSV delimiter '{}' must be a single ASCII character",
                self.input.delimiter
            )));
        }
        if self.dashboard.histogram_bins == 0 {
            return Err(AppError::Config("histogram_bins must be positive".to_string()));
        }
        if self.download.file_name.trim().is_empty() {
            return Err(AppError::Config("download file name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects
    pub fn delimiter_byte(&self) -> u8 {
        self.input.delimiter as u8
    }

    /// Get the log level filter
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" => log::LevelFilter::Warn,
            "info" => log::LevelFilter::Info,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.download.file_name, "filtered_data.csv");
        assert_eq!(config.dashboard.histogram_bins, 30);
        assert_eq!(config.delimiter_byte(), b',');
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "logging:\n  level: debug\ndashboard:\n  histogram_bins: 12").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);
        assert_eq!(config.dashboard.histogram_bins, 12);
        assert_eq!(config.dashboard.preview_rows, 20);
        assert_eq!(config.download.file_name, "filtered_data.csv");
    }

    #[test]
    fn json_config() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"input": {{"delimiter": ";"}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.delimiter_byte(), b';');
    }

    #[test]
    fn rejects_unknown_extension_and_bad_values() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(Config::from_file(file.path()), Err(AppError::Config(_))));

        let mut config = Config::default();
        config.dashboard.histogram_bins = 0;
        assert!(config.validate().is_err());
    }
}
