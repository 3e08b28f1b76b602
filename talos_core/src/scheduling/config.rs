//! Scheduler configuration
//!
//! File-loadable settings for the periodic driver: tick period, scheduler
//! name, and recording defaults. Both TOML and YAML are accepted, detected
//! by extension.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TalosError, TalosResult};

/// Recording-related settings carried inside [`SchedulerConfig`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordingSettings {
    /// Base directory for recordings (default: `~/.talos/recordings`)
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Prefix for timestamped session file names
    #[serde(default = "default_session_prefix")]
    pub session_prefix: String,
}

fn default_session_prefix() -> String {
    "session".to_string()
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            base_dir: None,
            session_prefix: default_session_prefix(),
        }
    }
}

/// Top-level scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerConfig {
    /// Scheduler name, used in logs
    #[serde(default = "default_name")]
    pub name: String,
    /// Fixed control cycle period in milliseconds
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Recording defaults
    #[serde(default)]
    pub recording: RecordingSettings,
}

fn default_name() -> String {
    "TalosScheduler".to_string()
}

fn default_tick_period_ms() -> u64 {
    20
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            tick_period_ms: default_tick_period_ms(),
            recording: RecordingSettings::default(),
        }
    }
}

impl SchedulerConfig {
    /// The tick period as a `Duration`
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Load config from a file (auto-detect format by extension)
    pub fn from_file<P: AsRef<Path>>(path: P) -> TalosResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TalosError::config(format!("Failed to read config: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str());
        match extension {
            Some("toml") => Self::from_toml(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml(&contents),
            _ => Self::from_yaml(&contents).or_else(|_| Self::from_toml(&contents)),
        }
    }

    /// Parse config from a YAML string
    pub fn from_yaml(contents: &str) -> TalosResult<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| TalosError::config(format!("Failed to parse config YAML: {}", e)))
    }

    /// Parse config from a TOML string
    pub fn from_toml(contents: &str) -> TalosResult<Self> {
        toml::from_str(contents)
            .map_err(|e| TalosError::config(format!("Failed to parse config TOML: {}", e)))
    }

    /// Find and load config from standard search paths
    ///
    /// Search order:
    /// 1. ./talos.toml or ./talos.yaml
    /// 2. ~/.talos/config.toml or ~/.talos/config.yaml
    pub fn find_and_load() -> TalosResult<Self> {
        let mut paths = vec![
            PathBuf::from("talos.toml"),
            PathBuf::from("talos.yaml"),
            PathBuf::from("talos.yml"),
        ];
        if let Some(home) = dirs::home_dir() {
            let talos_dir = home.join(".talos");
            paths.push(talos_dir.join("config.toml"));
            paths.push(talos_dir.join("config.yaml"));
        }

        for path in paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Err(TalosError::config(
            "No config file found in standard locations",
        ))
    }

    /// Save config to a file (format by extension, TOML default)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TalosResult<()> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|s| s.to_str());

        let contents = match extension {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)
                .map_err(|e| TalosError::config(format!("Failed to serialize YAML: {}", e)))?,
            _ => toml::to_string_pretty(self)
                .map_err(|e| TalosError::config(format!("Failed to serialize TOML: {}", e)))?,
        };

        std::fs::write(path, contents)
            .map_err(|e| TalosError::config(format!("Failed to write config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.name, "TalosScheduler");
        assert_eq!(config.tick_period(), Duration::from_millis(20));
        assert_eq!(config.recording.session_prefix, "session");
    }

    #[test]
    fn test_config_from_toml() {
        let toml = r#"
name = "MatchScheduler"
tick_period_ms = 10

[recording]
session_prefix = "match"
"#;
        let config = SchedulerConfig::from_toml(toml).unwrap();
        assert_eq!(config.name, "MatchScheduler");
        assert_eq!(config.tick_period(), Duration::from_millis(10));
        assert_eq!(config.recording.session_prefix, "match");
        assert_eq!(config.recording.base_dir, None);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
name: PracticeScheduler
tick_period_ms: 50
recording:
  base_dir: /tmp/recordings
  session_prefix: practice
"#;
        let config = SchedulerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "PracticeScheduler");
        assert_eq!(config.tick_period_ms, 50);
        assert_eq!(
            config.recording.base_dir,
            Some(PathBuf::from("/tmp/recordings"))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SchedulerConfig::from_toml("tick_period_ms = 5").unwrap();
        assert_eq!(config.name, "TalosScheduler");
        assert_eq!(config.tick_period_ms, 5);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talos.toml");

        let mut config = SchedulerConfig::default();
        config.name = "SavedScheduler".to_string();
        config.save(&path).unwrap();

        let loaded = SchedulerConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
