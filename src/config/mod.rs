//! Configuration management for midimap
//!
//! Handles loading, parsing, and hot-reloading of the YAML configuration file.
//! Every field has a default, so an empty or missing file is a valid config.

pub mod watcher;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::error::ConfigError;
use crate::router::CcMap;

pub use watcher::ConfigWatcher;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub mapping: MappingConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

/// MIDI port configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Input port name pattern (case-insensitive substring). None = detached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_port: Option<String>,
    /// Client name announced to the MIDI driver
    pub client_name: String,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: None,
            client_name: "midimap".to_string(),
        }
    }
}

/// Controller numbers and values routed to application actions
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MappingConfig {
    pub slider1_cc: u8,
    pub slider2_cc: u8,
    pub play_cc: u8,
    pub stop_cc: u8,
    pub engage_value: u8,
    pub release_value: u8,
    /// MIDI channel filter, 1-16. None accepts every channel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        let map = CcMap::default();
        Self {
            slider1_cc: map.slider1_cc,
            slider2_cc: map.slider2_cc,
            play_cc: map.play_cc,
            stop_cc: map.stop_cc,
            engage_value: map.engage_value,
            release_value: map.release_value,
            channel: None,
        }
    }
}

/// Mapping session behaviour
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Open the mapping session as soon as the store starts
    pub auto_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { auto_start: true }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily-rotated log file into the platform logs directory
    pub file: bool,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: display.clone(),
                source,
            })?;

        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    /// Load the file if it exists, otherwise fall back to defaults
    ///
    /// Runs before logging is set up, so callers report the fallback themselves.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map
        let config: AppConfig = if content.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: "<inline>".to_string(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.mapping;
        let data_bytes = [
            ("slider1_cc", m.slider1_cc),
            ("slider2_cc", m.slider2_cc),
            ("play_cc", m.play_cc),
            ("stop_cc", m.stop_cc),
            ("engage_value", m.engage_value),
            ("release_value", m.release_value),
        ];
        for (name, value) in data_bytes {
            if value > 127 {
                return Err(ConfigError::Invalid(format!(
                    "mapping.{} must be 0-127, got {}",
                    name, value
                )));
            }
        }

        if let Some(ch) = m.channel {
            if !(1..=16).contains(&ch) {
                return Err(ConfigError::Invalid(format!(
                    "mapping.channel must be 1-16, got {}",
                    ch
                )));
            }
        }

        if m.engage_value == m.release_value {
            return Err(ConfigError::Invalid(
                "mapping.engage_value and mapping.release_value must differ".to_string(),
            ));
        }

        // Each controller number drives exactly one control
        let controllers = [
            ("slider1_cc", m.slider1_cc),
            ("slider2_cc", m.slider2_cc),
            ("play_cc", m.play_cc),
            ("stop_cc", m.stop_cc),
        ];
        for (i, (name, cc)) in controllers.iter().enumerate() {
            if let Some((other, _)) = controllers[i + 1..].iter().find(|(_, c)| c == cc) {
                return Err(ConfigError::Invalid(format!(
                    "mapping.{} and mapping.{} must differ, both are {}",
                    name, other, cc
                )));
            }
        }

        Ok(())
    }

    /// Router table derived from the mapping section
    pub fn cc_map(&self) -> CcMap {
        let m = &self.mapping;
        CcMap {
            slider1_cc: m.slider1_cc,
            slider2_cc: m.slider2_cc,
            play_cc: m.play_cc,
            stop_cc: m.stop_cc,
            engage_value: m.engage_value,
            release_value: m.release_value,
            // Config is 1-based, the wire is 0-based
            channel: m.channel.map(|c| c - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_yaml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cc_map(), CcMap::default());
        assert!(config.session.auto_start);
    }

    #[test]
    fn test_partial_mapping_override() {
        let config = AppConfig::from_yaml(
            r#"
midi:
  input_port: "nanoKONTROL"
mapping:
  play_cc: 45
  channel: 10
"#,
        )
        .unwrap();

        assert_eq!(config.midi.input_port.as_deref(), Some("nanoKONTROL"));
        assert_eq!(config.midi.client_name, "midimap");

        let map = config.cc_map();
        assert_eq!(map.play_cc, 45);
        assert_eq!(map.stop_cc, 42);
        assert_eq!(map.channel, Some(9));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(matches!(
            AppConfig::from_yaml("mapping:\n  slider1_cc: 200\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("mapping:\n  channel: 0\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            AppConfig::from_yaml("mapping:\n  play_cc: 42\n"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_overlapping_controllers() {
        for yaml in [
            "mapping:\n  slider1_cc: 41\n",
            "mapping:\n  slider2_cc: 42\n",
            "mapping:\n  slider2_cc: 0\n",
            "mapping:\n  play_cc: 1\n",
        ] {
            match AppConfig::from_yaml(yaml) {
                Err(ConfigError::Invalid(msg)) => assert!(msg.contains("must differ"), "{}", msg),
                other => panic!("{:?} accepted: {:?}", yaml, other),
            }
        }

        // Swapping numbers keeps them distinct
        let config = AppConfig::from_yaml("mapping:\n  slider1_cc: 41\n  play_cc: 0\n").unwrap();
        assert_eq!(config.cc_map().play_cc, 0);
    }

    #[test]
    fn test_rejects_malformed_yaml() {
        assert!(matches!(
            AppConfig::from_yaml("mapping: [1, 2"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "session:\n  auto_start: false\n").unwrap();

        let config = AppConfig::load(file.path()).await.unwrap();
        assert!(!config.session.auto_start);
    }

    #[tokio::test]
    async fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("absent.yaml"))
            .await
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().join("absent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
