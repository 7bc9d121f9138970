// Emulator configuration, persisted as JSON beside the executable

use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the configuration file
const CONFIG_FILE: &str = "famicore.json";

/// User-facing configuration knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Host audio sample rate in Hz
    pub audio_sample_rate: u32,
    /// Directory for save-state slot files (used when no ROM path is
    /// available to anchor them)
    pub save_state_dir: PathBuf,
    /// Emit a reference trace line per instruction (test harness use)
    pub trace_log: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            audio_sample_rate: crate::apu::DEFAULT_SAMPLE_RATE,
            save_state_dir: PathBuf::from("saves"),
            trace_log: false,
        }
    }
}

impl EmulatorConfig {
    /// Load the configuration file, falling back to defaults
    ///
    /// A missing file is normal (first run); a malformed one is reported
    /// and replaced by defaults rather than failing the session.
    pub fn load_or_default() -> Self {
        match std::fs::read_to_string(CONFIG_FILE) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("ignoring malformed {}: {}", CONFIG_FILE, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration
    pub fn save(&self) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(CONFIG_FILE, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmulatorConfig::default();
        assert_eq!(config.audio_sample_rate, 44_100);
        assert!(!config.trace_log);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: EmulatorConfig =
            serde_json::from_str(r#"{"audio_sample_rate": 48000}"#).expect("parses");
        assert_eq!(config.audio_sample_rate, 48_000);
        assert_eq!(config.save_state_dir, PathBuf::from("saves"));
    }

    #[test]
    fn test_roundtrip() {
        let config = EmulatorConfig::default();
        let json = serde_json::to_string(&config).expect("serializes");
        let restored: EmulatorConfig = serde_json::from_str(&json).expect("parses");
        assert_eq!(restored.audio_sample_rate, config.audio_sample_rate);
    }
}
