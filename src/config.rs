use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::EngineSettings;
use crate::session::solve::PuzzleType;

const MAX_DELAY_MS: u64 = 10_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_puzzle_type")]
    pub puzzle_type: String,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_export_delay_ms")]
    pub export_delay_ms: u64,
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,
    #[serde(default = "default_size_warning_bytes")]
    pub size_warning_bytes: usize,
    #[serde(
        default = "default_storage_quota_bytes",
        skip_serializing_if = "Option::is_none"
    )]
    pub storage_quota_bytes: Option<usize>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_puzzle_type() -> String {
    PuzzleType::default().key().to_string()
}
fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_tick_rate_ms() -> u64 {
    10
}
fn default_export_delay_ms() -> u64 {
    500
}
fn default_save_debounce_ms() -> u64 {
    500
}
fn default_refresh_delay_ms() -> u64 {
    500
}
fn default_size_warning_bytes() -> usize {
    4_718_592
}
fn default_storage_quota_bytes() -> Option<usize> {
    Some(5 * 1024 * 1024)
}
fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("simplict")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            puzzle_type: default_puzzle_type(),
            theme: default_theme(),
            tick_rate_ms: default_tick_rate_ms(),
            export_delay_ms: default_export_delay_ms(),
            save_debounce_ms: default_save_debounce_ms(),
            refresh_delay_ms: default_refresh_delay_ms(),
            size_warning_bytes: default_size_warning_bytes(),
            storage_quota_bytes: default_storage_quota_bytes(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };
        config.validate();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("simplict")
            .join("config.toml")
    }

    /// Clamp values that would stall or spin the timer and normalize the
    /// puzzle name. Call after deserialization; hand-edited files end up here.
    pub fn validate(&mut self) {
        self.puzzle_type = self.puzzle().key().to_string();
        self.tick_rate_ms = self.tick_rate_ms.clamp(1, 1_000);
        self.export_delay_ms = self.export_delay_ms.min(MAX_DELAY_MS);
        self.save_debounce_ms = self.save_debounce_ms.min(MAX_DELAY_MS);
        self.refresh_delay_ms = self.refresh_delay_ms.min(MAX_DELAY_MS);
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    /// Unknown names fall back to 3x3.
    pub fn puzzle(&self) -> PuzzleType {
        self.puzzle_type.parse().unwrap_or_default()
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            export_delay: Duration::from_millis(self.export_delay_ms),
            save_debounce: Duration::from_millis(self.save_debounce_ms),
            refresh_delay: Duration::from_millis(self.refresh_delay_ms),
            size_warning_bytes: self.size_warning_bytes,
            puzzle: self.puzzle(),
            ..EngineSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.puzzle_type, "3x3");
        assert_eq!(config.tick_rate_ms, 10);
        assert_eq!(config.export_delay_ms, 500);
        assert_eq!(config.save_debounce_ms, 500);
        assert_eq!(config.storage_quota_bytes, Some(5 * 1024 * 1024));
        assert!(config.data_dir.contains("simplict"));
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
puzzle_type = "Mega"
theme = "catppuccin-mocha"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.puzzle(), PuzzleType::Megaminx);
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.size_warning_bytes, 4_718_592);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.puzzle_type, deserialized.puzzle_type);
        assert_eq!(config.storage_quota_bytes, deserialized.storage_quota_bytes);
        assert_eq!(config.data_dir, deserialized.data_dir);
    }

    #[test]
    fn test_validate_clamps_and_normalizes() {
        let mut config = Config {
            puzzle_type: "7x7".to_string(),
            tick_rate_ms: 0,
            export_delay_ms: 60_000,
            data_dir: "  ".to_string(),
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.puzzle_type, "3x3");
        assert_eq!(config.tick_rate_ms, 1);
        assert_eq!(config.export_delay_ms, MAX_DELAY_MS);
        assert!(!config.data_dir.trim().is_empty());
    }

    #[test]
    fn test_validate_canonicalizes_puzzle_alias() {
        let mut config = Config {
            puzzle_type: "megaminx".to_string(),
            ..Config::default()
        };
        config.validate();
        assert_eq!(config.puzzle_type, "Mega");
    }

    #[test]
    fn test_engine_settings_follow_config() {
        let config = Config {
            export_delay_ms: 250,
            puzzle_type: "4x4".to_string(),
            ..Config::default()
        };
        let settings = config.engine_settings();
        assert_eq!(settings.export_delay, Duration::from_millis(250));
        assert_eq!(settings.puzzle, PuzzleType::Cube4);
        assert!(!settings.manual_entry);
    }
}
