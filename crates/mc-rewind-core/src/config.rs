use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::error::RewindError;

/// How a 1.8 client is shown the 1.9 attack cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CooldownIndicator {
    Disabled,
    #[default]
    Title,
    ActionBar,
    BossBar,
}

impl CooldownIndicator {
    /// Parse a config value. Unknown values disable the indicator.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "disabled" => Self::Disabled,
            "title" => Self::Title,
            "action_bar" => Self::ActionBar,
            "boss_bar" => Self::BossBar,
            other => {
                warn!("Invalid cooldown indicator \"{other}\", disabling it");
                Self::Disabled
            }
        }
    }
}

fn lenient_indicator<'de, D: Deserializer<'de>>(d: D) -> Result<CooldownIndicator, D::Error> {
    let raw = String::deserialize(d)?;
    Ok(CooldownIndicator::parse(&raw))
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewindConfig {
    #[serde(default, deserialize_with = "lenient_indicator")]
    pub cooldown_indicator: CooldownIndicator,
    /// Tick period in milliseconds. Default: 50 (one game tick).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// zlib level for re-encoded chunk payloads (0-9).
    #[serde(default = "default_chunk_compression_level")]
    pub chunk_compression_level: u32,
}

fn default_tick_interval_ms() -> u64 {
    50
}

fn default_chunk_compression_level() -> u32 {
    mc_rewind_proto::compression::DEFAULT_LEVEL
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self {
            cooldown_indicator: CooldownIndicator::default(),
            tick_interval_ms: default_tick_interval_ms(),
            chunk_compression_level: default_chunk_compression_level(),
        }
    }
}

impl RewindConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RewindError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, RewindError> {
        let mut config: Self = toml::from_str(contents)?;
        config.chunk_compression_level = config.chunk_compression_level.min(9);
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let config = RewindConfig::from_toml_str(
            r#"
            cooldown_indicator = "boss_bar"
            tick_interval_ms = 100
            chunk_compression_level = 9
        "#,
        )
        .unwrap();
        assert_eq!(config.cooldown_indicator, CooldownIndicator::BossBar);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.chunk_compression_level, 9);
    }

    #[test]
    fn defaults_when_absent() {
        let config = RewindConfig::from_toml_str("").unwrap();
        assert_eq!(config.cooldown_indicator, CooldownIndicator::Title);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.chunk_compression_level, 6);
    }

    #[test]
    fn unknown_indicator_disables() {
        let config = RewindConfig::from_toml_str(r#"cooldown_indicator = "fireworks""#).unwrap();
        assert_eq!(config.cooldown_indicator, CooldownIndicator::Disabled);
    }

    #[test]
    fn indicator_accepts_dashes_and_case() {
        assert_eq!(
            CooldownIndicator::parse("ACTION-BAR"),
            CooldownIndicator::ActionBar
        );
    }

    #[test]
    fn level_is_clamped() {
        let config = RewindConfig::from_toml_str("chunk_compression_level = 42").unwrap();
        assert_eq!(config.chunk_compression_level, 9);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(matches!(
            RewindConfig::from_toml_str("tick_interval_ms = \"soon\""),
            Err(RewindError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            RewindConfig::load("/nonexistent/rewind.toml"),
            Err(RewindError::Io(_))
        ));
    }
}
