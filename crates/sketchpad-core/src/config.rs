//! Engine start-up configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown render mode: {0}")]
    InvalidMode(String),
}

/// Requested presentation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Immediate-mode raster drawing.
    #[default]
    #[serde(rename = "2d")]
    TwoD,
    /// GPU module.
    #[serde(rename = "3d")]
    ThreeD,
}

impl RenderMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::TwoD => "2d",
            RenderMode::ThreeD => "3d",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "2d" => Ok(RenderMode::TwoD),
            "3d" => Ok(RenderMode::ThreeD),
            other => Err(ConfigError::InvalidMode(other.to_string())),
        }
    }
}

/// Options read once when the board is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// `webgpu=0`: never attempt the GPU module.
    pub gpu_disabled: bool,
    /// `mode=3d` starts in GPU mode; anything else starts in 2d.
    pub initial_mode: RenderMode,
}

impl EngineConfig {
    /// Parse a query string or hash fragment such as `?mode=3d&webgpu=0`.
    pub fn from_query(query: &str) -> Self {
        let mut config = Self::default();
        config.merge_query(query);
        config
    }

    /// Apply any recognized parameters in `query` on top of `self`.
    pub fn merge_query(&mut self, query: &str) {
        let query = query.trim_start_matches(['?', '#']);
        for pair in query.split('&') {
            let mut parts = pair.splitn(2, '=');
            let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                continue;
            };
            match key {
                "webgpu" => self.gpu_disabled = value == "0",
                "mode" => {
                    self.initial_mode = value.parse().unwrap_or_default();
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_query("");
        assert!(!config.gpu_disabled);
        assert_eq!(config.initial_mode, RenderMode::TwoD);
    }

    #[test]
    fn test_query_params() {
        let config = EngineConfig::from_query("?mode=3d&webgpu=0");
        assert!(config.gpu_disabled);
        assert_eq!(config.initial_mode, RenderMode::ThreeD);

        let config = EngineConfig::from_query("#mode=banana&webgpu=1");
        assert!(!config.gpu_disabled);
        assert_eq!(config.initial_mode, RenderMode::TwoD);
    }

    #[test]
    fn test_merge_keeps_earlier_values() {
        let mut config = EngineConfig::from_query("?mode=3d");
        config.merge_query("#webgpu=0");
        assert_eq!(config.initial_mode, RenderMode::ThreeD);
        assert!(config.gpu_disabled);
    }

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("3d".parse::<RenderMode>(), Ok(RenderMode::ThreeD));
        assert_eq!(
            "4d".parse::<RenderMode>(),
            Err(ConfigError::InvalidMode("4d".to_string()))
        );
        assert_eq!(RenderMode::TwoD.to_string(), "2d");
    }
}
