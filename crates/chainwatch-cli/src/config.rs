use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use chainwatch_document::DocumentParams;
use chainwatch_stream::CodecConfig;

/// Top-level configuration for the chainwatch CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainwatchConfig {
    /// Log filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Decode limits.
    #[serde(default)]
    pub codec: CodecConfig,

    /// Document rendering options.
    #[serde(default)]
    pub output: DocumentParams,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainwatchConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            codec: CodecConfig::default(),
            output: DocumentParams::default(),
        }
    }
}

impl ChainwatchConfig {
    pub const FILE_NAME: &str = "chainwatch.toml";

    /// Resolves the config for a run. An explicit path must exist; otherwise
    /// `chainwatch.toml` in `search_dir` is used when present.
    pub fn resolve(explicit: Option<&Path>, search_dir: &Path) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = search_dir.join(Self::FILE_NAME);
                if path.is_file() {
                    Self::from_file(&path)?
                } else {
                    tracing::debug!("No {} found, using defaults", path.display());
                    Self::default()
                }
            }
        };
        config.codec.validate().context("Invalid codec limits")?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}
