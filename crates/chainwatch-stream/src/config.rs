use serde::{Deserialize, Serialize};

use chainwatch_types::{ChainwatchError, Result};

/// Limits applied while encoding and decoding a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Maximum number of entries in a decoded map or collection.
    #[serde(default = "default_max_collection_len")]
    pub max_collection_len: usize,

    /// Maximum byte length of a decoded string.
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,

    /// Maximum length of a decoded error cause chain.
    #[serde(default = "default_max_error_depth")]
    pub max_error_depth: usize,
}

fn default_max_collection_len() -> usize {
    65_536
}

fn default_max_string_len() -> usize {
    1024 * 1024
}

fn default_max_error_depth() -> usize {
    16
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_collection_len: default_max_collection_len(),
            max_string_len: default_max_string_len(),
            max_error_depth: default_max_error_depth(),
        }
    }
}

impl CodecConfig {
    /// Rejects limits that would make every non-trivial stream undecodable.
    pub fn validate(&self) -> Result<()> {
        if self.max_collection_len == 0 {
            return Err(ChainwatchError::Config(
                "codec.max_collection_len must be at least 1".into(),
            ));
        }
        if self.max_string_len == 0 {
            return Err(ChainwatchError::Config(
                "codec.max_string_len must be at least 1".into(),
            ));
        }
        if self.max_error_depth == 0 {
            return Err(ChainwatchError::Config(
                "codec.max_error_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
