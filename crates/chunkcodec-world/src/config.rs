use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::biome::DEFAULT_BIOME;
use crate::block::BlockState;
use crate::version::GameVersion;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid default block '{value}': {reason}")]
    InvalidBlock { value: String, reason: String },

    #[error("invalid target version '{value}': {reason}")]
    InvalidVersion { value: String, reason: String },
}

/// Settings for reading and writing chunks.
///
/// ```toml
/// default_block = "minecraft:stone"
/// default_biome = 1
/// skip_corrupt_sections = false
/// target_version = "1.16.5"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkConfig {
    /// Block registered at palette index 1 of newly created sections.
    #[serde(default = "default_block")]
    pub default_block: String,
    /// Biome id used when a chunk carries no biome array.
    #[serde(default = "default_biome")]
    pub default_biome: i32,
    /// Drop sections whose packed data fails to decode instead of failing
    /// the whole chunk.
    #[serde(default)]
    pub skip_corrupt_sections: bool,
    /// Version written by [`crate::storage::save_chunk`] callers that do not
    /// pick one.
    #[serde(default = "default_target_version")]
    pub target_version: String,
}

fn default_block() -> String {
    "minecraft:stone".into()
}

fn default_biome() -> i32 {
    DEFAULT_BIOME
}

fn default_target_version() -> String {
    "1.16.5".into()
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            default_block: default_block(),
            default_biome: default_biome(),
            skip_corrupt_sections: false,
            target_version: default_target_version(),
        }
    }
}

impl ChunkConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.default_block_state()?;
        config.target_version()?;
        Ok(config)
    }

    pub fn default_block_state(&self) -> Result<BlockState, ConfigError> {
        self.default_block
            .parse()
            .map_err(|reason| ConfigError::InvalidBlock {
                value: self.default_block.clone(),
                reason,
            })
    }

    pub fn target_version(&self) -> Result<GameVersion, ConfigError> {
        self.target_version
            .parse()
            .map_err(|reason| ConfigError::InvalidVersion {
                value: self.target_version.clone(),
                reason,
            })
    }
}
