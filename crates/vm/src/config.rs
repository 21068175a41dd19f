use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{CREATE_DATA_GAS, MAX_CALL_DEPTH, MAX_CODE_SIZE};

/// Runtime knobs of the VM. Chain rules live in `ChainConfig`, these are the
/// limits and switches that do not depend on the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VMConfig {
    /// Deepest nesting a message call or creation may start at.
    pub max_call_depth: usize,
    /// Largest code a contract creation may deposit, in bytes.
    pub max_code_size: usize,
    /// Gas charged per byte of deposited contract code.
    pub create_data_gas: u64,
    /// When set, only the top-level frame runs; nested calls and creations do nothing.
    pub no_recursion: bool,
}

impl Default for VMConfig {
    fn default() -> Self {
        Self {
            max_call_depth: MAX_CALL_DEPTH,
            max_code_size: MAX_CODE_SIZE,
            create_data_gas: CREATE_DATA_GAS,
            no_recursion: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl VMConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_no_recursion(mut self, no_recursion: bool) -> Self {
        self.no_recursion = no_recursion;
        self
    }
}
