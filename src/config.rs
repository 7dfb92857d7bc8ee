//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_TAG_KEY: &str = "pagemap";
pub const DEFAULT_FUNCTION_SEPARATOR: &str = "->";
pub const DEFAULT_IGNORE_SYMBOL: &str = "-";

/// Engine configuration, consumed once at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag key the engine reads expressions from, e.g. `pagemap`
    pub tag_key: String,
    /// Token splitting the selector from the function call, e.g. `->`
    pub function_separator: String,
    /// Tag value marking a field as skipped, e.g. `-`
    pub ignore_symbol: String,
    /// Fail on lossy conversions instead of falling back to zero values
    pub strict_cast: bool,
    /// Log parsed expressions and untagged fields
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_key: DEFAULT_TAG_KEY.to_string(),
            function_separator: DEFAULT_FUNCTION_SEPARATOR.to_string(),
            ignore_symbol: DEFAULT_IGNORE_SYMBOL.to_string(),
            strict_cast: false,
            debug: false,
        }
    }
}

impl Config {
    /// Parse a configuration from JSON, filling omitted keys with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("failed to parse config JSON: {}", e)))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.tag_key.is_empty() {
            return Err(Error::Configuration("tag_key must not be empty".to_string()));
        }
        if self.function_separator.is_empty() {
            return Err(Error::Configuration(
                "function_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
