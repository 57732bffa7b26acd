use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Line-item properties below this confidence are noise (section
    /// headers, check images) and never become candidates.
    pub min_property_confidence: f64,
    /// Entity type the service uses for transaction rows.
    pub line_item_type: String,
    /// Currency for typed money values that carry no currency code.
    pub default_currency: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_property_confidence: 0.1,
            line_item_type: "table_item".to_string(),
            default_currency: "USD".to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parse extraction config")
    }
}

/// Load a TOML config, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<ExtractConfig> {
    let p = path.as_ref();
    if !p.exists() {
        return Ok(ExtractConfig::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    ExtractConfig::from_toml_str(&s).with_context(|| format!("load {}", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = ExtractConfig::from_toml_str("min_property_confidence = 0.25\n").unwrap();
        assert_eq!(cfg.min_property_confidence, 0.25);
        assert_eq!(cfg.line_item_type, "table_item");
        assert_eq!(cfg.default_currency, "USD");
    }

    #[test]
    fn test_missing_file_is_default() {
        let cfg = load_config("/nonexistent/tally/extract.toml").unwrap();
        assert_eq!(cfg, ExtractConfig::default());
    }

    #[test]
    fn test_bad_toml_is_error() {
        assert!(ExtractConfig::from_toml_str("min_property_confidence = \"high\"").is_err());
    }
}
