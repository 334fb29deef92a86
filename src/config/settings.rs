use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::template::parser::DEFAULT_RECURSION_LIMIT;

/// Engine settings, usually read from a YAML file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    /// Deepest block nesting accepted while parsing
    pub recursion_limit: usize,
    /// Drop the newline directly after a block tag or comment
    pub trim_blocks: bool,
    /// HTML-escape variable output unless marked safe
    pub autoescape: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            trim_blocks: false,
            autoescape: true,
        }
    }
}

impl EngineSettings {
    pub fn from_yaml(yml: &str) -> Result<Self> {
        serde_yaml::from_str(yml).context("Invalid settings file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yml = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file {}", path.display()))?;
        Self::from_yaml(&yml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_fields() {
        let settings = EngineSettings::from_yaml("trim_blocks: true\n").unwrap();
        assert!(settings.trim_blocks);
        assert!(settings.autoescape);
        assert_eq!(settings.recursion_limit, DEFAULT_RECURSION_LIMIT);
    }

    #[test]
    fn test_serde_roundtrip() {
        let settings = EngineSettings {
            recursion_limit: 8,
            trim_blocks: true,
            autoescape: false,
        };
        let yml = serde_yaml::to_string(&settings).unwrap();
        assert_eq!(EngineSettings::from_yaml(&yml).unwrap(), settings);
    }

    #[test]
    fn test_json_is_accepted() {
        let settings = EngineSettings::from_yaml(r#"{"autoescape": false}"#).unwrap();
        assert!(!settings.autoescape);
    }

    #[test]
    fn test_invalid_settings() {
        let err = EngineSettings::from_yaml("recursion_limit: lots").unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
    }
}
