//! Configuration handling for record forms

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_LOOKUP_CHOICES_URL: &str = "/lookup-choices/";
pub const DEFAULT_FILTER_FORM_EXTRA: usize = 3;

/// User configuration for form construction
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FormsConfig {
    /// Endpoint serving lookup-type choices to filter forms
    pub lookup_choices_url: Option<String>,
    /// Blank rows appended to an unbound filter formset
    pub filter_form_extra: Option<usize>,
    /// Hosts an absolute return URL may point at
    pub allowed_return_hosts: Option<Vec<String>>,
}

impl FormsConfig {
    pub fn lookup_choices_url(&self) -> &str {
        self.lookup_choices_url
            .as_deref()
            .unwrap_or(DEFAULT_LOOKUP_CHOICES_URL)
    }

    pub fn filter_form_extra(&self) -> usize {
        self.filter_form_extra.unwrap_or(DEFAULT_FILTER_FORM_EXTRA)
    }

    pub fn allowed_return_hosts(&self) -> &[String] {
        self.allowed_return_hosts.as_deref().unwrap_or(&[])
    }

    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "nautobot", "record-forms")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, defaulting when it does not exist
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: FormsConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = FormsConfig::default();
        assert!(config.lookup_choices_url.is_none());
        assert!(config.filter_form_extra.is_none());
        assert!(config.allowed_return_hosts.is_none());
        assert_eq!(config.lookup_choices_url(), "/lookup-choices/");
        assert_eq!(config.filter_form_extra(), 3);
        assert!(config.allowed_return_hosts().is_empty());
    }

    #[test]
    fn test_serialization() {
        let config = FormsConfig {
            lookup_choices_url: Some("/api/lookup-choices/".to_string()),
            filter_form_extra: Some(5),
            allowed_return_hosts: Some(vec!["nautobot.example.com".to_string()]),
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: FormsConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, config);
        assert_eq!(parsed.lookup_choices_url(), "/api/lookup-choices/");
        assert_eq!(parsed.filter_form_extra(), 5);
    }

    #[test]
    fn test_deserialize_from_empty_json() {
        let parsed: FormsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed, FormsConfig::default());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"filter_form_extra": 1, "unknown_field": "value"}"#;
        let parsed: FormsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.filter_form_extra(), 1);
    }

    #[test]
    fn test_config_path_returns_option() {
        let _path = FormsConfig::config_path();
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("record-forms-missing").join("config.json");
        let config = FormsConfig::load_from(&path).unwrap();
        assert_eq!(config, FormsConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("record-forms-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");
        let config = FormsConfig {
            filter_form_extra: Some(1),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(FormsConfig::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = std::env::temp_dir().join(format!("record-forms-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FormsConfig::load_from(&path).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
