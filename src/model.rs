//! Data-model descriptors consumed by forms

use crate::error::ValidationErrors;
use serde::{Deserialize, Serialize};

/// Identifies the data model a form operates on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelMeta {
    pub app_label: String,
    pub model_name: String,
}

impl ModelMeta {
    pub fn new(app_label: &str, model_name: &str) -> Self {
        Self {
            app_label: app_label.to_string(),
            model_name: model_name.to_string(),
        }
    }

    /// Parse an `app_label.model_name` content-type string
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let (app_label, model_name) = content_type.split_once('.')?;
        if app_label.is_empty() || model_name.is_empty() {
            return None;
        }
        Some(Self::new(app_label, model_name))
    }

    /// The `app_label.model_name` content-type string
    pub fn content_type(&self) -> String {
        format!("{}.{}", self.app_label, self.model_name)
    }
}

/// Model-level validation run after a form has written its values onto an instance
pub trait ModelClean {
    fn clean(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type() {
        let model = ModelMeta::new("dcim", "device");
        assert_eq!(model.content_type(), "dcim.device");
    }

    #[test]
    fn test_from_content_type() {
        let model = ModelMeta::from_content_type("ipam.prefix").unwrap();
        assert_eq!(model, ModelMeta::new("ipam", "prefix"));
    }

    #[test]
    fn test_from_content_type_rejects_malformed() {
        assert!(ModelMeta::from_content_type("device").is_none());
        assert!(ModelMeta::from_content_type(".device").is_none());
        assert!(ModelMeta::from_content_type("dcim.").is_none());
    }
}
