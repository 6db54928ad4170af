//! In-memory filter-set registry loaded from JSON

use super::traits::{FilterFieldData, FilterSet, FilterSetRegistry};
use crate::error::Result;
use crate::forms::Choice;
use crate::model::ModelMeta;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Filters and per-filter value metadata for one model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelFilters {
    pub filters: FilterSet,
    /// Keyed by filter name; lookups fall back to the bare field name
    #[serde(default)]
    pub field_data: BTreeMap<String, FilterFieldData>,
}

/// Registry keyed by `app_label.model_name`
#[derive(Debug, Clone, Default)]
pub struct StaticFilterSetRegistry {
    models: HashMap<String, ModelFilters>,
}

impl StaticFilterSetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, model: &ModelMeta, filters: ModelFilters) {
        self.models.insert(model.content_type(), filters);
    }

    /// Parse `{"app.model": {"filters": [...], "field_data": {...}}}`
    pub fn from_json(json: &str) -> Result<Self> {
        let models: HashMap<String, ModelFilters> = serde_json::from_str(json)?;
        debug!(models = models.len(), "Loaded filter-set registry");
        Ok(Self { models })
    }

    fn model(&self, model: &ModelMeta) -> Option<&ModelFilters> {
        self.models.get(&model.content_type())
    }
}

impl FilterSetRegistry for StaticFilterSetRegistry {
    fn filterset_for_model(&self, model: &ModelMeta) -> Option<FilterSet> {
        self.model(model).map(|entry| entry.filters.clone())
    }

    fn filterset_field_data(
        &self,
        model: &ModelMeta,
        lookup_type: &str,
        values: &[String],
    ) -> FilterFieldData {
        let Some(entry) = self.model(model) else {
            return FilterFieldData::Others;
        };
        let base_name = lookup_type.split("__").next().unwrap_or(lookup_type);
        let data = entry
            .field_data
            .get(lookup_type)
            .or_else(|| entry.field_data.get(base_name))
            .cloned()
            .unwrap_or(FilterFieldData::Others);

        match data {
            // Selected objects are rendered as pre-selected options
            FilterFieldData::DynamicChoices {
                data_url,
                choices,
                content_type,
                value_field,
            } if choices.is_empty() => FilterFieldData::DynamicChoices {
                data_url,
                choices: values
                    .iter()
                    .map(|value| Choice::new(value.as_str(), value.as_str()))
                    .collect(),
                content_type,
                value_field,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use pretty_assertions::assert_eq;

    const REGISTRY: &str = r#"{
        "dcim.device": {
            "filters": [
                {"name": "name", "field_name": "name"},
                {"name": "name__ic", "field_name": "name", "lookup_expr": "icontains"},
                {"name": "status", "field_name": "status", "label": "Status"}
            ],
            "field_data": {
                "status": {
                    "type": "static-choices",
                    "choices": [{"value": "active", "label": "Active"}],
                    "allow_multiple": true
                },
                "site": {
                    "type": "dynamic-choices",
                    "data_url": "/api/dcim/sites/",
                    "value_field": "slug"
                }
            }
        }
    }"#;

    fn device() -> ModelMeta {
        ModelMeta::new("dcim", "device")
    }

    #[test]
    fn test_filterset_for_model() {
        let registry = StaticFilterSetRegistry::from_json(REGISTRY).unwrap();
        let filterset = registry.filterset_for_model(&device()).unwrap();
        let names: Vec<&str> = filterset.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "name__ic", "status"]);
        assert!(registry.filterset_for_model(&ModelMeta::new("dcim", "rack")).is_none());
    }

    #[test]
    fn test_field_data_falls_back_to_field_name() {
        let registry = StaticFilterSetRegistry::from_json(REGISTRY).unwrap();
        let data = registry.filterset_field_data(&device(), "status__n", &[]);
        assert!(matches!(data, FilterFieldData::StaticChoices { allow_multiple: true, .. }));
        assert_eq!(
            registry.filterset_field_data(&device(), "name__ic", &[]),
            FilterFieldData::Others
        );
    }

    #[test]
    fn test_dynamic_choices_preselect_values() {
        let registry = StaticFilterSetRegistry::from_json(REGISTRY).unwrap();
        let data = registry.filterset_field_data(&device(), "site", &["hq".to_string()]);
        assert_eq!(
            data,
            FilterFieldData::DynamicChoices {
                data_url: "/api/dcim/sites/".to_string(),
                choices: vec![Choice::new("hq", "hq")],
                content_type: None,
                value_field: Some("slug".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_model_is_others() {
        let registry = StaticFilterSetRegistry::new();
        assert_eq!(
            registry.filterset_field_data(&device(), "status", &[]),
            FilterFieldData::Others
        );
    }

    #[test]
    fn test_register() {
        let mut registry = StaticFilterSetRegistry::new();
        registry.register(&device(), ModelFilters::default());
        assert!(registry.filterset_for_model(&device()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let err = StaticFilterSetRegistry::from_json("[").unwrap_err();
        assert!(matches!(err, FormError::Serialization(_)));
    }
}
