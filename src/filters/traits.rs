//! Trait abstraction for the query-filtering collaborator to enable mocking in tests

use crate::forms::Choice;
use crate::model::ModelMeta;
use serde::{Deserialize, Serialize};

/// One declared filter of a filter-set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDeclaration {
    /// Query parameter name, e.g. `name__ic`
    pub name: String,
    /// Model field the filter applies to
    pub field_name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "default_lookup_expr")]
    pub lookup_expr: String,
}

fn default_lookup_expr() -> String {
    "exact".to_string()
}

impl FilterDeclaration {
    pub fn new(name: &str, field_name: &str, lookup_expr: &str) -> Self {
        Self {
            name: name.to_string(),
            field_name: field_name.to_string(),
            label: None,
            lookup_expr: lookup_expr.to_string(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    /// Whether the filter name carries a lookup suffix
    pub fn has_lookup(&self) -> bool {
        self.name.contains("__")
    }
}

/// Filters declared for a model, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: Vec<FilterDeclaration>,
}

impl FilterSet {
    pub fn new(filters: Vec<FilterDeclaration>) -> Self {
        Self { filters }
    }

    pub fn with_filter(mut self, filter: FilterDeclaration) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterDeclaration> {
        self.filters.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FilterDeclaration> {
        self.filters.iter().find(|filter| filter.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// How the value of a filter should be collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FilterFieldData {
    StaticChoices {
        choices: Vec<Choice>,
        #[serde(default)]
        allow_multiple: bool,
    },
    DynamicChoices {
        data_url: String,
        #[serde(default)]
        choices: Vec<Choice>,
        #[serde(default)]
        content_type: Option<String>,
        #[serde(default)]
        value_field: Option<String>,
    },
    Others,
}

/// Source of filter-sets and filter field metadata
#[cfg_attr(test, mockall::automock)]
pub trait FilterSetRegistry {
    /// Filter-set declared for `model`, if any
    fn filterset_for_model(&self, model: &ModelMeta) -> Option<FilterSet>;

    /// Value collection metadata for `lookup_type` given the submitted values
    fn filterset_field_data(
        &self,
        model: &ModelMeta,
        lookup_type: &str,
        values: &[String],
    ) -> FilterFieldData;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_declaration_defaults() {
        let filter: FilterDeclaration =
            serde_json::from_value(json!({"name": "status", "field_name": "status"})).unwrap();
        assert_eq!(filter.lookup_expr, "exact");
        assert!(filter.label.is_none());
        assert!(!filter.has_lookup());
        assert!(FilterDeclaration::new("name__ic", "name", "icontains").has_lookup());
    }

    #[test]
    fn test_filterset_lookup() {
        let filterset = FilterSet::default()
            .with_filter(FilterDeclaration::new("name", "name", "exact"))
            .with_filter(FilterDeclaration::new("name__ic", "name", "icontains"));
        assert_eq!(filterset.get("name__ic").unwrap().lookup_expr, "icontains");
        assert!(filterset.get("slug").is_none());
        assert_eq!(filterset.iter().count(), 2);
    }

    #[test]
    fn test_field_data_tagging() {
        let data: FilterFieldData = serde_json::from_value(json!({
            "type": "static-choices",
            "choices": [{"value": "active", "label": "Active"}],
            "allow_multiple": true,
        }))
        .unwrap();
        assert_eq!(
            data,
            FilterFieldData::StaticChoices {
                choices: vec![Choice::new("active", "Active")],
                allow_multiple: true,
            }
        );

        let data: FilterFieldData = serde_json::from_value(json!({
            "type": "dynamic-choices",
            "data_url": "/api/extras/statuses/",
            "content_type": "dcim.device",
        }))
        .unwrap();
        assert!(matches!(
            data,
            FilterFieldData::DynamicChoices {
                content_type: Some(ct),
                value_field: None,
                ..
            } if ct == "dcim.device"
        ));

        let data: FilterFieldData = serde_json::from_value(json!({"type": "others"})).unwrap();
        assert_eq!(data, FilterFieldData::Others);
    }
}
