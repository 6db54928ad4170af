//! Filter form whose field choices and value widget follow the model's filter-set

use super::lookup::build_lookup_label;
use super::traits::{FilterFieldData, FilterSetRegistry};
use crate::config::FormsConfig;
use crate::error::{FormError, Result};
use crate::forms::{
    Choice, CleanForm, Form, FormField, FormOptions, Widget, API_SELECT_CLASS,
    STATIC_SELECT2_CLASS,
};
use crate::model::ModelMeta;
use tracing::debug;

pub const LOOKUP_FIELD: &str = "lookup_field";
pub const LOOKUP_TYPE: &str = "lookup_type";
pub const VALUE_FIELD: &str = "value";

/// One `field / lookup / value` row of a dynamic filter
#[derive(Debug, Clone)]
pub struct DynamicFilterForm {
    model: ModelMeta,
    form: Form,
}

impl DynamicFilterForm {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::choice(LOOKUP_FIELD, vec![])
                .optional()
                .with_label("Field"),
            FormField::choice(LOOKUP_TYPE, vec![]).optional(),
            FormField::char(VALUE_FIELD).optional(),
        ]
    }

    pub fn new(
        model: &ModelMeta,
        registry: &dyn FilterSetRegistry,
        config: &FormsConfig,
        options: FormOptions,
    ) -> Result<Self> {
        let content_type = model.content_type();
        let filterset = registry
            .filterset_for_model(model)
            .ok_or_else(|| FormError::MissingFilterSet(content_type.clone()))?;

        let data = options.data.clone();
        let prefix = options.prefix.clone();
        let mut form = Form::with_options(Self::fields(), options).bootstrap();

        let mut choices = vec![Choice::new("", "")];
        choices.extend(filterset.iter().filter(|f| !f.has_lookup()).map(|filter| {
            let label = filter
                .label
                .clone()
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| capitalize(&filter.field_name));
            Choice::new(filter.name.as_str(), label)
        }));
        let lookup_field = form.require_field_mut(LOOKUP_FIELD)?;
        lookup_field.set_choices(choices);
        lookup_field
            .widget
            .set_attr("class", format!("{} lookup_field-select", STATIC_SELECT2_CLASS));

        let mut this = Self {
            model: model.clone(),
            form,
        };

        if let (Some(data), Some(prefix)) = (data.filter(|d| !d.is_empty()), prefix) {
            let lookup_type = data.get_list(&format!("{}-{}", prefix, LOOKUP_TYPE));
            let values = data.get_list(&format!("{}-{}", prefix, VALUE_FIELD));
            if let Some(lookup_type) = lookup_type.first() {
                let label = build_lookup_label(lookup_type);
                this.form
                    .require_field_mut(LOOKUP_TYPE)?
                    .set_choices(vec![Choice::new(lookup_type.as_str(), label)]);
                if !values.is_empty() {
                    this.select_or_input_data(registry, lookup_type, values);
                }
            }
        }

        let lookup_type = this.form.require_field_mut(LOOKUP_TYPE)?;
        let widget = &mut lookup_type.widget;
        widget.set_attr(
            "data-query-param-field_name",
            serde_json::to_string(&["$lookup_field"])?,
        );
        widget.set_attr("data-contenttype", content_type.as_str());
        widget.set_attr("data-url", config.lookup_choices_url());
        widget.set_attr("class", format!("{} lookup_type-select", API_SELECT_CLASS));

        let value = this.form.require_field_mut(VALUE_FIELD)?;
        let css = format!("{} value-input form-control", value.widget.class());
        value.widget.set_attr("class", css.trim());

        debug!(model = %content_type, prefix = ?this.form.prefix(), "Built dynamic filter form");
        Ok(this)
    }

    /// Replace the `value` field with a select matching how the filter collects values
    fn select_or_input_data(
        &mut self,
        registry: &dyn FilterSetRegistry,
        lookup_type: &str,
        values: &[String],
    ) {
        let field = match registry.filterset_field_data(&self.model, lookup_type, values) {
            FilterFieldData::StaticChoices {
                choices,
                allow_multiple,
            } => {
                let mut widget = Widget::static_select2();
                if allow_multiple {
                    widget.set_attr("multiple", "true");
                }
                FormField::choice(VALUE_FIELD, choices).with_widget(widget)
            }
            FilterFieldData::DynamicChoices {
                data_url,
                choices,
                content_type,
                value_field,
            } => {
                let mut widget = Widget::api_select_multiple(&data_url);
                if let Some(content_type) = content_type {
                    widget.set_attr("data-query-param-content_types", content_type);
                }
                if let Some(value_field) = value_field {
                    widget.set_attr("value-field", value_field);
                }
                FormField::dynamic_choice(VALUE_FIELD, choices).with_widget(widget)
            }
            FilterFieldData::Others => return,
        };
        self.form
            .add_field(field.optional().with_initial(values.to_vec()));
    }

    pub fn model(&self) -> &ModelMeta {
        &self.model
    }

    /// Selected lookup type, once cleaned
    pub fn lookup_type(&self) -> Option<&str> {
        self.form
            .cleaned_str(LOOKUP_TYPE)
            .filter(|lookup_type| !lookup_type.is_empty())
    }

    /// Cleaned filter values; select widgets may yield several
    pub fn values(&self) -> Vec<String> {
        self.form.cleaned_list(VALUE_FIELD)
    }
}

impl CleanForm for DynamicFilterForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

/// `device_role` -> `Device role`
pub fn capitalize(field: &str) -> String {
    let mut words = field.split('_');
    let first = words.next().unwrap_or("");
    let mut chars = first.chars();
    let first: String = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    std::iter::once(first)
        .chain(words.map(str::to_string))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::traits::{FilterDeclaration, FilterSet, MockFilterSetRegistry};
    use crate::forms::{FormData, WidgetKind};
    use serde_json::json;

    fn device() -> ModelMeta {
        ModelMeta::new("dcim", "device")
    }

    fn device_filters() -> FilterSet {
        FilterSet::new(vec![
            FilterDeclaration::new("name", "name", "exact"),
            FilterDeclaration::new("name__ic", "name", "icontains"),
            FilterDeclaration::new("status", "status", "exact").with_label("Status"),
            FilterDeclaration::new("device_role", "device_role", "exact"),
            FilterDeclaration::new("site", "site", "exact"),
        ])
    }

    fn registry() -> MockFilterSetRegistry {
        let mut registry = MockFilterSetRegistry::new();
        registry
            .expect_filterset_for_model()
            .returning(|_| Some(device_filters()));
        registry
    }

    fn bound(pairs: &[(&str, &str)]) -> FormOptions {
        FormOptions {
            data: Some(FormData::from_pairs(pairs.iter().copied())),
            prefix: Some("form-0".to_string()),
            ..Default::default()
        }
    }

    mod unbound {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_lookup_field_choices() {
            let form = DynamicFilterForm::new(
                &device(),
                &registry(),
                &FormsConfig::default(),
                FormOptions::default(),
            )
            .unwrap();
            let field = form.form().field(LOOKUP_FIELD).unwrap();
            assert_eq!(
                field.choices(),
                &[
                    Choice::new("", ""),
                    Choice::new("name", "Name"),
                    Choice::new("status", "Status"),
                    Choice::new("device_role", "Device role"),
                    Choice::new("site", "Site"),
                ]
            );
            assert_eq!(field.widget.class(), "nautobot-select2-static lookup_field-select");
            assert_eq!(field.display_label(), "Field");
        }

        #[test]
        fn test_blank_label_falls_back_to_field_name() {
            let mut registry = MockFilterSetRegistry::new();
            registry.expect_filterset_for_model().returning(|_| {
                Some(FilterSet::new(vec![
                    FilterDeclaration::new("rack_group", "rack_group", "exact").with_label("")
                ]))
            });
            let form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                FormOptions::default(),
            )
            .unwrap();
            assert_eq!(
                form.form().field(LOOKUP_FIELD).unwrap().choices(),
                &[Choice::new("", ""), Choice::new("rack_group", "Rack group")]
            );
        }

        #[test]
        fn test_lookup_type_attrs() {
            let form = DynamicFilterForm::new(
                &device(),
                &registry(),
                &FormsConfig::default(),
                FormOptions::default(),
            )
            .unwrap();
            let widget = &form.form().field(LOOKUP_TYPE).unwrap().widget;
            assert_eq!(widget.attr("data-query-param-field_name"), Some("[\"$lookup_field\"]"));
            assert_eq!(widget.attr("data-contenttype"), Some("dcim.device"));
            assert_eq!(widget.attr("data-url"), Some("/lookup-choices/"));
            assert_eq!(widget.class(), "nautobot-select2-api lookup_type-select");
            assert!(form.form().field(LOOKUP_TYPE).unwrap().choices().is_empty());
        }

        #[test]
        fn test_configured_lookup_url() {
            let config = FormsConfig {
                lookup_choices_url: Some("/api/lookups/".to_string()),
                ..Default::default()
            };
            let form =
                DynamicFilterForm::new(&device(), &registry(), &config, FormOptions::default())
                    .unwrap();
            assert_eq!(
                form.form().field(LOOKUP_TYPE).unwrap().widget.attr("data-url"),
                Some("/api/lookups/")
            );
        }

        #[test]
        fn test_value_field_is_text_input() {
            let form = DynamicFilterForm::new(
                &device(),
                &registry(),
                &FormsConfig::default(),
                FormOptions::default(),
            )
            .unwrap();
            let value = form.form().field(VALUE_FIELD).unwrap();
            assert_eq!(value.widget.kind, WidgetKind::TextInput);
            assert_eq!(value.widget.class(), "form-control value-input form-control");
        }

        #[test]
        fn test_missing_filterset() {
            let mut registry = MockFilterSetRegistry::new();
            registry.expect_filterset_for_model().returning(|_| None);
            let err = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                FormOptions::default(),
            )
            .unwrap_err();
            assert!(matches!(err, FormError::MissingFilterSet(ct) if ct == "dcim.device"));
        }
    }

    mod bound_data {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_lookup_type_becomes_only_choice() {
            let mut registry = registry();
            registry.expect_filterset_field_data().never();
            let form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                bound(&[("form-0-lookup_field", "name"), ("form-0-lookup_type", "name__ic")]),
            )
            .unwrap();
            assert_eq!(
                form.form().field(LOOKUP_TYPE).unwrap().choices(),
                &[Choice::new("name__ic", "contains (ic)")]
            );
        }

        #[test]
        fn test_static_choices_value() {
            let mut registry = registry();
            registry
                .expect_filterset_field_data()
                .withf(|model, lookup_type, values| {
                    model.content_type() == "dcim.device"
                        && lookup_type == "status"
                        && values == ["active".to_string(), "planned".to_string()]
                })
                .times(1)
                .returning(|_, _, _| FilterFieldData::StaticChoices {
                    choices: vec![
                        Choice::new("active", "Active"),
                        Choice::new("planned", "Planned"),
                    ],
                    allow_multiple: true,
                });

            let mut form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                bound(&[
                    ("form-0-lookup_field", "status"),
                    ("form-0-lookup_type", "status"),
                    ("form-0-value", "active"),
                    ("form-0-value", "planned"),
                ]),
            )
            .unwrap();

            let value = form.form().field(VALUE_FIELD).unwrap();
            assert_eq!(value.widget.kind, WidgetKind::StaticSelect2);
            assert_eq!(value.widget.attr("multiple"), Some("true"));
            assert_eq!(value.widget.class(), "nautobot-select2-static value-input form-control");
            assert_eq!(value.initial, Some(json!(["active", "planned"])));
            assert!(!value.required);

            assert!(form.is_valid());
            assert_eq!(form.lookup_type(), Some("status"));
            assert_eq!(form.values(), vec!["active", "planned"]);
        }

        #[test]
        fn test_static_single_choice_rejects_unknown_value() {
            let mut registry = registry();
            registry
                .expect_filterset_field_data()
                .returning(|_, _, _| FilterFieldData::StaticChoices {
                    choices: vec![Choice::new("true", "Yes"), Choice::new("false", "No")],
                    allow_multiple: false,
                });
            let mut form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                bound(&[
                    ("form-0-lookup_field", "site"),
                    ("form-0-lookup_type", "site"),
                    ("form-0-value", "maybe"),
                ]),
            )
            .unwrap();
            assert!(form.form().field(VALUE_FIELD).unwrap().widget.attr("multiple").is_none());
            assert!(!form.is_valid());
            assert!(form.errors().contains(VALUE_FIELD));
        }

        #[test]
        fn test_dynamic_choices_value() {
            let mut registry = registry();
            registry
                .expect_filterset_field_data()
                .returning(|_, _, values| FilterFieldData::DynamicChoices {
                    data_url: "/api/extras/statuses/".to_string(),
                    choices: values.iter().map(|v| Choice::new(v.as_str(), v.as_str())).collect(),
                    content_type: Some("dcim.device".to_string()),
                    value_field: Some("slug".to_string()),
                });
            let mut form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                bound(&[
                    ("form-0-lookup_field", "status"),
                    ("form-0-lookup_type", "status__n"),
                    ("form-0-value", "retired"),
                ]),
            )
            .unwrap();

            let widget = &form.form().field(VALUE_FIELD).unwrap().widget;
            assert_eq!(widget.kind, WidgetKind::ApiSelectMultiple);
            assert_eq!(widget.attr("data-url"), Some("/api/extras/statuses/"));
            assert_eq!(widget.attr("data-query-param-content_types"), Some("dcim.device"));
            assert_eq!(widget.attr("value-field"), Some("slug"));
            assert_eq!(widget.class(), "nautobot-select2-api value-input form-control");

            assert!(form.is_valid());
            assert_eq!(form.lookup_type(), Some("status__n"));
            assert_eq!(form.values(), vec!["retired"]);
        }

        #[test]
        fn test_other_field_data_keeps_text_input() {
            let mut registry = registry();
            registry
                .expect_filterset_field_data()
                .returning(|_, _, _| FilterFieldData::Others);
            let mut form = DynamicFilterForm::new(
                &device(),
                &registry,
                &FormsConfig::default(),
                bound(&[
                    ("form-0-lookup_field", "name"),
                    ("form-0-lookup_type", "name__ic"),
                    ("form-0-value", "core"),
                ]),
            )
            .unwrap();
            assert_eq!(
                form.form().field(VALUE_FIELD).unwrap().widget.kind,
                WidgetKind::TextInput
            );
            assert!(form.is_valid());
            assert_eq!(form.values(), vec!["core"]);
        }

        #[test]
        fn test_data_without_prefix_is_not_inspected() {
            let mut registry = registry();
            registry.expect_filterset_field_data().never();
            let options = FormOptions {
                data: Some(FormData::from_pairs([("lookup_type", "name__ic"), ("value", "x")])),
                ..Default::default()
            };
            let form =
                DynamicFilterForm::new(&device(), &registry, &FormsConfig::default(), options)
                    .unwrap();
            assert!(form.form().field(LOOKUP_TYPE).unwrap().choices().is_empty());
        }
    }

    mod helpers {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_capitalize() {
            assert_eq!(capitalize("name"), "Name");
            assert_eq!(capitalize("device_role"), "Device role");
            assert_eq!(capitalize("rack_group_id"), "Rack group id");
            assert_eq!(capitalize(""), "");
        }
    }
}
