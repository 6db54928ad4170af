//! Form field value objects

use super::ipnetwork::IpNetwork;
use super::widget::{Widget, WidgetKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// A selectable value and its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

impl<V: Into<String>, L: Into<String>> From<(V, L)> for Choice {
    fn from((value, label): (V, L)) -> Self {
        Self::new(value, label)
    }
}

/// Type-safe field kinds, each with its own cleaning rule
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Char,
    Boolean,
    /// Tri-state boolean; unknown input cleans to null
    NullBoolean,
    Choice(Vec<Choice>),
    MultipleChoice(Vec<Choice>),
    /// Choices are served by an API; the listed ones are pre-rendered selections
    DynamicChoice(Vec<Choice>),
    /// Free list of values, such as selected primary keys
    MultipleValues,
    IpNetwork,
}

/// Submitted value for a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    Single(Option<String>),
    Many(Vec<String>),
}

/// Represents a single form field with its configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: Option<String>,
    pub help_text: Option<String>,
    pub required: bool,
    pub initial: Option<Value>,
    pub kind: FieldKind,
    pub widget: Widget,
    /// Related-object attribute used to resolve CSV values
    pub to_field_name: Option<String>,
}

impl FormField {
    fn with_kind(name: &str, kind: FieldKind, widget: WidgetKind) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            help_text: None,
            required: true,
            initial: None,
            kind,
            widget: Widget::new(widget),
            to_field_name: None,
        }
    }

    /// Create a new text field
    pub fn char(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Char, WidgetKind::TextInput)
    }

    /// Create a new checkbox field
    pub fn boolean(name: &str) -> Self {
        Self::with_kind(name, FieldKind::Boolean, WidgetKind::CheckboxInput)
    }

    /// Create a new yes/no/unknown field
    pub fn null_boolean(name: &str) -> Self {
        Self::with_kind(name, FieldKind::NullBoolean, WidgetKind::Select)
    }

    pub fn choice(name: &str, choices: Vec<Choice>) -> Self {
        Self::with_kind(name, FieldKind::Choice(choices), WidgetKind::Select)
    }

    pub fn multiple_choice(name: &str, choices: Vec<Choice>) -> Self {
        Self::with_kind(
            name,
            FieldKind::MultipleChoice(choices),
            WidgetKind::SelectMultiple,
        )
    }

    pub fn dynamic_choice(name: &str, choices: Vec<Choice>) -> Self {
        Self::with_kind(
            name,
            FieldKind::DynamicChoice(choices),
            WidgetKind::ApiSelectMultiple,
        )
    }

    pub fn multiple_values(name: &str) -> Self {
        Self::with_kind(
            name,
            FieldKind::MultipleValues,
            WidgetKind::MultipleHiddenInput,
        )
    }

    /// Create a new `address/prefix-length` field
    pub fn ip_network(name: &str) -> Self {
        Self::with_kind(name, FieldKind::IpNetwork, WidgetKind::TextInput)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_help_text(mut self, help_text: &str) -> Self {
        self.help_text = Some(help_text.to_string());
        self
    }

    pub fn with_initial(mut self, initial: impl Into<Value>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widget = widget;
        self
    }

    pub fn with_widget_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.widget.set_attr(name, value);
        self
    }

    /// Label shown to users; falls back to the prettified field name
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => pretty_name(&self.name),
        }
    }

    /// Choices offered by the field, empty for free-form kinds
    pub fn choices(&self) -> &[Choice] {
        match &self.kind {
            FieldKind::Choice(choices)
            | FieldKind::MultipleChoice(choices)
            | FieldKind::DynamicChoice(choices) => choices,
            _ => &[],
        }
    }

    /// Replace the field's choices; no-op for free-form kinds
    pub fn set_choices(&mut self, new_choices: Vec<Choice>) {
        match &mut self.kind {
            FieldKind::Choice(choices)
            | FieldKind::MultipleChoice(choices)
            | FieldKind::DynamicChoice(choices) => *choices = new_choices,
            _ => {}
        }
    }

    /// Whether the field reads a list of submitted values
    pub fn is_multi_valued(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::MultipleChoice(_) | FieldKind::DynamicChoice(_) | FieldKind::MultipleValues
        ) || self.widget.is_multiple()
    }

    /// Read this field's submitted value from `data` under `key`
    pub fn value_from_data(&self, data: &super::FormData, key: &str) -> RawValue {
        if self.is_multi_valued() {
            RawValue::Many(data.get_list(key).to_vec())
        } else {
            RawValue::Single(data.get(key).map(str::to_string))
        }
    }

    /// Whether the submitted value differs from `initial`
    pub fn has_changed(&self, initial: Option<&Value>, raw: &RawValue) -> bool {
        match (&self.kind, raw) {
            (FieldKind::Boolean, RawValue::Single(value)) => {
                let initial = initial.map(value_truthy).unwrap_or(false);
                initial != bool_from_str(value.as_deref())
            }
            (_, RawValue::Many(values)) => {
                let mut submitted: Vec<&str> = values.iter().map(String::as_str).collect();
                let initial = initial.map(value_strings).unwrap_or_default();
                let mut initial: Vec<&str> = initial.iter().map(String::as_str).collect();
                submitted.sort_unstable();
                initial.sort_unstable();
                submitted != initial
            }
            (_, RawValue::Single(value)) => {
                let initial = initial.map(value_string).unwrap_or_default();
                value.as_deref().unwrap_or("").trim() != initial
            }
        }
    }

    /// Validate and coerce a submitted value
    pub fn clean(&self, raw: &RawValue) -> Result<Value, String> {
        match &self.kind {
            FieldKind::Char => {
                let value = single(raw).trim().to_string();
                if value.is_empty() && self.required {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                Ok(Value::String(value))
            }
            FieldKind::Boolean => {
                let value = match raw {
                    RawValue::Single(value) => bool_from_str(value.as_deref()),
                    RawValue::Many(values) => bool_from_str(values.last().map(String::as_str)),
                };
                if !value && self.required {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                Ok(Value::Bool(value))
            }
            FieldKind::NullBoolean => {
                let value = match single(raw).trim() {
                    "True" | "true" | "1" => Value::Bool(true),
                    "False" | "false" | "0" => Value::Bool(false),
                    _ => Value::Null,
                };
                if value.is_null() && self.required {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                Ok(value)
            }
            FieldKind::Choice(choices) if !self.is_multi_valued() => {
                let value = single(raw).trim().to_string();
                if value.is_empty() {
                    if self.required {
                        return Err(REQUIRED_MESSAGE.to_string());
                    }
                    return Ok(Value::String(value));
                }
                if !choices.iter().any(|choice| choice.value == value) {
                    return Err(invalid_choice(&value));
                }
                Ok(Value::String(value))
            }
            FieldKind::Choice(choices) | FieldKind::MultipleChoice(choices) => {
                let values = non_empty(raw);
                if values.is_empty() && self.required {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                if let Some(invalid) = values
                    .iter()
                    .find(|value| !choices.iter().any(|choice| &choice.value == *value))
                {
                    return Err(invalid_choice(invalid));
                }
                Ok(Value::from(values))
            }
            FieldKind::DynamicChoice(_) | FieldKind::MultipleValues => {
                let values = non_empty(raw);
                if values.is_empty() && self.required {
                    return Err(REQUIRED_MESSAGE.to_string());
                }
                Ok(Value::from(values))
            }
            FieldKind::IpNetwork => {
                let value = single(raw).trim();
                if value.is_empty() {
                    if self.required {
                        return Err(REQUIRED_MESSAGE.to_string());
                    }
                    return Ok(Value::Null);
                }
                let network: IpNetwork = value.parse().map_err(|err| format!("{}", err))?;
                Ok(Value::String(network.to_string()))
            }
        }
    }
}

/// `use_regex` -> `Use regex`
pub fn pretty_name(name: &str) -> String {
    let name = name.replace('_', " ");
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn invalid_choice(value: &str) -> String {
    format!(
        "Select a valid choice. {} is not one of the available choices.",
        value
    )
}

fn single(raw: &RawValue) -> &str {
    match raw {
        RawValue::Single(value) => value.as_deref().unwrap_or(""),
        RawValue::Many(values) => values.last().map(String::as_str).unwrap_or(""),
    }
}

fn non_empty(raw: &RawValue) -> Vec<String> {
    let values: Vec<String> = match raw {
        RawValue::Single(value) => value.iter().cloned().collect(),
        RawValue::Many(values) => values.clone(),
    };
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

/// Checkbox semantics: absent, empty, `false` and `0` are unchecked
pub fn bool_from_str(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(value) => {
            let value = value.trim();
            !(value.is_empty() || value.eq_ignore_ascii_case("false") || value == "0")
        }
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => bool_from_str(Some(s)),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// String form of an initial value as it would be rendered into an input
pub fn value_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(values) => values.iter().map(value_string).collect(),
        Value::Null => Vec::new(),
        other => vec![value_string(other)],
    }
}
