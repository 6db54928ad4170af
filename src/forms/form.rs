//! Form state and the validation lifecycle

use super::data::FormData;
use super::field::{FormField, RawValue};
use crate::error::{FormError, Result, ValidationErrors, NON_FIELD_ERRORS};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Construction options shared by every form
#[derive(Debug, Clone)]
pub struct FormOptions {
    pub data: Option<FormData>,
    pub initial: Map<String, Value>,
    pub prefix: Option<String>,
    /// Render the HTML `required` attribute on required fields
    pub use_required_attribute: bool,
    /// Accept the form without validation when nothing changed
    pub empty_permitted: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            data: None,
            initial: Map::new(),
            prefix: None,
            use_required_attribute: true,
            empty_permitted: false,
        }
    }
}

impl FormOptions {
    pub fn bound(data: FormData) -> Self {
        Self {
            data: Some(data),
            ..Default::default()
        }
    }
}

/// A request-scoped collection of named fields
#[derive(Debug, Clone)]
pub struct Form {
    fields: Vec<FormField>,
    data: Option<FormData>,
    initial: Map<String, Value>,
    prefix: Option<String>,
    pub use_required_attribute: bool,
    pub empty_permitted: bool,
    errors: ValidationErrors,
    cleaned_data: Map<String, Value>,
}

impl Form {
    pub fn new(fields: Vec<FormField>) -> Self {
        Self::with_options(fields, FormOptions::default())
    }

    pub fn with_options(fields: Vec<FormField>, options: FormOptions) -> Self {
        Self {
            fields,
            data: options.data,
            initial: options.initial,
            prefix: options.prefix,
            use_required_attribute: options.use_required_attribute,
            empty_permitted: options.empty_permitted,
            errors: ValidationErrors::new(),
            cleaned_data: Map::new(),
        }
    }

    pub fn with_data(mut self, data: FormData) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_initial(mut self, initial: Map<String, Value>) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&FormData> {
        self.data.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn initial(&self) -> &Map<String, Value> {
        &self.initial
    }

    pub fn set_initial(&mut self, initial: Map<String, Value>) {
        self.initial = initial;
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [FormField] {
        &mut self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut FormField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    /// Like [`Form::field_mut`], but a missing field is an error
    pub fn require_field_mut(&mut self, name: &str) -> Result<&mut FormField> {
        self.field_mut(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    /// Add a field, replacing one of the same name in place
    pub fn add_field(&mut self, field: FormField) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    /// HTML name of a field, including the form prefix
    pub fn add_prefix(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}-{}", prefix, name),
            None => name.to_string(),
        }
    }

    /// Initial value for a field: form-level initial data wins over the field default
    pub fn initial_for(&self, name: &str) -> Option<&Value> {
        self.initial
            .get(name)
            .or_else(|| self.field(name).and_then(|field| field.initial.as_ref()))
    }

    fn raw_value(&self, field: &FormField) -> RawValue {
        match &self.data {
            Some(data) => field.value_from_data(data, &self.add_prefix(&field.name)),
            None => RawValue::Single(None),
        }
    }

    /// Names of fields whose submitted value differs from their initial value
    pub fn changed_data(&self) -> Vec<String> {
        if !self.is_bound() {
            return Vec::new();
        }
        self.fields
            .iter()
            .filter(|field| {
                field.has_changed(self.initial_for(&field.name), &self.raw_value(field))
            })
            .map(|field| field.name.clone())
            .collect()
    }

    pub fn has_changed(&self) -> bool {
        !self.changed_data().is_empty()
    }

    /// Clean every field, collecting errors and cleaned values.
    ///
    /// Returns `false` when cleaning was skipped: the form is unbound, or it is
    /// `empty_permitted` and nothing changed. Form-level hooks only run after a
    /// `true` return.
    pub fn clean_fields(&mut self) -> bool {
        self.errors.clear();
        self.cleaned_data.clear();

        if !self.is_bound() {
            return false;
        }
        if self.empty_permitted && !self.has_changed() {
            debug!(prefix = ?self.prefix, "Skipping validation of unchanged form");
            return false;
        }

        let mut errors = ValidationErrors::new();
        let mut cleaned = Map::new();
        for field in &self.fields {
            match field.clean(&self.raw_value(field)) {
                Ok(value) => {
                    cleaned.insert(field.name.clone(), value);
                }
                Err(message) => errors.add(&field.name, message),
            }
        }
        self.errors = errors;
        self.cleaned_data = cleaned;
        true
    }

    /// Record a validation error; the field's cleaned value is discarded
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.merge_errors(ValidationErrors::field(field, message));
    }

    pub fn merge_errors(&mut self, errors: ValidationErrors) {
        for field in errors.fields() {
            if field != NON_FIELD_ERRORS {
                self.cleaned_data.remove(field);
            }
        }
        self.errors.merge(errors);
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn cleaned_data(&self) -> &Map<String, Value> {
        &self.cleaned_data
    }

    pub fn cleaned_value(&self, name: &str) -> Option<&Value> {
        self.cleaned_data.get(name)
    }

    pub fn cleaned_str(&self, name: &str) -> Option<&str> {
        self.cleaned_value(name).and_then(Value::as_str)
    }

    pub fn cleaned_bool(&self, name: &str) -> bool {
        self.cleaned_value(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Cleaned values of a list field, empty when absent
    pub fn cleaned_list(&self, name: &str) -> Vec<String> {
        match self.cleaned_value(name) {
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(value)) if !value.is_empty() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    pub fn set_cleaned_value(&mut self, name: &str, value: Value) {
        self.cleaned_data.insert(name.to_string(), value);
    }

    /// Validate a form that has no form-level hook
    pub fn is_valid(&mut self) -> bool {
        self.clean_fields();
        self.is_bound() && self.errors.is_empty()
    }

    /// Attributes a field renders with; `required` is dropped when the form
    /// does not use the required attribute
    pub fn widget_attrs(&self, name: &str) -> BTreeMap<String, String> {
        let mut attrs = self
            .field(name)
            .map(|field| field.widget.attrs.clone())
            .unwrap_or_default();
        if !self.use_required_attribute {
            attrs.remove("required");
        }
        attrs
    }
}

/// Forms with a form-level `clean` hook
pub trait CleanForm {
    fn form(&self) -> &Form;
    fn form_mut(&mut self) -> &mut Form;

    /// Cross-field validation, run after every field has been cleaned
    fn clean(&mut self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }

    fn is_valid(&mut self) -> bool {
        if self.form_mut().clean_fields() {
            if let Err(errors) = self.clean() {
                debug!(%errors, "Form-level validation failed");
                self.form_mut().merge_errors(errors);
            }
        }
        self.form().is_bound() && self.form().errors().is_empty()
    }

    fn errors(&self) -> &ValidationErrors {
        self.form().errors()
    }

    fn cleaned_data(&self) -> &Map<String, Value> {
        self.form().cleaned_data()
    }
}

impl CleanForm for Form {
    fn form(&self) -> &Form {
        self
    }

    fn form_mut(&mut self) -> &mut Form {
        self
    }
}
