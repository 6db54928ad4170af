//! Single-object JSON/YAML import

use super::data::FormData;
use super::field::{Choice, FormField};
use super::form::{CleanForm, Form};
use super::widget::{Widget, WidgetKind};
use crate::error::ValidationErrors;
use serde_json::Value;
use tracing::{debug, warn};

pub const DATA_FIELD: &str = "data";
pub const FORMAT_FIELD: &str = "format";

const SINGLE_OBJECT_MESSAGE: &str = "Import is limited to one object at a time.";

/// Serialization format of an import payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Yaml,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportFormat::Json => "json",
            ImportFormat::Yaml => "yaml",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(ImportFormat::Json),
            "yaml" => Some(ImportFormat::Yaml),
            _ => None,
        }
    }
}

/// Creates one object from JSON or YAML data
#[derive(Debug, Clone)]
pub struct ImportForm {
    form: Form,
}

impl ImportForm {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::char(DATA_FIELD)
                .with_widget(Widget::new(WidgetKind::Textarea))
                .with_label("")
                .with_help_text(
                    "Enter object data in JSON or YAML format. \
                     Note: Only a single object/document is supported.",
                ),
            FormField::choice(
                FORMAT_FIELD,
                vec![Choice::new("json", "JSON"), Choice::new("yaml", "YAML")],
            )
            .with_initial(ImportFormat::Yaml.as_str()),
        ]
    }

    pub fn new() -> Self {
        Self {
            form: Form::new(Self::fields()).bootstrap(),
        }
    }

    pub fn with_data(data: FormData) -> Self {
        Self {
            form: Form::new(Self::fields()).with_data(data).bootstrap(),
        }
    }

    /// Convenience constructor from the raw payload and its format
    pub fn from_payload(payload: &str, format: ImportFormat) -> Self {
        Self::with_data(FormData::from_pairs([
            (DATA_FIELD, payload),
            (FORMAT_FIELD, format.as_str()),
        ]))
    }

    /// The parsed document, once the form is valid
    pub fn object(&self) -> Option<&Value> {
        self.form.cleaned_value(DATA_FIELD)
    }
}

impl Default for ImportForm {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_json(data: &str) -> Result<Value, ValidationErrors> {
    let value: Value = serde_json::from_str(data).map_err(|err| {
        ValidationErrors::field(DATA_FIELD, format!("Invalid JSON data: {}", err))
    })?;
    if !value.is_object() {
        return Err(ValidationErrors::field(DATA_FIELD, SINGLE_OBJECT_MESSAGE));
    }
    Ok(value)
}

fn parse_yaml(data: &str) -> Result<Value, ValidationErrors> {
    if data.contains("\n---") {
        return Err(ValidationErrors::field(DATA_FIELD, SINGLE_OBJECT_MESSAGE));
    }
    let invalid = |err: &dyn std::fmt::Display| {
        ValidationErrors::field(DATA_FIELD, format!("Invalid YAML data: {}", err))
    };
    let mut value: serde_yaml::Value = serde_yaml::from_str(data).map_err(|err| invalid(&err))?;
    // `<<` merge keys are resolved before conversion
    value.apply_merge().map_err(|err| invalid(&err))?;
    serde_json::to_value(value).map_err(|err| invalid(&err))
}

impl CleanForm for ImportForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    fn clean(&mut self) -> Result<(), ValidationErrors> {
        let (Some(data), Some(format)) = (
            self.form.cleaned_str(DATA_FIELD),
            self.form.cleaned_str(FORMAT_FIELD).and_then(ImportFormat::parse),
        ) else {
            return Ok(());
        };

        let parsed = match format {
            ImportFormat::Json => parse_json(data),
            ImportFormat::Yaml => parse_yaml(data),
        };
        match parsed {
            Ok(value) => {
                debug!(format = format.as_str(), "Parsed import data");
                self.form.set_cleaned_value(DATA_FIELD, value);
                Ok(())
            }
            Err(errors) => {
                warn!(format = format.as_str(), %errors, "Rejected import data");
                Err(errors)
            }
        }
    }
}
