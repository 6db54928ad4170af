//! Error types for form construction and validation.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Key under which errors that do not belong to a single field are stored.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Result type alias using the crate error type.
pub type Result<T> = std::result::Result<T, FormError>;

/// Field-scoped validation messages collected while cleaning a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an error set holding a single message for `field`.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Build an error set holding a single non-field message.
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages recorded for `field`, empty when there are none.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Main error type for form handling.
#[derive(Error, Debug)]
pub enum FormError {
    /// A form field was referenced that the form does not declare
    #[error("Unknown form field: {0}")]
    UnknownField(String),

    /// No filter-set is registered for the model
    #[error("No filter-set registered for model {0}")]
    MissingFilterSet(String),

    /// The form was used as if it had submitted data
    #[error("Form is not bound to any data")]
    Unbound,

    /// The form was used before passing validation
    #[error("Form is not valid: {0}")]
    Invalid(ValidationErrors),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_error_is_recorded() {
        let errors = ValidationErrors::field("find", "Invalid regular expression");
        assert!(errors.contains("find"));
        assert_eq!(errors.get("find"), ["Invalid regular expression".to_string()]);
        assert!(errors.get("replace").is_empty());
    }

    #[test]
    fn test_merge_appends_messages() {
        let mut errors = ValidationErrors::field("data", "first");
        errors.merge(ValidationErrors::field("data", "second"));
        errors.merge(ValidationErrors::non_field("global"));
        assert_eq!(errors.get("data").len(), 2);
        assert_eq!(errors.get(NON_FIELD_ERRORS), ["global".to_string()]);
    }

    #[test]
    fn test_display_joins_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("find", "Invalid regular expression");
        errors.add("replace", "This field is required.");
        assert_eq!(
            errors.to_string(),
            "find: Invalid regular expression; replace: This field is required."
        );
    }

    #[test]
    fn test_serializes_as_map() {
        let errors = ValidationErrors::field("data", "Import is limited to one object at a time.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"data": ["Import is limited to one object at a time."]})
        );
    }
}
