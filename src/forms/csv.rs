//! CSV import: header parsing and per-record model forms

use super::data::FormData;
use super::field::{FieldKind, FormField};
use super::form::{CleanForm, Form};
use crate::error::{Result, ValidationErrors};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeMap;
use tracing::debug;

pub const CSV_FIELD: &str = "csv";

/// Column headers in file order; `field.to_field` headers carry a lookup target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvHeaders {
    columns: Vec<(String, Option<String>)>,
}

impl CsvHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; returns `false` when the field is already present
    pub fn insert(&mut self, field: &str, to_field: Option<&str>) -> bool {
        if self.contains(field) {
            return false;
        }
        self.columns
            .push((field.to_string(), to_field.map(str::to_string)));
        true
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == field)
    }

    pub fn to_field(&self, field: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, to_field)| to_field.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(field, to_field)| (field.as_str(), to_field.as_deref()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(field, _)| field.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Parsed CSV import data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvData {
    pub headers: CsvHeaders,
    pub records: Vec<BTreeMap<String, String>>,
}

impl CsvData {
    /// Parse CSV text whose first row names the columns
    pub fn parse(text: &str) -> std::result::Result<Self, ValidationErrors> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());
        let mut rows = reader.records();

        let header_row = match rows.next() {
            Some(Ok(row)) => row,
            Some(Err(err)) => {
                return Err(ValidationErrors::field(
                    CSV_FIELD,
                    format!("Failed to read CSV headers: {}", err),
                ))
            }
            None => return Err(ValidationErrors::field(CSV_FIELD, "No CSV data provided.")),
        };

        let mut headers = CsvHeaders::new();
        for header in header_row.iter() {
            let (field, to_field) = match header.split_once('.') {
                Some((field, to_field)) => (field.trim(), Some(to_field.trim())),
                None => (header.trim(), None),
            };
            if !headers.insert(field, to_field) {
                return Err(ValidationErrors::field(
                    CSV_FIELD,
                    format!("Duplicate or conflicting column header for \"{}\"", header),
                ));
            }
        }

        let mut records = Vec::new();
        for (index, row) in rows.enumerate() {
            let row_number = index + 1;
            let row = row.map_err(|err| {
                ValidationErrors::field(
                    CSV_FIELD,
                    format!("Failed to parse CSV row {}: {}", row_number, err),
                )
            })?;
            if row.len() != headers.len() {
                return Err(ValidationErrors::field(
                    CSV_FIELD,
                    format!(
                        "Row {}: Expected {} columns but found {}",
                        row_number,
                        headers.len(),
                        row.len()
                    ),
                ));
            }
            let record = headers
                .field_names()
                .zip(row.iter())
                .map(|(field, value)| (field.to_string(), value.to_string()))
                .collect();
            records.push(record);
        }

        debug!(columns = headers.len(), records = records.len(), "Parsed CSV data");
        Ok(Self { headers, records })
    }

    /// Check the headers against the fields of the target form
    pub fn validate_headers(
        &self,
        fields: &[FormField],
    ) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for field in fields.iter().filter(|f| f.required) {
            if !self.headers.contains(&field.name) {
                errors.add(
                    CSV_FIELD,
                    format!("Required column header \"{}\" not found.", field.name),
                );
            }
        }
        for (header, to_field) in self.headers.iter() {
            match fields.iter().find(|f| f.name == header) {
                None => errors.add(
                    CSV_FIELD,
                    format!("Unexpected column header \"{}\" found.", header),
                ),
                Some(field) if to_field.is_some() && !is_related_object(field) => {
                    errors.add(
                        CSV_FIELD,
                        format!(
                            "Column \"{}\" is not a related object; \
                             a lookup field cannot be specified.",
                            header
                        ),
                    )
                }
                Some(_) => {}
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// One bound form per record, built from `template`
    pub fn forms<F>(&self, template: F) -> Result<Vec<CsvModelForm>>
    where
        F: Fn() -> Form,
    {
        self.records
            .iter()
            .map(|record| {
                let data =
                    FormData::from_pairs(record.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                CsvModelForm::new(template().with_data(data), Some(&self.headers))
            })
            .collect()
    }
}

/// Only related-object fields can be resolved through a `field.to_field` header
fn is_related_object(field: &FormField) -> bool {
    matches!(field.kind, FieldKind::DynamicChoice(_))
}

/// Model form used to import one CSV record
#[derive(Debug, Clone)]
pub struct CsvModelForm {
    form: Form,
}

impl CsvModelForm {
    /// Point each header's field at its `to_field` lookup column
    pub fn new(mut form: Form, headers: Option<&CsvHeaders>) -> Result<Self> {
        if let Some(headers) = headers {
            for (field, to_field) in headers.iter() {
                if let Some(to_field) = to_field {
                    form.require_field_mut(field)?.to_field_name = Some(to_field.to_string());
                }
            }
        }
        Ok(Self { form })
    }
}

impl CleanForm for CsvModelForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}
