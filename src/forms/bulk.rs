//! Forms applied across multiple selected records

use super::data::FormData;
use super::field::{Choice, FormField};
use super::form::{CleanForm, Form};
use crate::error::{FormError, Result, ValidationErrors};
use crate::model::ModelMeta;
use fancy_regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub const PK_FIELD: &str = "pk";
pub const NULLIFY_FIELD: &str = "_nullify";

/// Declares the editable fields of a bulk edit form
pub trait BulkEditMeta {
    fn fields() -> Vec<FormField>;

    /// Fields that may be cleared through `_nullify`
    fn nullable_fields() -> Vec<String> {
        Vec::new()
    }
}

/// Base form for editing multiple objects in bulk
#[derive(Debug, Clone)]
pub struct BulkEditForm {
    pub model: ModelMeta,
    pub nullable_fields: Vec<String>,
    form: Form,
}

impl BulkEditForm {
    pub fn new<M: BulkEditMeta>(model: ModelMeta, data: Option<FormData>) -> Self {
        Self::from_parts(model, M::fields(), M::nullable_fields(), data)
    }

    pub fn from_parts(
        model: ModelMeta,
        fields: Vec<FormField>,
        nullable_fields: Vec<String>,
        data: Option<FormData>,
    ) -> Self {
        let mut all_fields = vec![FormField::multiple_values(PK_FIELD)];
        all_fields.extend(fields);
        all_fields.push(
            FormField::multiple_choice(
                NULLIFY_FIELD,
                nullable_fields
                    .iter()
                    .map(|name| Choice::new(name.as_str(), name.as_str()))
                    .collect(),
            )
            .optional(),
        );
        let mut form = Form::new(all_fields);
        if let Some(data) = data {
            form = form.with_data(data);
        }
        debug!(model = %model.content_type(), "Built bulk edit form");
        Self {
            model,
            nullable_fields,
            form,
        }
    }

    /// Primary keys of the selected objects
    pub fn pk_list(&self) -> Vec<String> {
        self.form.cleaned_list(PK_FIELD)
    }

    /// Per-field updates: `Some` sets a value, `None` clears a nullable field
    pub fn changes(&self) -> Result<BTreeMap<String, Option<Value>>> {
        if !self.form.is_bound() {
            return Err(FormError::Unbound);
        }
        if !self.form.errors().is_empty() {
            return Err(FormError::Invalid(self.form.errors().clone()));
        }
        let nullified = self.form.cleaned_list(NULLIFY_FIELD);
        let mut changes = BTreeMap::new();
        for field in self.form.fields() {
            if field.name == PK_FIELD || field.name == NULLIFY_FIELD {
                continue;
            }
            if self.nullable_fields.contains(&field.name) && nullified.contains(&field.name) {
                changes.insert(field.name.clone(), None);
                continue;
            }
            match self.form.cleaned_value(&field.name) {
                None | Some(Value::Null) => {}
                Some(Value::String(s)) if s.is_empty() => {}
                Some(Value::Array(a)) if a.is_empty() => {}
                Some(value) => {
                    changes.insert(field.name.clone(), Some(value.clone()));
                }
            }
        }
        Ok(changes)
    }
}

impl CleanForm for BulkEditForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

/// Find/replace form used to rename objects in bulk
#[derive(Debug, Clone)]
pub struct BulkRenameForm {
    form: Form,
    pattern: Option<Regex>,
}

impl BulkRenameForm {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::char("find"),
            FormField::char("replace"),
            FormField::boolean("use_regex")
                .optional()
                .with_initial(true)
                .with_label("Use regular expressions"),
        ]
    }

    pub fn new() -> Self {
        Self {
            form: Form::new(Self::fields()),
            pattern: None,
        }
    }

    pub fn with_data(data: FormData) -> Self {
        Self {
            form: Form::new(Self::fields()).with_data(data),
            pattern: None,
        }
    }

    /// Apply the validated find/replace to one object name
    pub fn rename(&self, name: &str) -> Result<String> {
        if !self.form.is_bound() {
            return Err(FormError::Unbound);
        }
        let (Some(find), Some(replace)) = (
            self.form.cleaned_str("find"),
            self.form.cleaned_str("replace"),
        ) else {
            return Err(FormError::Invalid(self.form.errors().clone()));
        };
        if !self.form.errors().is_empty() {
            return Err(FormError::Invalid(self.form.errors().clone()));
        }
        match &self.pattern {
            Some(pattern) => pattern
                .try_replacen(name, 0, expand_group_references(replace).as_str())
                .map(|renamed| renamed.into_owned())
                .map_err(|err| {
                    debug!(error = %err, name, "Rename pattern failed to match");
                    FormError::Invalid(ValidationErrors::field("find", err.to_string()))
                }),
            None => Ok(name.replace(find, replace)),
        }
    }

    /// Old and new name for every object
    pub fn preview<'a, I>(&self, names: I) -> Result<Vec<(String, String)>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| Ok((name.to_string(), self.rename(name)?)))
            .collect()
    }
}

impl Default for BulkRenameForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanForm for BulkRenameForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    fn clean(&mut self) -> std::result::Result<(), ValidationErrors> {
        self.pattern = None;
        if !self.form.cleaned_bool("use_regex") {
            return Ok(());
        }
        let Some(find) = self.form.cleaned_str("find") else {
            return Ok(());
        };
        match Regex::new(find) {
            Ok(pattern) => {
                self.pattern = Some(pattern);
                Ok(())
            }
            Err(err) => {
                debug!(error = %err, "Rejected rename pattern");
                Err(ValidationErrors::field("find", "Invalid regular expression"))
            }
        }
    }
}

/// Translate `\1` and `\g<name>` group references into the `${1}` / `${name}`
/// syntax; a literal `$` is escaped.
fn expand_group_references(replace: &str) -> String {
    let mut out = String::with_capacity(replace.len());
    let mut chars = replace.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '$' => out.push_str("$$"),
            '\\' => match chars.peek().copied() {
                Some(d) if d.is_ascii_digit() => {
                    let mut group = String::new();
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                    out.push_str(&format!("${{{}}}", group));
                }
                Some('g') => {
                    let rest: String = chars.clone().collect();
                    match rest.strip_prefix("g<").and_then(|r| r.split_once('>')) {
                        Some((group, _)) => {
                            out.push_str(&format!("${{{}}}", group));
                            // skip `g<name>`
                            for _ in 0..group.chars().count() + 3 {
                                chars.next();
                            }
                        }
                        None => out.push('\\'),
                    }
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                Some('n') => {
                    out.push('\n');
                    chars.next();
                }
                Some('t') => {
                    out.push('\t');
                    chars.next();
                }
                _ => out.push('\\'),
            },
            other => out.push(other),
        }
    }
    out
}
