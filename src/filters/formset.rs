//! Formset of dynamic filter rows and its management form

use super::dynamic_form::DynamicFilterForm;
use super::traits::FilterSetRegistry;
use crate::config::FormsConfig;
use crate::error::{Result, ValidationErrors, NON_FIELD_ERRORS};
use crate::forms::{CleanForm, FormData, FormField, FormOptions};
use crate::model::ModelMeta;
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const DEFAULT_PREFIX: &str = "form";
pub const TOTAL_FORM_COUNT: &str = "TOTAL_FORMS";
pub const INITIAL_FORM_COUNT: &str = "INITIAL_FORMS";
pub const MIN_NUM_FORM_COUNT: &str = "MIN_NUM_FORMS";
pub const MAX_NUM_FORM_COUNT: &str = "MAX_NUM_FORMS";
pub const DELETION_FIELD: &str = "DELETE";

pub const DEFAULT_MAX_NUM: usize = 1000;

pub const MANAGEMENT_FORM_MESSAGE: &str =
    "ManagementForm data is missing or has been tampered with";

/// Shape of a formset: row counts and deletion
#[derive(Debug, Clone)]
pub struct FormSetOptions {
    pub extra: usize,
    pub can_delete: bool,
    /// Offer deletion on extra rows as well as initial ones
    pub can_delete_extra: bool,
    pub min_num: usize,
    pub max_num: usize,
    /// Hard cap on submitted rows; defaults to `max_num + DEFAULT_MAX_NUM`
    pub absolute_max: Option<usize>,
    /// Initial data, one map per pre-filled row
    pub initial: Vec<Map<String, Value>>,
}

impl Default for FormSetOptions {
    fn default() -> Self {
        Self {
            extra: 1,
            can_delete: false,
            can_delete_extra: true,
            min_num: 0,
            max_num: DEFAULT_MAX_NUM,
            absolute_max: None,
            initial: Vec::new(),
        }
    }
}

impl FormSetOptions {
    fn absolute_max(&self) -> usize {
        self.absolute_max.unwrap_or(self.max_num + DEFAULT_MAX_NUM)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ManagementCounts {
    total: usize,
    initial: usize,
}

/// Collection of [`DynamicFilterForm`] rows sharing one submission
#[derive(Debug, Clone)]
pub struct DynamicFilterFormSet {
    model: ModelMeta,
    prefix: String,
    data: Option<FormData>,
    options: FormSetOptions,
    management: std::result::Result<ManagementCounts, ValidationErrors>,
    forms: Vec<DynamicFilterForm>,
    empty_form: DynamicFilterForm,
    non_form_errors: ValidationErrors,
}

impl DynamicFilterFormSet {
    pub fn new(
        model: &ModelMeta,
        registry: &dyn FilterSetRegistry,
        config: &FormsConfig,
        data: Option<FormData>,
        options: FormSetOptions,
    ) -> Result<Self> {
        let prefix = DEFAULT_PREFIX.to_string();
        let management = match &data {
            Some(data) => read_management_form(data, &prefix),
            None => Ok(ManagementCounts {
                total: unbound_total(&options),
                initial: options.initial.len(),
            }),
        };
        let counts = management.clone().unwrap_or(ManagementCounts {
            total: 0,
            initial: 0,
        });
        let total = counts.total.min(options.absolute_max());

        let empty_form = build_row(
            model,
            registry,
            config,
            &options,
            RowSpec {
                prefix: format!("{}-__prefix__", prefix),
                data: None,
                initial: Map::new(),
                empty_permitted: true,
                index: None,
                initial_count: counts.initial,
            },
        )?;

        let mut forms = Vec::with_capacity(total);
        for index in 0..total {
            forms.push(build_row(
                model,
                registry,
                config,
                &options,
                RowSpec {
                    prefix: format!("{}-{}", prefix, index),
                    data: data.clone(),
                    initial: options.initial.get(index).cloned().unwrap_or_default(),
                    empty_permitted: index >= counts.initial && index >= options.min_num,
                    index: Some(index),
                    initial_count: counts.initial,
                },
            )?);
        }

        debug!(
            model = %model.content_type(),
            bound = data.is_some(),
            forms = forms.len(),
            "Built dynamic filter formset"
        );
        Ok(Self {
            model: model.clone(),
            prefix,
            data,
            options,
            management,
            forms,
            empty_form,
            non_form_errors: ValidationErrors::new(),
        })
    }

    pub fn model(&self) -> &ModelMeta {
        &self.model
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn options(&self) -> &FormSetOptions {
        &self.options
    }

    /// Number of rows built, as reported by the management form when bound
    pub fn total_form_count(&self) -> usize {
        self.forms.len()
    }

    pub fn initial_form_count(&self) -> usize {
        self.management
            .as_ref()
            .map(|counts| counts.initial)
            .unwrap_or(0)
    }

    /// Management form values to render alongside the rows
    pub fn management_form(&self) -> Vec<(String, String)> {
        [
            (TOTAL_FORM_COUNT, self.total_form_count()),
            (INITIAL_FORM_COUNT, self.initial_form_count()),
            (MIN_NUM_FORM_COUNT, self.options.min_num),
            (MAX_NUM_FORM_COUNT, self.options.max_num),
        ]
        .into_iter()
        .map(|(key, value)| (format!("{}-{}", self.prefix, key), value.to_string()))
        .collect()
    }

    pub fn forms(&self) -> &[DynamicFilterForm] {
        &self.forms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DynamicFilterForm> {
        self.forms.iter()
    }

    /// Template row, prefixed `form-__prefix__`
    pub fn empty_form(&self) -> &DynamicFilterForm {
        &self.empty_form
    }

    pub fn non_form_errors(&self) -> &ValidationErrors {
        &self.non_form_errors
    }

    /// Validate every row; rows marked for deletion do not count
    pub fn is_valid(&mut self) -> bool {
        self.non_form_errors.clear();
        if !self.is_bound() {
            return false;
        }

        match &self.management {
            Ok(counts) if counts.total > self.options.absolute_max() => {
                self.non_form_errors.add(
                    NON_FIELD_ERRORS,
                    format!("Please submit at most {} forms.", self.options.max_num),
                );
            }
            Ok(_) => {}
            Err(errors) => {
                warn!(prefix = %self.prefix, "Rejected filter formset with broken management form");
                self.non_form_errors.merge(errors.clone());
            }
        }

        let can_delete = self.options.can_delete;
        let mut forms_valid = true;
        for form in &mut self.forms {
            let valid = form.is_valid();
            let deleted = can_delete && form.form().cleaned_bool(DELETION_FIELD);
            if !valid && !deleted {
                forms_valid = false;
            }
        }
        forms_valid && self.non_form_errors.is_empty()
    }

    /// Rows the user marked for deletion; empty until validated
    pub fn deleted_forms(&self) -> Vec<&DynamicFilterForm> {
        if !self.options.can_delete {
            return Vec::new();
        }
        self.forms
            .iter()
            .filter(|form| form.form().cleaned_bool(DELETION_FIELD))
            .collect()
    }

    /// `(lookup_type, value)` query parameters from the valid, kept rows
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.forms
            .iter()
            .filter(|form| form.form().errors().is_empty())
            .filter(|form| !(self.options.can_delete && form.form().cleaned_bool(DELETION_FIELD)))
            .filter_map(|form| {
                let lookup_type = form.lookup_type()?;
                Some(
                    form.values()
                        .into_iter()
                        .map(move |value| (lookup_type.to_string(), value)),
                )
            })
            .flatten()
            .collect()
    }
}

impl<'a> IntoIterator for &'a DynamicFilterFormSet {
    type Item = &'a DynamicFilterForm;
    type IntoIter = std::slice::Iter<'a, DynamicFilterForm>;

    fn into_iter(self) -> Self::IntoIter {
        self.forms.iter()
    }
}

struct RowSpec {
    prefix: String,
    data: Option<FormData>,
    initial: Map<String, Value>,
    empty_permitted: bool,
    /// `None` for the template row
    index: Option<usize>,
    initial_count: usize,
}

fn build_row(
    model: &ModelMeta,
    registry: &dyn FilterSetRegistry,
    config: &FormsConfig,
    options: &FormSetOptions,
    spec: RowSpec,
) -> Result<DynamicFilterForm> {
    let mut form = DynamicFilterForm::new(
        model,
        registry,
        config,
        FormOptions {
            data: spec.data,
            initial: spec.initial,
            prefix: Some(spec.prefix),
            // Extra and deleted rows must not trip browser validation
            use_required_attribute: false,
            empty_permitted: spec.empty_permitted,
        },
    )?;

    let deletable = match spec.index {
        Some(index) => options.can_delete_extra || index < spec.initial_count,
        None => options.can_delete_extra,
    };
    if options.can_delete && deletable {
        form.form_mut().add_field(
            FormField::boolean(DELETION_FIELD)
                .optional()
                .with_label("Delete"),
        );
    }
    Ok(form)
}

fn unbound_total(options: &FormSetOptions) -> usize {
    let initial = options.initial.len();
    let total = initial.max(options.min_num) + options.extra;
    if initial > options.max_num {
        initial
    } else {
        total.min(options.max_num)
    }
}

fn read_management_form(
    data: &FormData,
    prefix: &str,
) -> std::result::Result<ManagementCounts, ValidationErrors> {
    let count = |key: &str| -> Option<usize> {
        data.get(&format!("{}-{}", prefix, key))
            .and_then(|value| value.trim().parse().ok())
    };
    match (count(TOTAL_FORM_COUNT), count(INITIAL_FORM_COUNT)) {
        (Some(total), Some(initial)) => Ok(ManagementCounts { total, initial }),
        _ => Err(ValidationErrors::non_field(MANAGEMENT_FORM_MESSAGE)),
    }
}

/// Build the filter formset for `model`; bound when `data` holds any values
pub fn dynamic_formset_factory(
    model: &ModelMeta,
    registry: &dyn FilterSetRegistry,
    config: &FormsConfig,
    data: Option<FormData>,
) -> Result<DynamicFilterFormSet> {
    let options = FormSetOptions {
        extra: config.filter_form_extra(),
        can_delete: true,
        can_delete_extra: true,
        ..Default::default()
    };
    let data = data.filter(|data| !data.is_empty());
    DynamicFilterFormSet::new(model, registry, config, data, options)
}
