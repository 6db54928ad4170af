//! Lookup-expression labels and choices

use super::traits::FilterSet;
use crate::forms::Choice;

/// Human-readable name of a lookup suffix
fn verbose_lookup(suffix: &str) -> &'static str {
    match suffix {
        "n" => "is not",
        "ic" => "contains",
        "nic" => "does not contain",
        "iew" => "ends with",
        "niew" => "does not end with",
        "isw" => "starts with",
        "nisw" => "does not start with",
        "ie" => "equals",
        "nie" => "does not equal",
        "lt" => "is less than",
        "lte" => "is less than or equal to",
        "gt" => "is greater than",
        "gte" => "is greater than or equal to",
        "isnull" => "is null",
        "re" => "matches regex",
        "nre" => "does not match regex",
        "ire" => "matches regex (case insensitive)",
        "nire" => "does not match regex (case insensitive)",
        _ => "exact",
    }
}

/// Label for a lookup type: `name__ic` -> `contains (ic)`, `name` -> `exact`
pub fn build_lookup_label(lookup_type: &str) -> String {
    match lookup_type.rsplit_once("__") {
        Some((_, suffix)) if !suffix.is_empty() => {
            format!("{} ({})", verbose_lookup(suffix), suffix)
        }
        _ => "exact".to_string(),
    }
}

/// Lookup types the filter-set declares for `field_name`, as choices
pub fn lookup_choices(filterset: &FilterSet, field_name: &str) -> Vec<Choice> {
    let prefix = format!("{}__", field_name);
    filterset
        .iter()
        .filter(|filter| filter.name == field_name || filter.name.starts_with(&prefix))
        .map(|filter| Choice::new(filter.name.as_str(), build_lookup_label(&filter.name)))
        .collect()
}
