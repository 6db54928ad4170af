//! Dynamic filter forms driven by a model's filter-set

mod dynamic_form;
mod formset;
mod lookup;
mod registry;
mod traits;

pub use dynamic_form::{capitalize, DynamicFilterForm, LOOKUP_FIELD, LOOKUP_TYPE, VALUE_FIELD};
pub use formset::{
    dynamic_formset_factory, DynamicFilterFormSet, FormSetOptions, DEFAULT_PREFIX, DELETION_FIELD,
    MANAGEMENT_FORM_MESSAGE,
};
pub use lookup::{build_lookup_label, lookup_choices};
pub use registry::{ModelFilters, StaticFilterSetRegistry};
pub use traits::{FilterDeclaration, FilterFieldData, FilterSet, FilterSetRegistry};

#[cfg(test)]
pub use traits::MockFilterSetRegistry;
