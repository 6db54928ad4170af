//! Bootstrap presentation defaults for form widgets

use super::form::Form;

pub const FORM_CONTROL_CLASS: &str = "form-control";

/// Add the base Bootstrap CSS classes to form elements.
///
/// Fields get `form-control` unless their widget is a checkbox, radio or file
/// input; required fields are marked `required` unless they take a file; the
/// placeholder defaults to the declared label.
pub fn apply_bootstrap(form: &mut Form) {
    for field in form.fields_mut() {
        if !field.widget.is_bootstrap_exempt() {
            field.widget.add_class(FORM_CONTROL_CLASS);
        }
        if field.required && !field.widget.is_file_input() {
            field.widget.set_attr("required", "required");
        }
        if !field.widget.has_attr("placeholder") {
            if let Some(label) = &field.label {
                field.widget.set_attr("placeholder", label.clone());
            }
        }
    }
}

impl Form {
    /// Builder-style [`apply_bootstrap`]
    pub fn bootstrap(mut self) -> Self {
        apply_bootstrap(&mut self);
        self
    }
}
