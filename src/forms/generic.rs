//! Return-URL and confirmation forms

use super::data::FormData;
use super::field::FormField;
use super::form::{CleanForm, Form};
use super::widget::{Widget, WidgetKind};

pub const RETURN_URL_FIELD: &str = "return_url";

fn return_url_field() -> FormField {
    FormField::char(RETURN_URL_FIELD)
        .optional()
        .with_widget(Widget::new(WidgetKind::HiddenInput))
}

/// Whether `url` may be used as a post-submit redirect target
pub fn is_safe_return_url(url: &str, allowed_hosts: &[String]) -> bool {
    let url = url.trim();
    if url.is_empty() || url.contains('\\') {
        return false;
    }
    match url::Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed
                    .host_str()
                    .is_some_and(|host| allowed_hosts.iter().any(|allowed| allowed == host))
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            url.starts_with('/') && !url.starts_with("//")
        }
        Err(_) => false,
    }
}

/// Hidden return URL controlling where the user is sent after submitting
#[derive(Debug, Clone)]
pub struct ReturnUrlForm {
    form: Form,
}

impl ReturnUrlForm {
    pub fn new() -> Self {
        Self {
            form: Form::new(vec![return_url_field()]),
        }
    }

    pub fn with_data(data: FormData) -> Self {
        Self {
            form: Form::new(vec![return_url_field()]).with_data(data),
        }
    }

    /// Cleaned return URL, if it is safe to redirect to
    pub fn safe_return_url(&self, allowed_hosts: &[String]) -> Option<&str> {
        self.form
            .cleaned_str(RETURN_URL_FIELD)
            .filter(|url| is_safe_return_url(url, allowed_hosts))
    }
}

impl Default for ReturnUrlForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanForm for ReturnUrlForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

/// Generic confirmation; not valid unless `confirm` is checked
#[derive(Debug, Clone)]
pub struct ConfirmationForm {
    form: Form,
}

impl ConfirmationForm {
    fn fields() -> Vec<FormField> {
        vec![
            return_url_field(),
            FormField::boolean("confirm")
                .with_widget(Widget::new(WidgetKind::HiddenInput))
                .with_initial(true),
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

    pub fn safe_return_url(&self, allowed_hosts: &[String]) -> Option<&str> {
        self.form
            .cleaned_str(RETURN_URL_FIELD)
            .filter(|url| is_safe_return_url(url, allowed_hosts))
    }
}

impl Default for ConfirmationForm {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanForm for ConfirmationForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}
