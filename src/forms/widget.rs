//! Input widgets and their HTML attributes

use std::collections::BTreeMap;

/// Class carried by statically populated select2 widgets
pub const STATIC_SELECT2_CLASS: &str = "nautobot-select2-static";
/// Class carried by API-backed select2 widgets
pub const API_SELECT_CLASS: &str = "nautobot-select2-api";

/// The kind of HTML input a field renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    TextInput,
    Textarea,
    HiddenInput,
    MultipleHiddenInput,
    CheckboxInput,
    Select,
    SelectMultiple,
    StaticSelect2,
    StaticSelect2Multiple,
    ApiSelect,
    ApiSelectMultiple,
    FileInput,
    ClearableFileInput,
    RadioSelect,
}

/// A widget with its attribute map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub kind: WidgetKind,
    pub attrs: BTreeMap<String, String>,
}

impl Widget {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    /// Merge caller-supplied attributes over the widget defaults
    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    /// Select2 widget with statically rendered choices
    pub fn static_select2() -> Self {
        Self::new(WidgetKind::StaticSelect2).with_attr("class", STATIC_SELECT2_CLASS)
    }

    pub fn static_select2_multiple() -> Self {
        Self::new(WidgetKind::StaticSelect2Multiple)
            .with_attr("class", STATIC_SELECT2_CLASS)
            .with_attr("data-multiple", "1")
    }

    /// Select2 widget that loads its choices from `api_url`
    pub fn api_select(api_url: &str) -> Self {
        let widget = Self::new(WidgetKind::ApiSelect).with_attr("class", API_SELECT_CLASS);
        if api_url.is_empty() {
            widget
        } else {
            widget.with_attr("data-url", format!("/{}", api_url.trim_start_matches('/')))
        }
    }

    pub fn api_select_multiple(api_url: &str) -> Self {
        let mut widget = Self::api_select(api_url).with_attr("data-multiple", "1");
        widget.kind = WidgetKind::ApiSelectMultiple;
        widget
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Current CSS class list, empty when none is set
    pub fn class(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    /// Append `css` to the class list
    pub fn add_class(&mut self, css: &str) {
        let class = format!("{} {}", self.class(), css).trim().to_string();
        self.set_attr("class", class);
    }

    /// File inputs, including the clearable variant
    pub fn is_file_input(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::FileInput | WidgetKind::ClearableFileInput
        )
    }

    /// Widgets that keep their own styling instead of `form-control`
    pub fn is_bootstrap_exempt(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::CheckboxInput
                | WidgetKind::ClearableFileInput
                | WidgetKind::FileInput
                | WidgetKind::RadioSelect
        )
    }

    /// Whether the widget submits a list of values
    pub fn is_multiple(&self) -> bool {
        matches!(
            self.kind,
            WidgetKind::MultipleHiddenInput
                | WidgetKind::SelectMultiple
                | WidgetKind::StaticSelect2Multiple
                | WidgetKind::ApiSelectMultiple
        ) || self.has_attr("multiple")
    }
}

impl Default for Widget {
    fn default() -> Self {
        Self::new(WidgetKind::TextInput)
    }
}
