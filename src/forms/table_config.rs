//! Per-user table column selection

use super::data::FormData;
use super::field::{Choice, FormField};
use super::form::{CleanForm, Form};
use super::widget::{Widget, WidgetKind};

pub const COLUMNS_FIELD: &str = "columns";

/// A table whose visible columns users can choose
pub trait ConfigurableTable {
    /// Table class name, used to key the user preference
    fn name(&self) -> &str;
    /// Every column that may be shown, in display order
    fn configurable_columns(&self) -> Vec<Choice>;
    /// Columns currently shown
    fn visible_columns(&self) -> Vec<String>;
}

/// Form for configuring user's table preferences
#[derive(Debug, Clone)]
pub struct TableConfigForm {
    table_name: String,
    form: Form,
}

impl TableConfigForm {
    pub fn new<T: ConfigurableTable + ?Sized>(table: &T, data: Option<FormData>) -> Self {
        let columns = FormField::multiple_choice(COLUMNS_FIELD, table.configurable_columns())
            .optional()
            .with_widget(Widget::new(WidgetKind::SelectMultiple).with_attr("size", "10"))
            .with_help_text(
                "Use the buttons below to arrange columns in the desired order, \
                 then select all columns to display.",
            )
            .with_initial(table.visible_columns());

        let mut form = Form::new(vec![columns]);
        if let Some(data) = data {
            form = form.with_data(data);
        }
        Self {
            table_name: table.name().to_string(),
            form: form.bootstrap(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Columns chosen in the submitted data, in submitted order
    pub fn selected_columns(&self) -> Vec<String> {
        self.form.cleaned_list(COLUMNS_FIELD)
    }

    /// User preference key and value to persist
    pub fn preference(&self) -> (String, Vec<String>) {
        (
            format!("tables.{}.columns", self.table_name),
            self.selected_columns(),
        )
    }
}

impl CleanForm for TableConfigForm {
    fn form(&self) -> &Form {
        &self.form
    }
    fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct DeviceTable;

    impl ConfigurableTable for DeviceTable {
        fn name(&self) -> &str {
            "DeviceTable"
        }
        fn configurable_columns(&self) -> Vec<Choice> {
            vec![
                Choice::new("name", "Name"),
                Choice::new("status", "Status"),
                Choice::new("site", "Site"),
                Choice::new("rack", "Rack"),
            ]
        }
        fn visible_columns(&self) -> Vec<String> {
            vec!["name".to_string(), "status".to_string()]
        }
    }

    #[test]
    fn test_field_configuration() {
        let form = TableConfigForm::new(&DeviceTable, None);
        let columns = form.form().field(COLUMNS_FIELD).unwrap();
        assert!(!columns.required);
        assert_eq!(columns.choices().len(), 4);
        assert_eq!(columns.initial, Some(json!(["name", "status"])));
        assert_eq!(columns.widget.kind, WidgetKind::SelectMultiple);
        assert_eq!(columns.widget.attr("size"), Some("10"));
        assert_eq!(columns.widget.class(), "form-control");
        assert_eq!(form.table_name(), "DeviceTable");
    }

    #[test]
    fn test_selected_columns_keep_submitted_order() {
        let data = FormData::from_query_string("columns=site&columns=name");
        let mut form = TableConfigForm::new(&DeviceTable, Some(data));
        assert!(form.is_valid());
        assert_eq!(form.selected_columns(), vec!["site", "name"]);
        assert_eq!(
            form.preference(),
            (
                "tables.DeviceTable.columns".to_string(),
                vec!["site".to_string(), "name".to_string()]
            )
        );
    }

    #[test]
    fn test_unknown_column_rejected() {
        let data = FormData::from_query_string("columns=serial");
        let mut form = TableConfigForm::new(&DeviceTable, Some(data));
        assert!(!form.is_valid());
        assert!(form.selected_columns().is_empty());
    }

    #[test]
    fn test_empty_selection_is_valid() {
        let mut form = TableConfigForm::new(&DeviceTable, Some(FormData::new()));
        assert!(form.is_valid());
        assert!(form.selected_columns().is_empty());
    }
}
