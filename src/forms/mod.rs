//! Form domain layer
//!
//! Field definitions, the bind/clean/validate lifecycle, and the reusable
//! forms built on it: confirmation, bulk edit and rename, imports, computed
//! network fields and table configuration.

mod bootstrap;
mod bulk;
mod computed;
mod csv;
mod data;
mod field;
mod form;
mod generic;
mod import;
mod ipnetwork;
mod table_config;
mod widget;

pub use bootstrap::{apply_bootstrap, FORM_CONTROL_CLASS};
pub use bulk::{BulkEditForm, BulkEditMeta, BulkRenameForm, NULLIFY_FIELD, PK_FIELD};
pub use computed::{
    Address, AddressFieldMixin, AddressModel, NetworkAttribute, NetworkFieldForm, Prefix,
    PrefixFieldMixin, PrefixModel,
};
pub use csv::{CsvData, CsvHeaders, CsvModelForm, CSV_FIELD};
pub use data::FormData;
pub use field::{pretty_name, Choice, FieldKind, FormField, RawValue, REQUIRED_MESSAGE};
pub use form::{CleanForm, Form, FormOptions};
pub use generic::{is_safe_return_url, ConfirmationForm, ReturnUrlForm, RETURN_URL_FIELD};
pub use import::{ImportForm, ImportFormat, DATA_FIELD, FORMAT_FIELD};
pub use ipnetwork::{IpNetwork, IpNetworkError};
pub use table_config::{ConfigurableTable, TableConfigForm, COLUMNS_FIELD};
pub use widget::{Widget, WidgetKind, API_SELECT_CLASS, STATIC_SELECT2_CLASS};
