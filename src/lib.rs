//! Record forms
//!
//! Server-side form definitions and validation for record-management
//! interfaces: bulk edit and rename, CSV and JSON/YAML imports, and filter
//! forms built from a model's filter-set.

pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod forms;
pub mod model;

pub use config::FormsConfig;
pub use error::{FormError, Result, ValidationErrors};
pub use model::{ModelClean, ModelMeta};
