//! # appdef_helm
//!
//! Helm chart generation for appdef.
//!
//! A chart is written as `Chart.yaml` (from the application metadata),
//! `values.yaml` (the settings the Compose file refers to) and
//! `templates/stack.yaml` (a Kubernetes `Stack` object).
//!
//! By default every `$name` and `${name}` in the Compose file is kept as a
//! `{{.Values.name}}` expression so the chart can be configured at install
//! time. With [`HelmOptions::render`] set, the application is rendered first
//! and the stack holds concrete values.

pub mod chart;
pub mod error;
pub mod helm;
mod output;
pub mod stack;
pub mod values;

pub use chart::{make_chart, CHART_FILE_NAME};
pub use error::{HelmError, HelmResult};
pub use helm::{helm, HelmOptions, CHART_EXTENSION};
pub use stack::{
    rendered_stack, stack_object, template_stack, write_stack, StackVersion, STACK_FILE_NAME,
    TEMPLATES_DIR,
};
pub use values::{filter_variables, make_values, merge_values, VALUES_FILE_NAME};
