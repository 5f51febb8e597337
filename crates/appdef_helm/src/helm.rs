//! Chart generation entry point.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use tracing::info;

use appdef_render::{extract_variables, render, DriverRegistry, RenderOptions};
use appdef_types::{app_name_from_dir, App};

use crate::chart::make_chart;
use crate::error::{HelmError, HelmResult};
use crate::stack::{rendered_stack, template_stack, write_stack, StackVersion};
use crate::values::make_values;

/// Suffix of generated chart directories.
pub const CHART_EXTENSION: &str = ".chart";

/// Options for [`helm`].
#[derive(Debug, Clone, Default)]
pub struct HelmOptions {
    /// Resolve every variable instead of keeping them as chart values.
    pub render: bool,
    pub stack_version: StackVersion,
    /// Chart directory. Defaults to `<app-name>.chart`.
    pub chart_dir: Option<PathBuf>,
    /// Render drivers used when `render` is set.
    pub render_options: RenderOptions,
}

impl HelmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_stack_version(mut self, version: StackVersion) -> Self {
        self.stack_version = version;
        self
    }

    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(dir.into());
        self
    }

    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }
}

/// Generate a Helm chart for an application. Returns the chart directory.
pub fn helm(
    app: &App,
    overrides: &BTreeMap<String, String>,
    registry: &DriverRegistry,
    options: &HelmOptions,
) -> HelmResult<PathBuf> {
    let name = app_name_from_dir(app.name());
    let chart_dir = options
        .chart_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}{}", name, CHART_EXTENSION)));
    fs::create_dir_all(&chart_dir).map_err(|source| HelmError::CreateDir {
        path: chart_dir.clone(),
        source,
    })?;
    info!("Generating Helm chart for {} in {:?}", name, chart_dir);

    make_chart(app.metadata(), &chart_dir)?;

    if options.render {
        let config = render(app, overrides, registry, &options.render_options)?;
        write_stack(&chart_dir, &rendered_stack(&name, &config, options.stack_version)?)?;
        return Ok(chart_dir);
    }

    let compose = match app.composes() {
        [compose] => compose,
        [] => return Err(HelmError::NoCompose),
        _ => return Err(HelmError::MultipleComposes),
    };
    let variables = extract_variables(compose)?;
    write_stack(&chart_dir, &template_stack(&name, compose, options.stack_version)?)?;
    make_values(app, &chart_dir, overrides, &variables)?;
    Ok(chart_dir)
}
