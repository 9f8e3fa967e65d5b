//! Index page rendering.
//!
//! The exporters hand a fully prepared [`IndexPage`] to an [`IndexRenderer`] and
//! write whatever document it returns. [`TemplateRenderer`] is the default
//! implementation, backed by an [upon] template. Custom renderers can be supplied
//! through [`HondanaConfig::renderer`](crate::HondanaConfig::renderer).

use serde::Serialize;
use std::str::FromStr;
use upon::{Engine, Template};

use crate::error::{Error, Result};
use crate::facets::{FacetCount, FacetCounts};
use crate::types::DisplayEntry;

/// Template used by [`TemplateRenderer::default`].
pub const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// One value of a facet, with its count.
#[derive(Debug, Clone, Serialize)]
pub struct FacetValue<'a> {
    pub value: &'a str,
    pub count: usize,
}

/// A facet prepared for display: values sorted by count, then by value.
#[derive(Debug, Clone, Serialize)]
pub struct FacetView<'a> {
    pub label: &'a str,
    pub field: &'static str,
    pub values: Vec<FacetValue<'a>>,
}

impl<'a> From<&'a FacetCount> for FacetView<'a> {
    fn from(facet: &'a FacetCount) -> Self {
        Self {
            label: &facet.label,
            field: facet.field.as_str(),
            values: facet
                .sorted_values()
                .into_iter()
                .map(|(value, count)| FacetValue { value, count })
                .collect(),
        }
    }
}

/// Everything a renderer receives to produce the index document.
#[derive(Debug, Clone, Serialize)]
pub struct IndexPage<'a> {
    pub title: &'a str,
    /// Entries for server-side iteration. Not escaped; templates must escape.
    pub entries: &'a [DisplayEntry],
    /// Script-safe JSON produced by [`prepare_entries_for_embedding`](crate::escape::prepare_entries_for_embedding).
    pub entries_json: &'a str,
    pub facets: Vec<FacetView<'a>>,
    pub total_entries: usize,
    pub generated_at: String,
}

impl<'a> IndexPage<'a> {
    pub fn new(
        title: &'a str,
        entries: &'a [DisplayEntry],
        entries_json: &'a str,
        facets: &'a FacetCounts,
    ) -> Self {
        Self {
            title,
            entries,
            entries_json,
            facets: facets.iter().map(FacetView::from).collect(),
            total_entries: entries.len(),
            generated_at: chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

/// Turns a prepared [`IndexPage`] into a complete document.
pub trait IndexRenderer {
    fn render(&self, page: &IndexPage<'_>) -> Result<String>;
}

/// [`IndexRenderer`] backed by a compiled [upon] template.
///
/// Besides upon's built-ins, templates can use the `html` formatter, which
/// HTML-escapes strings and joins lists with `, ` after escaping each item.
pub struct TemplateRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

impl FromStr for TemplateRenderer {
    type Err = Error;

    /// Compiles `s` eagerly so syntax errors surface before any export work.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = engine.compile(s.to_string())?;
        Ok(Self { engine, template })
    }
}

impl Default for TemplateRenderer {
    /// Renderer for the embedded `templates/index.html`.
    ///
    /// # Panics
    ///
    /// Panics if the embedded template does not compile. It is fixed at build
    /// time and compiled by this module's tests.
    fn default() -> Self {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = engine
            .compile(DEFAULT_INDEX_TEMPLATE)
            .expect("embedded index template must compile");
        Self { engine, template }
    }
}

impl IndexRenderer for TemplateRenderer {
    fn render(&self, page: &IndexPage<'_>) -> Result<String> {
        Ok(self.template.render(&self.engine, page).to_string()?)
    }
}

/// Custom [`upon`] formatters for HTML output.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    use crate::escape::escape_html;

    /// Escapes strings; escapes and comma-joins lists of scalars.
    fn html_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => write!(f, "{}", escape_html(s))?,
            Value::List(items) => {
                let mut first = true;
                for item in items {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    match item {
                        Value::String(s) => write!(f, "{}", escape_html(s))?,
                        other => upon_fmt::default(f, other)?,
                    }
                }
            }
            Value::None => {}
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("html", html_formatter);
    }
}
