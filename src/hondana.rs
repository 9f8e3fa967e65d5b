use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::exporter::{
    ExportContext, RESERVED_ROOT_NAMES, faceted::FacetedHtml, hugo::Hugo, run_exporter,
    symlink::SymlinkTree,
};
use crate::facets::build_facets;
use crate::filter::EntryFilter;
use crate::library::{Library, prepare_output, validate_output};
use crate::path_utils::{path_to_string_lossy, safe_segment};
use crate::render::{IndexRenderer, TemplateRenderer};
use crate::types::{Entry, ExportKind, ExportReport, FacetDefinition};

/// The main Hondana export configuration, built declaratively using the builder pattern.
///
/// This struct holds everything needed to export a library: where the library and
/// the output live, which layout to produce, which facets to compute, and how
/// entry files are materialized. Once configured, run it with:
///
/// - [`export`](HondanaConfig::export): Load `metadata.json`, filter, and export
/// - [`export_entries`](HondanaConfig::export_entries): Export entries you already hold
/// - [`load_entries`](HondanaConfig::load_entries): Load and filter only
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use hondana::prelude::*;
/// let config = HondanaConfig::builder()
///     .library_path("./library")
///     .output_path("./site")
///     .export_kind(ExportKind::SymlinkTree)
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct HondanaConfig {
    /// Directory holding `metadata.json` and the files entries reference.
    #[builder(default)]
    pub library_path: PathBuf,

    /// Directory the export is written to.
    ///
    /// With [`clean`](HondanaConfig::clean) set, it is deleted and recreated first.
    #[builder(default)]
    pub output_path: PathBuf,

    /// Output layout.
    ///
    /// - [`ExportKind::FacetedHtml`]: `_books/`, `index.html`, `README.md`
    /// - [`ExportKind::SymlinkTree`]: the above plus `<facet>/<value>/<title>` links
    /// - [`ExportKind::Hugo`]: `content/books/` page bundles, `data/facets.json`, `hugo.toml`
    #[builder(default)]
    pub export_kind: ExportKind,

    /// Facets to compute, in display order.
    #[builder(default = "FacetDefinition::defaults()")]
    pub facets: Vec<FacetDefinition>,

    /// Copy entry files into the output when `true`; link to them when `false`.
    #[builder(default = "false")]
    pub include_files: bool,

    /// Whether to render `index.html`. Hugo exports never write one.
    #[builder(default = "true")]
    pub create_index: bool,

    /// Remove the output directory before exporting.
    #[builder(default = "true")]
    pub clean: bool,

    /// Title of the index page and the manifest.
    #[builder(default = "\"eBook Library\".to_string()")]
    pub title: String,

    /// Restricts the export to matching entries.
    #[builder(default)]
    pub filter: Option<EntryFilter>,

    /// Renderer for `index.html`. Defaults to [`TemplateRenderer::default`].
    #[builder(setter(custom), default)]
    pub renderer: Option<Arc<dyn IndexRenderer>>,
}

impl std::fmt::Debug for HondanaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HondanaConfig")
            .field("library_path", &self.library_path)
            .field("output_path", &self.output_path)
            .field("export_kind", &self.export_kind)
            .field("facets", &self.facets)
            .field("include_files", &self.include_files)
            .field("create_index", &self.create_index)
            .field("clean", &self.clean)
            .field("title", &self.title)
            .field("filter", &self.filter)
            .field(
                "renderer",
                if self.renderer.is_some() {
                    &"Some(Custom)"
                } else {
                    &"None"
                },
            )
            .finish()
    }
}

impl HondanaConfig {
    /// Creates a new builder for configuring `HondanaConfig`.
    pub fn builder() -> HondanaConfigBuilder {
        HondanaConfigBuilder::default()
    }

    /// Checks the configuration against the filesystem without writing anything.
    ///
    /// [`export`](HondanaConfig::export) calls this first; calling it yourself only
    /// surfaces problems earlier.
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - Both paths are set and the library directory exists
    /// * `Err(Error)` - A path is missing, the library is not a directory, or
    ///   cleaning the output would delete the library
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.library_path.as_os_str().is_empty() {
            return Err(Error::Other("`library_path` must be set.".to_string()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(Error::Other("`output_path` must be set.".to_string()));
        }
        if !self.library_path.exists() {
            return Err(Error::NotFound(format!(
                "Library path does not exist: {:?}",
                self.library_path
            )));
        }
        if !self.library_path.is_dir() {
            return Err(Error::InvalidPath(
                self.library_path.clone(),
                "Library path is not a directory.".to_string(),
            ));
        }
        if self.clean && output_contains(&self.output_path, &self.library_path)? {
            return Err(Error::InvalidPath(
                self.output_path.clone(),
                "Cleaning this output directory would delete the library.".to_string(),
            ));
        }
        Ok(self)
    }

    /// Loads the library's entries and applies the configured filter.
    pub fn load_entries(&self) -> Result<Vec<Entry>> {
        let entries = Library::open(&self.library_path).load()?;
        Ok(self.apply_filter(entries))
    }

    /// Runs the full export: preflight, load, filter, prepare, aggregate and write.
    ///
    /// # Returns
    ///
    /// * `Ok(ExportReport)` - What was written, including facet counts and file tallies
    /// * `Err(Error)` - Loading failed or the output could not be written. Missing
    ///   entry files are not errors; they are counted in the report.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use hondana::prelude::*;
    /// # fn main() -> hondana::error::Result<()> {
    /// let report = HondanaConfig::builder()
    ///     .library_path("./library")
    ///     .output_path("./site")
    ///     .build()?
    ///     .export()?;
    /// println!("{} entries exported", report.entries_exported);
    /// # Ok(())
    /// # }
    /// ```
    pub fn export(&self) -> Result<ExportReport> {
        self.preflight_check()?;
        let entries = Library::open(&self.library_path).load()?;
        self.run(entries)
    }

    /// Exports `entries` instead of reading `metadata.json`.
    ///
    /// Referenced files are still resolved against `library_path`, and the
    /// configured filter still applies.
    pub fn export_entries(&self, entries: Vec<Entry>) -> Result<ExportReport> {
        self.preflight_check()?;
        self.run(entries)
    }

    /// Checks that the output directory exists and is not empty.
    pub fn validate_output(&self) -> Result<()> {
        validate_output(&self.output_path)
    }

    fn apply_filter(&self, entries: Vec<Entry>) -> Vec<Entry> {
        match &self.filter {
            Some(filter) => {
                let before = entries.len();
                let kept = filter.apply(entries);
                info!("Filter kept {} of {} entries", kept.len(), before);
                kept
            }
            None => entries,
        }
    }

    fn run(&self, entries: Vec<Entry>) -> Result<ExportReport> {
        let entries = self.apply_filter(entries);
        let library = Library::open(&self.library_path);

        prepare_output(&self.output_path, self.clean)?;
        let facets = build_facets(&entries, &self.facets);
        debug!("Computed {} facets", facets.len());

        let fallback;
        let renderer: &dyn IndexRenderer = match &self.renderer {
            Some(renderer) => renderer.as_ref(),
            None => {
                fallback = TemplateRenderer::default();
                &fallback
            }
        };

        let context = ExportContext {
            library: &library,
            output_root: &self.output_path,
            title: &self.title,
            facets: &self.facets,
            include_files: self.include_files,
            create_index: self.create_index,
            renderer,
        };

        info!(
            "Exporting {} entries as {} into {}",
            entries.len(),
            self.export_kind,
            path_to_string_lossy(&self.output_path)
        );

        let report = match self.export_kind {
            ExportKind::FacetedHtml => run_exporter::<FacetedHtml>(context, &entries, facets)?,
            ExportKind::SymlinkTree => run_exporter::<SymlinkTree>(context, &entries, facets)?,
            ExportKind::Hugo => run_exporter::<Hugo>(context, &entries, facets)?,
        };

        if report.files.missing > 0 {
            info!("{} referenced files were missing", report.files.missing);
        }
        Ok(report)
    }
}

/// True when `inner` is `outer` or lies below it. A missing `outer` contains nothing.
fn output_contains(outer: &Path, inner: &Path) -> Result<bool> {
    if !outer.exists() {
        return Ok(false);
    }
    let outer = outer.canonicalize()?;
    let inner = inner.canonicalize()?;
    Ok(inner.starts_with(&outer))
}

impl HondanaConfigBuilder {
    /// Sets a custom renderer for `index.html`.
    pub fn renderer<R: IndexRenderer + 'static>(&mut self, renderer: R) -> &mut Self {
        self.renderer = Some(Some(Arc::new(renderer)));
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(facets) = &self.facets {
            let mut seen = std::collections::HashSet::new();
            for facet in facets {
                let label = facet.label.trim();
                if label.is_empty() {
                    return Err(format!("Facet for field '{}' has an empty label", facet.field));
                }
                if !seen.insert(label) {
                    return Err(format!("Duplicate facet label: {}", label));
                }
                let segment = safe_segment(label);
                if RESERVED_ROOT_NAMES
                    .iter()
                    .any(|reserved| reserved.eq_ignore_ascii_case(&segment))
                {
                    return Err(format!(
                        "Facet label '{}' collides with the output name '{}'",
                        label, segment
                    ));
                }
            }
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err("Title must not be empty.".to_string());
            }
        }
        Ok(())
    }
}
