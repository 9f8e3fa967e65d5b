//! Exporter module provides the trait and implementations for the output formats.
//!
//! This module contains the common interface for exporters, the state they share
//! while writing per-entry directories, and the helpers every variant composes:
//! index rendering and manifest writing.

use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::escape::{prepare_entries_for_embedding, reduce_for_display};
use crate::facets::FacetCounts;
use crate::library::{Library, METADATA_FILE, Materialize, remove_symlink, write_json};
use crate::path_utils::{path_to_string_lossy, safe_segment};
use crate::render::{IndexPage, IndexRenderer};
use crate::types::{
    DisplayEntry, Entry, ExportKind, ExportManifest, ExportReport, FacetDefinition,
    MaterializeOutcome,
};

pub mod faceted;
pub mod hugo;
pub mod symlink;

/// Directory under the output root that holds one sub-directory per entry.
pub const BOOKS_DIR: &str = "_books";
/// File name of the rendered index page.
pub const INDEX_FILE: &str = "index.html";
/// File name of the export manifest.
pub const MANIFEST_FILE: &str = "README.md";

/// Top-level names an export may write into the output root.
///
/// Symlink-tree facet directories sit next to these, so facet labels must not
/// sanitize to any of them.
pub const RESERVED_ROOT_NAMES: [&str; 6] = [
    BOOKS_DIR,
    INDEX_FILE,
    MANIFEST_FILE,
    "content",
    "data",
    hugo::SITE_CONFIG_FILE,
];

/// Everything an exporter needs from the run configuration.
#[derive(Clone, Copy)]
pub struct ExportContext<'a> {
    pub library: &'a Library,
    pub output_root: &'a Path,
    pub title: &'a str,
    pub facets: &'a [FacetDefinition],
    /// Copy files when `true`, symlink them when `false`.
    pub include_files: bool,
    pub create_index: bool,
    pub renderer: &'a dyn IndexRenderer,
}

impl ExportContext<'_> {
    pub fn materialize_mode(&self) -> Materialize {
        if self.include_files {
            Materialize::Copy
        } else {
            Materialize::Symlink
        }
    }
}

/// Common interface for all exporters.
///
/// An exporter is created once per run, receives every entry in collection order
/// through [`add_entry`](Exporter::add_entry), and writes its closing documents in
/// [`finish`](Exporter::finish).
pub trait Exporter<'a>: Sized {
    /// The export variant this exporter implements.
    const KIND: ExportKind;

    /// Creates the exporter and any fixed directories it writes into.
    ///
    /// # Parameters
    /// * `context` - Library handle, output root and run options
    ///
    /// # Returns
    /// * `Result<Self>` - A new exporter or an error if the output is not writable
    fn new(context: ExportContext<'a>) -> Result<Self>;

    /// Processes one entry. Entries without an id are recorded for the index only.
    ///
    /// # Returns
    /// * `Result<&mut Self>` - Self reference for method chaining, or an error if the
    ///   entry's directory or metadata could not be written
    fn add_entry(&mut self, entry: &Entry) -> Result<&mut Self>;

    /// Writes the closing documents (index, manifest) and reports the run.
    ///
    /// # Parameters
    /// * `facets` - Facet counts computed over the full entry collection
    fn finish(self, facets: FacetCounts) -> Result<ExportReport>;
}

/// Shared bookkeeping for exporters that write one directory per entry.
#[derive(Debug)]
pub(crate) struct EntryDirectories {
    root: PathBuf,
    /// Directory name → id that claimed it first.
    claimed: HashMap<String, String>,
    pub(crate) entries: Vec<DisplayEntry>,
    pub(crate) exported: usize,
    pub(crate) without_id: usize,
    pub(crate) files: MaterializeOutcome,
}

impl EntryDirectories {
    /// Creates `root` (with parents) and starts tracking entries written below it.
    pub(crate) fn create(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            claimed: HashMap::new(),
            entries: Vec::new(),
            exported: 0,
            without_id: 0,
            files: MaterializeOutcome::default(),
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `<root>/<id>/metadata.json`, then places the entry's files next to it.
    ///
    /// Returns the entry's directory name, or `None` when the entry has no id. The
    /// display copy of the entry is recorded either way.
    pub(crate) fn write(
        &mut self,
        context: &ExportContext<'_>,
        entry: &Entry,
    ) -> Result<Option<String>> {
        let Some(id) = entry.id() else {
            debug!("Entry '{}' has no unique_id; index only", entry.title);
            self.without_id += 1;
            self.entries.push(DisplayEntry::new(entry.clone(), None));
            return Ok(None);
        };

        let name = safe_segment(id);
        if let Some(previous) = self.claimed.insert(name.clone(), id.to_string()) {
            if previous != id {
                warn!(
                    "Entries '{}' and '{}' share the directory name '{}'; the later one wins",
                    previous, id, name
                );
            }
        }

        let entry_dir = self.root.join(&name);
        fs::create_dir_all(&entry_dir)?;
        // Metadata goes first and never through a link, so it cannot land in the library.
        let metadata_path = entry_dir.join(METADATA_FILE);
        remove_symlink(&metadata_path)?;
        write_json(entry, &metadata_path)?;
        self.files += context
            .library
            .materialize(entry, &entry_dir, context.materialize_mode());
        debug!("Wrote entry '{}' to {}", id, path_to_string_lossy(&entry_dir));

        self.exported += 1;
        self.entries
            .push(DisplayEntry::new(entry.clone(), Some(name.clone())));
        Ok(Some(name))
    }

    /// Assembles the run report from the tracked counters.
    pub(crate) fn into_report(self, manifest: ExportManifest, facets: FacetCounts) -> ExportReport {
        ExportReport {
            manifest,
            facets,
            entries_exported: self.exported,
            entries_without_id: self.without_id,
            files: self.files,
        }
    }
}

/// Renders `index.html` into the output root from the display entries and facets.
pub(crate) fn write_index(
    context: &ExportContext<'_>,
    entries: &[DisplayEntry],
    facets: &FacetCounts,
) -> Result<()> {
    let reduced: Vec<DisplayEntry> = entries.iter().map(reduce_for_display).collect();
    let payload = prepare_entries_for_embedding(&reduced)?;
    let page = IndexPage::new(context.title, entries, &payload, facets);
    let document = context.renderer.render(&page)?;
    fs::write(context.output_root.join(INDEX_FILE), document)?;
    Ok(())
}

/// Writes the manifest as `README.md` into the output root.
pub(crate) fn write_manifest(context: &ExportContext<'_>, manifest: &ExportManifest) -> Result<()> {
    fs::write(
        context.output_root.join(MANIFEST_FILE),
        manifest.to_markdown(context.title),
    )?;
    Ok(())
}

/// Drives `E` over `entries` from creation to report.
pub fn run_exporter<'a, E: Exporter<'a>>(
    context: ExportContext<'a>,
    entries: &[Entry],
    facets: FacetCounts,
) -> Result<ExportReport> {
    let mut exporter = E::new(context)?;
    for entry in entries {
        exporter.add_entry(entry)?;
    }
    exporter.finish(facets)
}
