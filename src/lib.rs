//! Hondana - eBook Library Metadata Management and Export
//!
//! This crate loads a personal eBook library described by a `metadata.json` file,
//! filters its entries, and exports them to browsable layouts: a static faceted
//! HTML index, a symlink tree grouping books by facet value, or a Hugo content tree.
//!
//! # Getting Started
//!
//! Configure an export with the `HondanaConfig` builder, then run it. The library
//! directory must contain `metadata.json`, a JSON array of entry objects whose file
//! paths are relative to that directory.
//!
//! ```rust,no_run
//! use hondana::prelude::*;
//!
//! fn main() -> hondana::error::Result<()> {
//!     // 1. Optionally narrow the library down
//!     let filter = EntryFilter::new().with_language("en");
//!
//!     // 2. Configure the export
//!     let config = HondanaConfig::builder()
//!         .library_path("./library")
//!         .output_path("./site")
//!         .export_kind(ExportKind::FacetedHtml)
//!         .title("My Books")
//!         .filter(filter)
//!         .include_files(false) // link to files instead of copying them
//!         .build()?;
//!
//!     // Optional: fail early on bad paths
//!     config.preflight_check()?;
//!
//!     // 3. Export and inspect the report
//!     let report = config.export()?;
//!     println!(
//!         "Exported {} entries ({} files missing)",
//!         report.entries_exported, report.files.missing
//!     );
//!     Ok(())
//! }
//! ```
//!
//! Lower-level building blocks (the [`library::Library`] loader, the
//! [`facets`] aggregator, the [`escape`] helpers and the [`exporter::Exporter`]
//! trait) are public for callers that need a different pipeline.

pub mod error;
pub mod escape;
pub mod exporter;
pub mod facets;
pub mod filter;
pub mod hondana;
pub mod library;
pub mod path_utils;
pub mod render;
pub mod types;

// Publicly expose the main `HondanaConfig` struct and its builder
pub use hondana::HondanaConfig;
pub use hondana::HondanaConfigBuilder;

// Re-export core types for direct access
pub use facets::{FacetCount, FacetCounts};
pub use filter::EntryFilter;
pub use library::Library;
pub use render::{IndexPage, IndexRenderer, TemplateRenderer};
pub use types::{
    DisplayEntry, Entry, ExportKind, ExportManifest, ExportReport, FacetDefinition, FacetField,
    MaterializeOutcome,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use hondana::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        DisplayEntry, Entry, EntryFilter, ExportKind, ExportManifest, ExportReport, FacetCounts,
        FacetDefinition, FacetField, HondanaConfig, HondanaConfigBuilder, IndexPage,
        IndexRenderer, Library, TemplateRenderer,
    };
    pub use crate::error::{Error, Result};
}
