use log::info;

use crate::error::Result;
use crate::exporter::{
    BOOKS_DIR, EntryDirectories, ExportContext, Exporter, write_index, write_manifest,
};
use crate::facets::FacetCounts;
use crate::types::{Entry, ExportKind, ExportManifest, ExportReport};

/// Exporter for the static multi-facet HTML layout.
///
/// Writes `_books/<id>/` (metadata plus files) for every entry with an id, then an
/// `index.html` embedding the escaped entry data and facet counts, and a `README.md`
/// manifest.
pub struct FacetedHtml<'a> {
    context: ExportContext<'a>,
    books: EntryDirectories,
}

impl<'a> Exporter<'a> for FacetedHtml<'a> {
    const KIND: ExportKind = ExportKind::FacetedHtml;

    fn new(context: ExportContext<'a>) -> Result<Self> {
        let books = EntryDirectories::create(context.output_root.join(BOOKS_DIR))?;
        Ok(FacetedHtml { context, books })
    }

    fn add_entry(&mut self, entry: &Entry) -> Result<&mut Self> {
        self.books.write(&self.context, entry)?;
        Ok(self)
    }

    fn finish(self, facets: FacetCounts) -> Result<ExportReport> {
        if self.context.create_index {
            write_index(&self.context, &self.books.entries, &facets)?;
        }

        let manifest = ExportManifest::new(
            Self::KIND,
            self.books.entries.len(),
            format!(
                "Faceted browsing over {} facets; {} entry directories under `{}/`, each holding `metadata.json` and the entry's files.",
                facets.len(),
                self.books.exported,
                BOOKS_DIR
            ),
        );
        write_manifest(&self.context, &manifest)?;

        info!(
            "Faceted export finished: {} entries, {} directories",
            manifest.total_entries, self.books.exported
        );
        Ok(self.books.into_report(manifest, facets))
    }
}
