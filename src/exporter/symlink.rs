use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::exporter::{
    BOOKS_DIR, EntryDirectories, ExportContext, Exporter, write_index, write_manifest,
};
use crate::facets::{FacetCounts, facet_keys};
use crate::library::create_symlink;
use crate::path_utils::{path_to_string_lossy, safe_segment};
use crate::types::{Entry, ExportKind, ExportManifest, ExportReport};

/// Exporter for the symlink tree ("symlink DAG") layout.
///
/// Every entry lives once under `_books/<id>/`. Each facet gets a top-level
/// directory named after its label, with one sub-directory per value holding
/// relative links back to the entries that carry that value:
///
/// ```text
/// Authors/Jane Doe/Foo - Jane Doe -> ../../_books/a1
/// ```
///
/// Existing links are left alone, so exporting into a non-cleaned output again
/// produces the same tree.
pub struct SymlinkTree<'a> {
    context: ExportContext<'a>,
    books: EntryDirectories,
    links: LinkTally,
}

#[derive(Debug, Default, Clone, Copy)]
struct LinkTally {
    created: usize,
    existing: usize,
    failed: usize,
}

impl<'a> SymlinkTree<'a> {
    /// Links `dir_name` (a directory in `_books/`) under every facet value of `entry`.
    fn link_facets(&mut self, entry: &Entry, dir_name: &str) {
        let target = Path::new("..").join("..").join(BOOKS_DIR).join(dir_name);
        let link_name = safe_segment(&entry.readable_name());

        for definition in self.context.facets {
            let label_dir = self.context.output_root.join(safe_segment(&definition.label));
            for key in facet_keys(entry, definition.field) {
                let value_dir = label_dir.join(safe_segment(key));
                if let Err(e) = fs::create_dir_all(&value_dir) {
                    warn!(
                        "Failed to create facet directory '{}': {}",
                        path_to_string_lossy(&value_dir),
                        e
                    );
                    self.links.failed += 1;
                    continue;
                }
                self.place_link(&target, &value_dir, &link_name, dir_name);
            }
        }
    }

    /// Creates one link, falling back to `"<name> [<id>]"` when `<name>` is taken by another entry.
    fn place_link(&mut self, target: &Path, value_dir: &Path, link_name: &str, dir_name: &str) {
        let candidates = [
            value_dir.join(link_name),
            value_dir.join(safe_segment(&format!("{} [{}]", link_name, dir_name))),
        ];

        for link in candidates {
            match existing_target(&link) {
                Some(Some(current)) if current == target => {
                    self.links.existing += 1;
                    return;
                }
                Some(_) => continue,
                None => {}
            }
            match create_symlink(target, &link, true) {
                Ok(()) => {
                    debug!("Linked {}", path_to_string_lossy(&link));
                    self.links.created += 1;
                }
                Err(e) => {
                    warn!("Failed to create link '{}': {}", path_to_string_lossy(&link), e);
                    self.links.failed += 1;
                }
            }
            return;
        }

        warn!(
            "No free link name for '{}' in '{}'",
            dir_name,
            path_to_string_lossy(value_dir)
        );
        self.links.failed += 1;
    }
}

/// `None` when nothing exists at `path`, `Some(None)` for a non-link, else the link target.
fn existing_target(path: &Path) -> Option<Option<PathBuf>> {
    path.symlink_metadata().ok()?;
    Some(fs::read_link(path).ok())
}

impl<'a> Exporter<'a> for SymlinkTree<'a> {
    const KIND: ExportKind = ExportKind::SymlinkTree;

    fn new(context: ExportContext<'a>) -> Result<Self> {
        let books = EntryDirectories::create(context.output_root.join(BOOKS_DIR))?;
        Ok(SymlinkTree {
            context,
            books,
            links: LinkTally::default(),
        })
    }

    fn add_entry(&mut self, entry: &Entry) -> Result<&mut Self> {
        if let Some(dir_name) = self.books.write(&self.context, entry)? {
            self.link_facets(entry, &dir_name);
        }
        Ok(self)
    }

    fn finish(self, facets: FacetCounts) -> Result<ExportReport> {
        if self.context.create_index {
            write_index(&self.context, &self.books.entries, &facets)?;
        }

        let labels: Vec<&str> = facets.iter().map(|f| f.label.as_str()).collect();
        let manifest = ExportManifest::new(
            Self::KIND,
            self.books.entries.len(),
            format!(
                "{} entry directories under `{}/`, linked from {} facet directories ({}) as `<facet>/<value>/<title>`.",
                self.books.exported,
                BOOKS_DIR,
                facets.len(),
                labels.join(", ")
            ),
        );
        write_manifest(&self.context, &manifest)?;

        info!(
            "Symlink export finished: {} links created, {} already present, {} failed",
            self.links.created, self.links.existing, self.links.failed
        );
        Ok(self.books.into_report(manifest, facets))
    }
}
