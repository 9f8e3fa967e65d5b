use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::escape::strip_tags;
use crate::exporter::{EntryDirectories, ExportContext, Exporter, write_manifest};
use crate::facets::{FacetCounts, year_bucket};
use crate::library::{PAGE_FILE, remove_symlink, write_json};
use crate::path_utils::get_file_name_lossy;
use crate::types::{Entry, ExportKind, ExportManifest, ExportReport};

/// Directory of the page bundles, relative to the output root.
pub const CONTENT_DIR: &str = "content/books";
/// Facet counts for use from Hugo templates, relative to the output root.
pub const FACETS_DATA_FILE: &str = "data/facets.json";
/// Site configuration written to the output root.
pub const SITE_CONFIG_FILE: &str = "hugo.toml";

const FRONT_MATTER_DELIMITER: &str = "+++";

/// Taxonomy (singular → plural) declared in the site configuration.
const TAXONOMIES: [(&str, &str); 4] = [
    ("author", "authors"),
    ("subject", "subjects"),
    ("publisher", "publishers"),
    ("language", "languages"),
];

/// Exporter for a Hugo content tree.
///
/// Each entry with an id becomes a leaf bundle `content/books/<id>/` holding
/// `index.md` (TOML front matter plus the plain-text description), `metadata.json`
/// and the entry's files. The HTML index is not written; Hugo renders its own
/// list pages from the taxonomies.
pub struct Hugo<'a> {
    context: ExportContext<'a>,
    bundles: EntryDirectories,
}

#[derive(Serialize)]
struct FrontMatter<'e> {
    title: &'e str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    authors: &'e [String],
    subjects: &'e [String],
    publishers: Vec<&'e str>,
    languages: Vec<&'e str>,
    params: PageParams<'e>,
}

#[derive(Serialize)]
struct PageParams<'e> {
    unique_id: &'e str,
    readable_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover: Option<String>,
    files: Vec<String>,
    identifiers: &'e BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SiteConfig<'a> {
    title: &'a str,
    taxonomies: BTreeMap<&'static str, &'static str>,
}

impl<'e> FrontMatter<'e> {
    fn new(entry: &'e Entry, unique_id: &'e str) -> Self {
        let non_empty = |value: &'e str| {
            let value = value.trim();
            if value.is_empty() { vec![] } else { vec![value] }
        };
        FrontMatter {
            title: &entry.title,
            date: front_matter_date(&entry.date),
            authors: &entry.creators,
            subjects: &entry.subjects,
            publishers: non_empty(&entry.publisher),
            languages: non_empty(&entry.language),
            params: PageParams {
                unique_id,
                readable_name: entry.readable_name(),
                cover: entry.cover_path.as_deref().and_then(bundle_file_name),
                files: entry
                    .file_paths
                    .iter()
                    .filter_map(|p| bundle_file_name(p))
                    .collect(),
                identifiers: &entry.identifiers,
            },
        }
    }
}

/// Name a referenced file has inside the bundle (files are flattened).
fn bundle_file_name(relative: &str) -> Option<String> {
    if relative.trim().is_empty() {
        return None;
    }
    get_file_name_lossy(Path::new(relative))
}

/// `YYYY-MM-DD` for dates starting with a calendar date, `YYYY-01-01` for a leading year.
fn front_matter_date(date: &str) -> Option<String> {
    let date = date.trim();
    if let Some(day) = date
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    {
        return Some(day.format("%Y-%m-%d").to_string());
    }
    year_bucket(date).map(|year| format!("{}-01-01", year))
}

/// Renders the complete `index.md` of a bundle.
fn page_document(entry: &Entry, unique_id: &str) -> Result<String> {
    let front_matter = toml::to_string(&FrontMatter::new(entry, unique_id))?;
    let body = strip_tags(&entry.description);
    Ok(format!(
        "{delim}\n{front_matter}{delim}\n\n{body}\n",
        delim = FRONT_MATTER_DELIMITER,
        body = body.trim()
    ))
}

impl<'a> Exporter<'a> for Hugo<'a> {
    const KIND: ExportKind = ExportKind::Hugo;

    fn new(context: ExportContext<'a>) -> Result<Self> {
        let bundles = EntryDirectories::create(context.output_root.join(CONTENT_DIR))?;
        Ok(Hugo { context, bundles })
    }

    fn add_entry(&mut self, entry: &Entry) -> Result<&mut Self> {
        if let (Some(dir_name), Some(id)) = (self.bundles.write(&self.context, entry)?, entry.id()) {
            let page = page_document(entry, id)?;
            let page_path = self.bundles.root().join(dir_name).join(PAGE_FILE);
            remove_symlink(&page_path)?;
            fs::write(page_path, page)?;
        }
        Ok(self)
    }

    fn finish(self, facets: FacetCounts) -> Result<ExportReport> {
        let root = self.context.output_root;

        let data_file = root.join(FACETS_DATA_FILE);
        if let Some(parent) = data_file.parent() {
            fs::create_dir_all(parent)?;
        }
        write_json(&facets, &data_file)?;

        let site = SiteConfig {
            title: self.context.title,
            taxonomies: TAXONOMIES.into_iter().collect(),
        };
        fs::write(root.join(SITE_CONFIG_FILE), toml::to_string(&site)?)?;

        let manifest = ExportManifest::new(
            Self::KIND,
            self.bundles.entries.len(),
            format!(
                "{} page bundles under `{}/`; facet counts for {} facets in `{}`.",
                self.bundles.exported,
                CONTENT_DIR,
                facets.len(),
                FACETS_DATA_FILE
            ),
        );
        write_manifest(&self.context, &manifest)?;

        info!(
            "Hugo export finished: {} bundles, {} entries without id",
            self.bundles.exported, self.bundles.without_id
        );
        Ok(self.bundles.into_report(manifest, facets))
    }
}
