//! Core data types, enums, and reports for the Hondana export library.
//!
//! This module defines the fundamental data structures used throughout Hondana:
//! - The library record (`Entry`) and its display wrapper (`DisplayEntry`)
//! - Facet configuration (`FacetField`, `FacetDefinition`)
//! - Reporting types (`ExportManifest`, `ExportReport`, `MaterializeOutcome`)
//! - The export variant selector (`ExportKind`)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::facets::FacetCounts;

/// One book's metadata record, as stored in a library's `metadata.json`.
///
/// The shape is normalized while deserializing: list fields accept either a
/// single string or a list, scalar fields accept strings, numbers, booleans or
/// `null`. Keys this struct does not model are kept in [`Entry::extra`] so that
/// re-serializing an entry preserves them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Entry {
    #[serde(
        deserialize_with = "de::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub unique_id: Option<String>,
    #[serde(deserialize_with = "de::string")]
    pub title: String,
    #[serde(deserialize_with = "de::string_list")]
    pub creators: Vec<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub subjects: Vec<String>,
    #[serde(deserialize_with = "de::string")]
    pub publisher: String,
    #[serde(deserialize_with = "de::string")]
    pub language: String,
    #[serde(deserialize_with = "de::string")]
    pub date: String,
    #[serde(deserialize_with = "de::string")]
    pub description: String,
    #[serde(
        deserialize_with = "de::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub cover_path: Option<String>,
    #[serde(deserialize_with = "de::string_list")]
    pub file_paths: Vec<String>,
    #[serde(deserialize_with = "de::string_map")]
    pub identifiers: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Entry {
    /// Creates an entry with the given id and title and every other field empty.
    pub fn new(unique_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            unique_id: Some(unique_id.into()),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Returns the id if it is present and non-empty.
    pub fn id(&self) -> Option<&str> {
        self.unique_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Title plus the first creator, with "et al." when there are several.
    pub fn readable_name(&self) -> String {
        match self.creators.as_slice() {
            [] => self.title.clone(),
            [only] => format!("{} - {}", self.title, only),
            [first, ..] => format!("{} - {} et al.", self.title, first),
        }
    }

    /// Every relative path the entry references: content files first, then the cover.
    pub fn referenced_paths(&self) -> impl Iterator<Item = &str> {
        self.file_paths
            .iter()
            .map(String::as_str)
            .chain(self.cover_path.as_deref())
            .filter(|p| !p.trim().is_empty())
    }
}

/// An [`Entry`] together with the display-only fields the index renderer needs.
///
/// These fields are derived during an export and never written back to the library.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayEntry {
    #[serde(flatten)]
    pub entry: Entry,
    /// Sanitized directory name under `_books/`, absent for entries without an id.
    pub entry_id: Option<String>,
    pub readable_name: String,
}

impl DisplayEntry {
    pub fn new(entry: Entry, entry_id: Option<String>) -> Self {
        let readable_name = entry.readable_name();
        Self {
            entry,
            entry_id,
            readable_name,
        }
    }
}

/// The entry field a facet aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetField {
    Subjects,
    Creators,
    Publisher,
    Language,
    /// Publication date, bucketed by its leading four-digit year.
    Date,
}

impl FacetField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetField::Subjects => "subjects",
            FacetField::Creators => "creators",
            FacetField::Publisher => "publisher",
            FacetField::Language => "language",
            FacetField::Date => "date",
        }
    }

    /// Raw values of this field on `entry`; scalar fields yield at most one value.
    pub fn values<'e>(&self, entry: &'e Entry) -> Vec<&'e str> {
        let values: Vec<&str> = match self {
            FacetField::Subjects => entry.subjects.iter().map(String::as_str).collect(),
            FacetField::Creators => entry.creators.iter().map(String::as_str).collect(),
            FacetField::Publisher => vec![entry.publisher.as_str()],
            FacetField::Language => vec![entry.language.as_str()],
            FacetField::Date => vec![entry.date.as_str()],
        };
        values.into_iter().filter(|v| !v.is_empty()).collect()
    }
}

impl fmt::Display for FacetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacetField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "subjects" => Ok(FacetField::Subjects),
            "creators" => Ok(FacetField::Creators),
            "publisher" => Ok(FacetField::Publisher),
            "language" => Ok(FacetField::Language),
            "date" => Ok(FacetField::Date),
            other => Err(Error::Other(format!("Unknown facet field: {other}"))),
        }
    }
}

/// Maps a display label to the entry field it aggregates (e.g. "Authors" → `creators`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetDefinition {
    pub label: String,
    pub field: FacetField,
}

impl FacetDefinition {
    pub fn new(label: impl Into<String>, field: FacetField) -> Self {
        Self {
            label: label.into(),
            field,
        }
    }

    /// Subjects, Authors, Publishers and Languages, in that display order.
    pub fn defaults() -> Vec<FacetDefinition> {
        vec![
            FacetDefinition::new("Subjects", FacetField::Subjects),
            FacetDefinition::new("Authors", FacetField::Creators),
            FacetDefinition::new("Publishers", FacetField::Publisher),
            FacetDefinition::new("Languages", FacetField::Language),
        ]
    }
}

/// Selects which exporter an export run uses.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    /// `_books/` entry directories plus a faceted `index.html`.
    #[default]
    FacetedHtml,
    /// `_books/` entry directories plus `<facet>/<value>/<book>` symlinks.
    SymlinkTree,
    /// Hugo page bundles under `content/books/`.
    Hugo,
}

impl ExportKind {
    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::FacetedHtml => "Multi-Facet HTML",
            ExportKind::SymlinkTree => "Symlink DAG",
            ExportKind::Hugo => "Hugo",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Summary written alongside an export as `README.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub total_entries: usize,
    pub exported_at: DateTime<Utc>,
    pub export_kind: String,
    /// One-line, human-readable description of the output layout.
    pub structure: String,
}

impl ExportManifest {
    pub fn new(kind: ExportKind, total_entries: usize, structure: impl Into<String>) -> Self {
        Self {
            total_entries,
            exported_at: Utc::now(),
            export_kind: kind.label().to_string(),
            structure: structure.into(),
        }
    }

    /// Renders the manifest as the markdown document written to `README.md`.
    pub fn to_markdown(&self, title: &str) -> String {
        format!(
            "# {title}\n\n\
             - **Total entries**: {}\n\
             - **Exported at**: {}\n\
             - **Export type**: {}\n\n\
             ## Structure\n\n{}\n",
            self.total_entries,
            self.exported_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.export_kind,
            self.structure,
        )
    }
}

/// Counts of files handled while materializing one or more entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOutcome {
    /// Files copied or linked into the destination.
    pub materialized: usize,
    /// Links (or files) already present from a previous run.
    pub already_present: usize,
    /// Referenced files absent from the library.
    pub missing: usize,
    /// Files present in the library that could not be copied or linked.
    pub failed: usize,
}

impl std::ops::AddAssign for MaterializeOutcome {
    fn add_assign(&mut self, other: Self) {
        self.materialized += other.materialized;
        self.already_present += other.already_present;
        self.missing += other.missing;
        self.failed += other.failed;
    }
}

/// Outcome of a complete export run.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub manifest: ExportManifest,
    pub facets: FacetCounts,
    /// Entries that received their own output directory.
    pub entries_exported: usize,
    /// Entries without a `unique_id`, kept in facets and the index only.
    pub entries_without_id: usize,
    pub files: MaterializeOutcome,
}

/// Lenient deserializers used to normalize entry fields at the ingestion boundary.
mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn scalar_to_string(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            // Nested structures have no sensible string form for these fields.
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub(super) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_to_string(Value::deserialize(d)?).unwrap_or_default())
    }

    pub(super) fn optional_string<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(scalar_to_string(Value::deserialize(d)?).filter(|s| !s.is_empty()))
    }

    pub(super) fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let list: Vec<String> = match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
            other => scalar_to_string(other).into_iter().collect(),
        };
        Ok(list.into_iter().filter(|s| !s.is_empty()).collect())
    }

    pub(super) fn string_map<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Object(map) => map
                .into_iter()
                .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
                .collect(),
            _ => BTreeMap::new(),
        })
    }
}
