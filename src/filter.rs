//! Searching and filtering entries.
//!
//! An [`EntryFilter`] narrows a collection before export. Every criterion is
//! optional, matching is case-insensitive, and all criteria that are set must
//! match for an entry to pass.

use serde::{Deserialize, Serialize};

use crate::facets::year_bucket;
use crate::types::Entry;

/// Case-insensitive criteria for selecting entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFilter {
    /// Substring searched in title, creators, subjects, publisher and description.
    pub text: Option<String>,
    /// Substring of any creator.
    pub creator: Option<String>,
    /// Exact subject, ignoring case.
    pub subject: Option<String>,
    /// Exact language code, ignoring case.
    pub language: Option<String>,
    /// Four-digit year, compared with the entry's year bucket.
    pub year: Option<String>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    /// True when no criterion is set (every entry matches).
    pub fn is_empty(&self) -> bool {
        [
            &self.text,
            &self.creator,
            &self.subject,
            &self.language,
            &self.year,
        ]
        .iter()
        .all(|c| criterion(c).is_none())
    }

    /// Checks `entry` against every criterion that is set.
    pub fn matches(&self, entry: &Entry) -> bool {
        if let Some(text) = criterion(&self.text) {
            let haystack = [&entry.title, &entry.publisher, &entry.description]
                .into_iter()
                .chain(entry.creators.iter())
                .chain(entry.subjects.iter());
            if !haystack.into_iter().any(|field| contains(field, &text)) {
                return false;
            }
        }

        if let Some(creator) = criterion(&self.creator) {
            if !entry.creators.iter().any(|c| contains(c, &creator)) {
                return false;
            }
        }

        if let Some(subject) = criterion(&self.subject) {
            if !entry
                .subjects
                .iter()
                .any(|s| s.trim().to_lowercase() == subject)
            {
                return false;
            }
        }

        if let Some(language) = criterion(&self.language) {
            if entry.language.trim().to_lowercase() != language {
                return false;
            }
        }

        if let Some(year) = criterion(&self.year) {
            if year_bucket(entry.date.trim()) != Some(year.as_str()) {
                return false;
            }
        }

        true
    }

    /// Keeps the entries that match, preserving order.
    pub fn apply(&self, entries: Vec<Entry>) -> Vec<Entry> {
        if self.is_empty() {
            return entries;
        }
        entries.into_iter().filter(|e| self.matches(e)).collect()
    }
}

/// Trimmed, lowercased criterion; blank criteria count as unset.
fn criterion(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains(field: &str, needle_lowercase: &str) -> bool {
    field.to_lowercase().contains(needle_lowercase)
}
