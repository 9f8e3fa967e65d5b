//! Path utilities for turning library text into safe file and directory names.
//!
//! This module provides the filename sanitizer used for entry directories, facet
//! value directories and symlink names, plus small helpers for lossy path-to-string
//! conversion.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

/// Default upper bound, in characters, for a sanitized name.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 255;

/// Marker appended to names that had to be shortened.
const ELLIPSIS: &str = "...";

lazy_static! {
    /// Matches anything that looks like an HTML tag (`<...>`).
    pub static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// Converts arbitrary title/author/id text into a filesystem-safe name.
///
/// The steps are applied in order:
/// 1. Substrings that look like HTML tags are removed.
/// 2. Each of `< > : " / \ | ? *` is replaced by `_`.
/// 3. Control characters (below U+0020) are dropped.
/// 4. Names longer than `max_length` characters are cut to `max_length - 3`
///    characters and suffixed with `...`.
/// 5. Leading and trailing whitespace is trimmed.
///
/// # Arguments
///
/// * `name` - The text to sanitize
/// * `max_length` - Maximum length of the result, in characters
///
/// # Returns
///
/// * `String` - The sanitized name, possibly empty
pub fn sanitize(name: &str, max_length: usize) -> String {
    let without_tags = HTML_TAG_REGEX.replace_all(name, "");

    let cleaned: String = without_tags
        .chars()
        .filter(|c| (*c as u32) >= 32)
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();

    let truncated = if cleaned.chars().count() > max_length {
        if max_length < ELLIPSIS.len() {
            cleaned.chars().take(max_length).collect()
        } else {
            let mut head: String = cleaned.chars().take(max_length - ELLIPSIS.len()).collect();
            head.push_str(ELLIPSIS);
            head
        }
    } else {
        cleaned
    };

    truncated.trim().to_string()
}

/// Sanitizes a filename using [`DEFAULT_MAX_NAME_LENGTH`].
///
/// # Arguments
///
/// * `filename` - The filename to sanitize
///
/// # Returns
///
/// * `String` - The sanitized filename
pub fn sanitize_filename(filename: &str) -> String {
    sanitize(filename, DEFAULT_MAX_NAME_LENGTH)
}

/// Turns text into a single path segment, used for entry ids, facet labels and values.
///
/// Sanitizes the text and prefixes names that would otherwise be empty or consist
/// only of dots (`.`, `..`), so the segment can never alias its parent directory.
///
/// # Arguments
///
/// * `text` - The entry id, label or value
///
/// # Returns
///
/// * `String` - A non-empty, single-segment name
pub fn safe_segment(text: &str) -> String {
    let name = sanitize_filename(text);
    if name.chars().all(|c| c == '.') {
        format!("_{name}")
    } else {
        name
    }
}

/// Gets the file name from a path with fallback to lossy conversion.
///
/// # Arguments
///
/// * `path` - The path to extract the file name from
///
/// # Returns
///
/// * `Option<String>` - The file name, or `None` for paths such as `..` or `/`
pub fn get_file_name_lossy(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
}

/// Converts a path to a string with fallback to lossy conversion.
pub fn path_to_string_lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
