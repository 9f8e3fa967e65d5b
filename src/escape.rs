//! Escaping for entry text that ends up in a rendered page.
//!
//! Two contexts matter: HTML bodies/attributes, handled by [`escape_html`], and
//! inline `<script>` data blocks, handled by [`encode_for_script`]. Entry data is
//! only ever put into a page through [`prepare_entries_for_embedding`], which
//! applies both.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::path_utils::HTML_TAG_REGEX;
use crate::types::DisplayEntry;

/// Maximum number of characters of a description kept for display.
pub const DESCRIPTION_LIMIT: usize = 500;

lazy_static! {
    static ref SCRIPT_CLOSE_REGEX: Regex = Regex::new(r"(?i)<(/script)").unwrap();
}

/// Escapes `& < > " '` as HTML entities.
///
/// # Examples
///
/// ```
/// use hondana::escape::escape_html;
///
/// assert_eq!(escape_html("<b>\"Tom\" & 'Jerry'</b>"),
///            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;/b&gt;");
/// assert_eq!(escape_html(""), "");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Serializes `value` to JSON that is safe to place verbatim inside `<script>`.
///
/// `</script` (any case), `<!--` and `-->` are rewritten with `\u003c`/`\u003e`
/// escapes. Those sequences can only occur inside JSON string literals, so the
/// result still parses to the same value.
///
/// # Examples
///
/// ```
/// use hondana::escape::encode_for_script;
///
/// let encoded = encode_for_script(&"</script><script>alert(1)</script>").unwrap();
/// assert!(!encoded.contains("</script>"));
/// ```
pub fn encode_for_script<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    let json = SCRIPT_CLOSE_REGEX.replace_all(&json, r"\u003c${1}");
    Ok(json.replace("<!--", r"\u003c!--").replace("-->", r"--\u003e"))
}

/// Removes anything that looks like an HTML tag.
pub fn strip_tags(text: &str) -> String {
    HTML_TAG_REGEX.replace_all(text, "").into_owned()
}

/// Cuts `text` to `limit` characters and appends `...` when it was longer.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let text = text.trim();
    if text.chars().count() > limit {
        let mut head: String = text.chars().take(limit).collect();
        head.push_str("...");
        head
    } else {
        text.to_string()
    }
}

/// Builds the display-safe copy of an entry used by the index page.
///
/// The description loses its markup and is shortened to [`DESCRIPTION_LIMIT`].
pub fn reduce_for_display(entry: &DisplayEntry) -> DisplayEntry {
    let mut reduced = entry.clone();
    reduced.entry.description =
        truncate_description(&strip_tags(&entry.entry.description), DESCRIPTION_LIMIT);
    reduced
}

/// The field subset of an entry exposed to page scripts. Every string is HTML-escaped.
#[derive(Debug, Serialize)]
struct EmbeddedEntry {
    id: String,
    entry_id: String,
    title: String,
    creators: Vec<String>,
    subjects: Vec<String>,
    language: String,
    date: String,
    publisher: String,
    description: String,
    cover_path: String,
    file_paths: Vec<String>,
    readable_name: String,
}

impl From<&DisplayEntry> for EmbeddedEntry {
    fn from(display: &DisplayEntry) -> Self {
        let entry = &display.entry;
        let escape_all =
            |values: &[String]| -> Vec<String> { values.iter().map(|v| escape_html(v)).collect() };
        Self {
            id: escape_html(entry.unique_id.as_deref().unwrap_or_default()),
            entry_id: escape_html(display.entry_id.as_deref().unwrap_or_default()),
            title: escape_html(&entry.title),
            creators: escape_all(&entry.creators),
            subjects: escape_all(&entry.subjects),
            language: escape_html(&entry.language),
            date: escape_html(&entry.date),
            publisher: escape_html(&entry.publisher),
            description: escape_html(&entry.description),
            cover_path: escape_html(entry.cover_path.as_deref().unwrap_or_default()),
            file_paths: escape_all(&entry.file_paths),
            readable_name: escape_html(&display.readable_name),
        }
    }
}

/// Produces the script-embeddable JSON payload for a list of entries.
///
/// This is the only sanctioned way to put entry data into a rendered page.
pub fn prepare_entries_for_embedding(entries: &[DisplayEntry]) -> Result<String> {
    let embedded: Vec<EmbeddedEntry> = entries.iter().map(EmbeddedEntry::from).collect();
    encode_for_script(&embedded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entry;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_html("日本語"), "日本語");
    }

    #[test]
    fn test_encode_for_script_neutralizes_breakouts() {
        let value = serde_json::json!({
            "a": "</script><script>alert(1)</script>",
            "b": "</SCRIPT >",
            "c": "<!-- hidden -->",
        });
        let encoded = encode_for_script(&value).unwrap();
        assert!(!encoded.to_ascii_lowercase().contains("</script"));
        assert!(!encoded.contains("<!--"));
        assert!(!encoded.contains("-->"));

        let decoded: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_strip_and_truncate_description() {
        assert_eq!(strip_tags("<p>Hello <em>world</em></p>"), "Hello world");
        assert_eq!(truncate_description("abcdef", 3), "abc...");
        assert_eq!(truncate_description("abc", 3), "abc");
    }

    #[test]
    fn test_reduce_for_display() {
        let mut entry = Entry::new("a1", "Foo");
        entry.description = format!("<p>{}</p>", "x".repeat(600));
        let reduced = reduce_for_display(&DisplayEntry::new(entry, Some("a1".into())));
        assert_eq!(reduced.entry.description.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(!reduced.entry.description.contains('<'));
    }

    #[test]
    fn test_prepare_entries_for_embedding_escapes_fields() {
        let mut entry = Entry::new("a1", "<img src=x onerror=alert(1)>");
        entry.creators = vec!["Tom & Jerry".to_string()];
        entry.description = "</script>".to_string();
        let payload =
            prepare_entries_for_embedding(&[DisplayEntry::new(entry, Some("a1".into()))]).unwrap();

        assert!(!payload.contains("<img"));
        assert!(!payload.contains("</script>"));
        assert!(payload.contains("Tom &amp; Jerry"));

        let decoded: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded[0]["entry_id"], "a1");
        assert_eq!(
            decoded[0]["readable_name"],
            "&lt;img src=x onerror=alert(1)&gt; - Tom &amp; Jerry"
        );
    }
}
