//! Common test utilities and constants for the Hondana crate.
//!
//! Provides functions for setting up scratch directories, writing sample
//! libraries, and inspecting export output.

use hondana::error::Result;
use hondana::{Entry, Library};
use rand::{Rng, distributions::Alphanumeric};
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
pub const TEST_TMP_DIR: &str = "tests/tmp";

/// Scratch directories for one test.
#[allow(dead_code)]
pub struct TestDirs {
    pub base: PathBuf,
    pub library: PathBuf,
    pub output: PathBuf,
}

/// Creates a unique, empty test directory with `library/` inside it.
/// `output/` is not created so exports start from a missing directory.
#[allow(dead_code)]
pub fn setup_test_dirs(sub_path: &str) -> TestDirs {
    let rand_string: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    let unique_sub_path = format!("{}-{}", sub_path, rand_string);
    let base = PathBuf::from(TEST_TMP_DIR).join(unique_sub_path);
    if base.exists() {
        fs::remove_dir_all(&base).unwrap();
    }
    let library = base.join("library");
    let output = base.join("output");
    fs::create_dir_all(&library).unwrap();

    TestDirs {
        base,
        library,
        output,
    }
}

/// Writes `contents` to `path`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// Two books with ids and files on disk, plus one without an id.
///
/// - `a1`: "Foo" by A, subjects Math and CS, English, 2020, `books/foo.epub` (present)
/// - `b2`: "Bar" by A and B, subject Math, English, 1999, `books/bar.pdf` (missing)
/// - no id: "Loose Leaf" by C, French
#[allow(dead_code)]
pub fn sample_entries() -> Vec<Entry> {
    let mut foo = Entry::new("a1", "Foo");
    foo.creators = vec!["A".to_string()];
    foo.subjects = vec!["Math".to_string(), "CS".to_string()];
    foo.language = "en".to_string();
    foo.publisher = "Acme".to_string();
    foo.date = "2020-03-01".to_string();
    foo.description = "<p>A book about <b>foo</b>.</p>".to_string();
    foo.file_paths = vec!["books/foo.epub".to_string()];
    foo.cover_path = Some("covers/foo.jpg".to_string());

    let mut bar = Entry::new("b2", "Bar");
    bar.creators = vec!["A".to_string(), "B".to_string()];
    bar.subjects = vec!["Math".to_string()];
    bar.language = "en".to_string();
    bar.date = "1999".to_string();
    bar.file_paths = vec!["books/bar.pdf".to_string()];

    let mut loose = Entry::new("", "Loose Leaf");
    loose.unique_id = None;
    loose.creators = vec!["C".to_string()];
    loose.language = "fr".to_string();

    vec![foo, bar, loose]
}

/// Writes [`sample_entries`] to `library/metadata.json` along with the files that exist.
#[allow(dead_code)]
pub fn write_sample_library(library: &Path) -> Result<Vec<Entry>> {
    let entries = sample_entries();
    Library::open(library).save(&entries)?;
    write_file(&library.join("books/foo.epub"), "epub bytes")?;
    write_file(&library.join("covers/foo.jpg"), "jpeg bytes")?;
    Ok(entries)
}

/// Reads a file into a string, panicking with the path on failure.
#[allow(dead_code)]
pub fn read_to_string(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e))
}

/// Names of the direct children of `dir`, sorted.
#[allow(dead_code)]
pub fn list_dir(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
