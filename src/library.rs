//! Library metadata loading/writing and file materialization.
//!
//! A library is a directory holding a `metadata.json` file (a JSON array of
//! entry objects) and the ebook/cover files those entries reference by paths
//! relative to the directory. This module reads and writes that file, prepares
//! output directories, and copies or links referenced files into an export.

use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::path_utils::{get_file_name_lossy, path_to_string_lossy};
use crate::types::{Entry, MaterializeOutcome};

/// Name of the metadata file inside a library root (and inside each exported entry directory).
pub const METADATA_FILE: &str = "metadata.json";
/// Page document of a Hugo bundle, written next to the entry's files.
pub const PAGE_FILE: &str = "index.md";
/// Names exporters write into every entry directory. Referenced files never take them.
pub const RESERVED_ENTRY_FILES: [&str; 2] = [METADATA_FILE, PAGE_FILE];

/// How referenced files are placed into an entry's output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialize {
    Copy,
    Symlink,
}

/// Handle on a library directory.
#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
}

impl Library {
    /// Creates a handle for the library rooted at `root`. Nothing is read yet.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Reads every entry from the library's metadata file.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Entry>)` - Entries in file order
    /// * `Err(Error::NotFound)` - The metadata file does not exist
    /// * `Err(Error::MalformedData)` - The file is not a JSON array of objects
    pub fn load(&self) -> Result<Vec<Entry>> {
        let path = self.metadata_path();
        let raw = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(format!(
                "Metadata file does not exist: {}",
                path_to_string_lossy(&path)
            )),
            _ => Error::Io(e),
        })?;

        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            Error::MalformedData(format!("{} is not valid JSON: {}", METADATA_FILE, e))
        })?;
        let serde_json::Value::Array(items) = value else {
            return Err(Error::MalformedData(format!(
                "{} must contain a JSON array of entries",
                METADATA_FILE
            )));
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                if !item.is_object() {
                    return Err(Error::MalformedData(format!(
                        "entry #{} in {} is not an object",
                        index, METADATA_FILE
                    )));
                }
                serde_json::from_value::<Entry>(item).map_err(|e| {
                    Error::MalformedData(format!("entry #{} could not be read: {}", index, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Loaded {} entries from {}",
            entries.len(),
            path_to_string_lossy(&path)
        );
        Ok(entries)
    }

    /// Writes `entries` back to the library's metadata file, replacing it.
    pub fn save(&self, entries: &[Entry]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_json(entries, &self.metadata_path())
    }

    /// Resolves a path stored in an entry against the library root.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Copies the entry's content files and cover into `dest_dir`, flattened to their base names.
    ///
    /// Missing sources and failed copies are logged and counted, never returned as errors.
    pub fn copy_entry_files(&self, entry: &Entry, dest_dir: &Path) -> MaterializeOutcome {
        self.materialize(entry, dest_dir, Materialize::Copy)
    }

    /// Links the entry's content files and cover into `dest_dir` by absolute path.
    ///
    /// Destinations that already exist are left untouched, so re-running is safe.
    pub fn symlink_entry_files(&self, entry: &Entry, dest_dir: &Path) -> MaterializeOutcome {
        self.materialize(entry, dest_dir, Materialize::Symlink)
    }

    /// Places every file the entry references into `dest_dir` using `mode`.
    pub fn materialize(&self, entry: &Entry, dest_dir: &Path, mode: Materialize) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();

        for relative in entry.referenced_paths() {
            let source = self.resolve(relative);
            if !source.is_file() {
                warn!(
                    "Skipping missing file '{}' referenced by '{}'",
                    relative, entry.title
                );
                outcome.missing += 1;
                continue;
            }
            let Some(file_name) = get_file_name_lossy(&source) else {
                warn!("Skipping file without a name: '{}'", relative);
                outcome.failed += 1;
                continue;
            };
            if RESERVED_ENTRY_FILES.contains(&file_name.as_str()) {
                warn!(
                    "Skipping '{}' referenced by '{}': the name is reserved for exported documents",
                    relative, entry.title
                );
                outcome.failed += 1;
                continue;
            }
            let destination = dest_dir.join(&file_name);

            let result = match mode {
                // A link left by an earlier symlink run would make the copy write into the source.
                Materialize::Copy => remove_symlink(&destination)
                    .and_then(|_| fs::copy(&source, &destination))
                    .map(|_| true),
                Materialize::Symlink => {
                    if destination.symlink_metadata().is_ok() {
                        Ok(false)
                    } else {
                        fs::canonicalize(&source)
                            .and_then(|target| create_symlink(&target, &destination, false))
                            .map(|_| true)
                    }
                }
            };

            match result {
                Ok(true) => {
                    debug!(
                        "{:?} '{}' -> '{}'",
                        mode,
                        relative,
                        path_to_string_lossy(&destination)
                    );
                    outcome.materialized += 1;
                }
                Ok(false) => outcome.already_present += 1,
                Err(e) => {
                    warn!(
                        "Failed to place '{}' into '{}': {}",
                        relative,
                        path_to_string_lossy(dest_dir),
                        e
                    );
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }
}

/// Creates (or re-creates) an output directory.
///
/// When `clean` is set and the directory exists, it is removed recursively first.
/// The directory and its parents are then created; existing directories are fine.
pub fn prepare_output(output_root: &Path, clean: bool) -> Result<()> {
    if clean && output_root.exists() {
        info!("Cleaning output directory {}", path_to_string_lossy(output_root));
        fs::remove_dir_all(output_root)?;
    }
    fs::create_dir_all(output_root)?;
    Ok(())
}

/// Serializes `data` as indented JSON. Non-ASCII text is written as-is.
pub fn write_json<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Checks that an export produced something: the directory exists and is not empty.
pub fn validate_output(output_root: &Path) -> Result<()> {
    if !output_root.is_dir() {
        return Err(Error::Validation(format!(
            "Output directory does not exist: {}",
            path_to_string_lossy(output_root)
        )));
    }
    if fs::read_dir(output_root)?.next().is_none() {
        return Err(Error::Validation(format!(
            "Output directory is empty: {}",
            path_to_string_lossy(output_root)
        )));
    }
    Ok(())
}

/// Removes `path` if it is a symbolic link. Returns whether a link was removed.
///
/// Regular files and missing paths are left alone.
pub fn remove_symlink(path: &Path) -> std::io::Result<bool> {
    match path.symlink_metadata() {
        Ok(meta) if meta.file_type().is_symlink() => {
            debug!("Replacing symlink {}", path_to_string_lossy(path));
            fs::remove_file(path)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Creates a symbolic link at `link` pointing to `target`.
///
/// `is_dir` selects the link flavour on Windows and is ignored elsewhere.
pub fn create_symlink(target: &Path, link: &Path, is_dir: bool) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let _ = is_dir;
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        if is_dir {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, link, is_dir);
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ))
    }
}
