//! Unit tests for core Hondana functionality.
//!
//! Tests the library loader, file materialization and output helpers in isolation
//! without running a full export.

use hondana::error::{Error, Result};
use hondana::library::{prepare_output, validate_output, write_json};
use hondana::prelude::*;
use std::fs;

mod common;
use common::{list_dir, read_to_string, setup_test_dirs, write_file, write_sample_library};

#[test]
fn test_load_missing_metadata_is_not_found() {
    let dirs = setup_test_dirs("load_missing");
    let result = Library::open(&dirs.library).load();
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[test]
fn test_load_rejects_non_array_and_non_objects() -> Result<()> {
    let dirs = setup_test_dirs("load_malformed");
    let metadata = dirs.library.join("metadata.json");

    write_file(&metadata, r#"{"title": "not a list"}"#)?;
    assert!(matches!(
        Library::open(&dirs.library).load(),
        Err(Error::MalformedData(_))
    ));

    write_file(&metadata, r#"[{"title": "ok"}, 42]"#)?;
    let err = Library::open(&dirs.library).load().unwrap_err();
    assert!(matches!(err, Error::MalformedData(_)));
    assert!(err.to_string().contains("#1"));

    write_file(&metadata, "[not json")?;
    assert!(matches!(
        Library::open(&dirs.library).load(),
        Err(Error::MalformedData(_))
    ));
    Ok(())
}

#[test]
fn test_load_normalizes_loose_shapes() -> Result<()> {
    let dirs = setup_test_dirs("load_loose");
    write_file(
        &dirs.library.join("metadata.json"),
        r#"[
            {
                "unique_id": 7,
                "title": "Numbers",
                "creators": "Solo Author",
                "subjects": null,
                "date": 2001,
                "identifiers": {"isbn": 9780000000000},
                "rating": 5
            }
        ]"#,
    )?;

    let entries = Library::open(&dirs.library).load()?;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.id(), Some("7"));
    assert_eq!(entry.creators, vec!["Solo Author".to_string()]);
    assert!(entry.subjects.is_empty());
    assert_eq!(entry.date, "2001");
    assert_eq!(
        entry.identifiers.get("isbn").map(String::as_str),
        Some("9780000000000")
    );
    assert_eq!(entry.extra.get("rating"), Some(&serde_json::json!(5)));
    Ok(())
}

#[test]
fn test_save_then_load_keeps_entries() -> Result<()> {
    let dirs = setup_test_dirs("save_load");
    let entries = write_sample_library(&dirs.library)?;
    let loaded = Library::open(&dirs.library).load()?;
    assert_eq!(loaded, entries);
    Ok(())
}

#[test]
fn test_write_json_is_pretty_and_keeps_unicode() -> Result<()> {
    let dirs = setup_test_dirs("write_json");
    let path = dirs.base.join("out.json");
    write_json(&serde_json::json!({"title": "本棚"}), &path)?;
    let text = read_to_string(&path);
    assert!(text.contains("本棚"));
    assert!(text.contains("\n  \"title\""));
    Ok(())
}

#[test]
fn test_copy_entry_files_flattens_and_skips_missing() -> Result<()> {
    let dirs = setup_test_dirs("copy_files");
    let entries = write_sample_library(&dirs.library)?;
    let library = Library::open(&dirs.library);
    let dest = dirs.base.join("dest");
    fs::create_dir_all(&dest)?;

    let outcome = library.copy_entry_files(&entries[0], &dest);
    assert_eq!(outcome.materialized, 2);
    assert_eq!(outcome.missing, 0);
    assert_eq!(list_dir(&dest), vec!["foo.epub", "foo.jpg"]);
    assert_eq!(read_to_string(&dest.join("foo.epub")), "epub bytes");

    let outcome = library.copy_entry_files(&entries[1], &dest);
    assert_eq!(outcome.materialized, 0);
    assert_eq!(outcome.missing, 1);
    assert!(!dest.join("bar.pdf").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlink_entry_files_is_idempotent() -> Result<()> {
    let dirs = setup_test_dirs("symlink_files");
    let entries = write_sample_library(&dirs.library)?;
    let library = Library::open(&dirs.library);
    let dest = dirs.base.join("dest");
    fs::create_dir_all(&dest)?;

    let first = library.symlink_entry_files(&entries[0], &dest);
    assert_eq!(first.materialized, 2);

    let link = dest.join("foo.epub");
    let target = fs::read_link(&link)?;
    assert!(target.is_absolute());
    assert_eq!(read_to_string(&link), "epub bytes");

    let second = library.symlink_entry_files(&entries[0], &dest);
    assert_eq!(second.materialized, 0);
    assert_eq!(second.already_present, 2);
    assert_eq!(list_dir(&dest), vec!["foo.epub", "foo.jpg"]);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_materialize_skips_reserved_names() -> Result<()> {
    let dirs = setup_test_dirs("reserved_names");
    write_file(&dirs.library.join("extras/metadata.json"), "original")?;
    write_file(&dirs.library.join("extras/index.md"), "notes")?;
    let mut entry = Entry::new("x1", "Extras");
    entry.file_paths = vec![
        "extras/metadata.json".to_string(),
        "extras/index.md".to_string(),
    ];
    let library = Library::open(&dirs.library);

    let linked = dirs.base.join("linked");
    fs::create_dir_all(&linked)?;
    let outcome = library.symlink_entry_files(&entry, &linked);
    assert_eq!(outcome.failed, 2);
    assert_eq!(outcome.materialized, 0);
    assert!(list_dir(&linked).is_empty());

    let copied = dirs.base.join("copied");
    fs::create_dir_all(&copied)?;
    let outcome = library.copy_entry_files(&entry, &copied);
    assert_eq!(outcome.failed, 2);
    assert!(list_dir(&copied).is_empty());

    assert_eq!(read_to_string(&dirs.library.join("extras/metadata.json")), "original");
    assert_eq!(read_to_string(&dirs.library.join("extras/index.md")), "notes");
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_copy_replaces_existing_symlink() -> Result<()> {
    let dirs = setup_test_dirs("copy_replaces_link");
    let entries = write_sample_library(&dirs.library)?;
    let library = Library::open(&dirs.library);
    let dest = dirs.base.join("dest");
    fs::create_dir_all(&dest)?;

    library.symlink_entry_files(&entries[0], &dest);
    let outcome = library.copy_entry_files(&entries[0], &dest);
    assert_eq!(outcome.materialized, 2);

    let placed = dest.join("foo.epub");
    assert!(!fs::symlink_metadata(&placed)?.file_type().is_symlink());
    assert_eq!(read_to_string(&placed), "epub bytes");
    assert_eq!(read_to_string(&dirs.library.join("books/foo.epub")), "epub bytes");
    Ok(())
}

#[test]
fn test_prepare_output_cleans_when_asked() -> Result<()> {
    let dirs = setup_test_dirs("prepare_output");
    let stale = dirs.output.join("stale.txt");
    write_file(&stale, "old")?;

    prepare_output(&dirs.output, false)?;
    assert!(stale.exists());

    prepare_output(&dirs.output, true)?;
    assert!(dirs.output.is_dir());
    assert!(!stale.exists());

    let nested = dirs.base.join("a/b/c");
    prepare_output(&nested, true)?;
    assert!(nested.is_dir());
    Ok(())
}

#[test]
fn test_validate_output() -> Result<()> {
    let dirs = setup_test_dirs("validate_output");
    assert!(matches!(
        validate_output(&dirs.output),
        Err(Error::Validation(_))
    ));

    fs::create_dir_all(&dirs.output)?;
    assert!(matches!(
        validate_output(&dirs.output),
        Err(Error::Validation(_))
    ));

    write_file(&dirs.output.join("README.md"), "# x")?;
    validate_output(&dirs.output)?;
    Ok(())
}

#[test]
fn test_hondana_config_preflight_check() -> Result<()> {
    let dirs = setup_test_dirs("preflight_check");

    let config = HondanaConfig::builder()
        .library_path(dirs.library.clone())
        .output_path(dirs.output.clone())
        .build()?;
    assert!(config.preflight_check().is_ok());

    let config = HondanaConfig::builder()
        .output_path(dirs.output.clone())
        .build()?;
    let result = config.preflight_check();
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("`library_path` must be set")
    );

    let file = dirs.base.join("file.txt");
    write_file(&file, "x")?;
    let config = HondanaConfig::builder()
        .library_path(file)
        .output_path(dirs.output.clone())
        .build()?;
    assert!(matches!(
        config.preflight_check(),
        Err(Error::InvalidPath(_, _))
    ));
    Ok(())
}

#[test]
fn test_preflight_refuses_to_clean_the_library() -> Result<()> {
    let dirs = setup_test_dirs("preflight_guard");

    let config = HondanaConfig::builder()
        .library_path(dirs.library.clone())
        .output_path(dirs.base.clone())
        .build()?;
    assert!(matches!(
        config.preflight_check(),
        Err(Error::InvalidPath(_, _))
    ));

    let config = HondanaConfig::builder()
        .library_path(dirs.library.clone())
        .output_path(dirs.base.clone())
        .clean(false)
        .build()?;
    assert!(config.preflight_check().is_ok());
    Ok(())
}

#[test]
fn test_hondana_config_builder_validation() {
    let result = HondanaConfig::builder()
        .facets(vec![
            FacetDefinition::new("Who", FacetField::Creators),
            FacetDefinition::new("Who", FacetField::Publisher),
        ])
        .build();
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Duplicate facet label")
    );

    let result = HondanaConfig::builder().title("   ").build();
    assert!(result.is_err());

    let result = HondanaConfig::builder()
        .facets(vec![FacetDefinition::new("_books", FacetField::Subjects)])
        .build();
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("collides with the output name '_books'")
    );
}
