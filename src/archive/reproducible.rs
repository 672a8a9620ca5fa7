//! Reproducible archive output.
//!
//! Default zip tooling stamps entries with the local build machine's clock
//! and whatever permission bits the staged files happened to have, which
//! breaks bit-for-bit reproducibility of release artifacts. Every entry we
//! write is therefore pinned to a sentinel timestamp and one of exactly two
//! permission profiles, and [`normalize_archive`] re-applies the same
//! attributes to archives produced elsewhere.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

use super::{normalize_path, write_atomic};

/// Canonical permission bits for regular-file entries (`rw-r--r--`).
pub const FILE_MODE: u32 = 0o644;

/// Canonical permission bits for directory entries (`rwxr-xr-x`).
pub const DIR_MODE: u32 = 0o755;

/// The sentinel modification time stamped on every entry.
///
/// 1980-02-01, not the DOS minimum of 1980-01-01: a negative timezone offset
/// applied by a zip implementation must not be able to underflow the format's
/// representable range. (Same constant Gradle uses, see
/// gradle/gradle ZipEntryConstants.)
pub fn sentinel_epoch() -> DateTime {
    DateTime::from_date_and_time(1980, 2, 1, 0, 0, 0).unwrap_or_default()
}

/// Write options for a regular-file entry with the given compression method.
pub fn file_options(method: CompressionMethod) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(method)
        .last_modified_time(sentinel_epoch())
        .unix_permissions(FILE_MODE)
}

/// Write options for a directory entry.
pub fn dir_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .last_modified_time(sentinel_epoch())
        .unix_permissions(DIR_MODE)
}

/// Rewrite a finished archive in place so every entry carries the sentinel
/// timestamp and canonical permissions.
///
/// Entry order, content, and compression method are preserved from the
/// input. The archive is staged and atomically replaced; running this on an
/// already-normalized archive is a byte-identical fixed point.
pub fn normalize_archive(path: &Path) -> Result<()> {
    let bytes = fs::read(path)
        .with_context(|| format!("reading archive '{}'", path.display()))?;
    let normalized = normalize_bytes(&bytes)
        .with_context(|| format!("normalizing archive '{}'", path.display()))?;
    write_atomic(path, &normalized)
}

fn normalize_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("parsing zip central directory")?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .with_context(|| format!("reading zip entry #{index}"))?;
        let name = normalize_path(file.name());
        if name.is_empty() {
            continue;
        }
        if file.is_dir() {
            writer
                .add_directory(name.clone(), dir_options())
                .with_context(|| format!("rewriting zip directory '{name}'"))?;
        } else {
            let method = file.compression();
            let mut contents = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut contents)
                .with_context(|| format!("decompressing zip entry '{name}'"))?;
            writer
                .start_file(name.clone(), file_options(method))
                .with_context(|| format!("rewriting zip entry '{name}'"))?;
            writer
                .write_all(&contents)
                .with_context(|| format!("rewriting zip entry '{name}'"))?;
        }
    }

    let cursor = writer.finish().context("finishing zip archive")?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Build a zip the way careless tooling would: wall-clock timestamps and
    /// odd permission bits.
    fn messy_zip() -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let stamp = DateTime::from_date_and_time(2024, 6, 15, 12, 30, 45).unwrap();
        writer
            .add_directory(
                "assets/",
                SimpleFileOptions::default()
                    .last_modified_time(stamp)
                    .unix_permissions(0o777),
            )
            .unwrap();
        writer
            .start_file(
                "assets/data.txt",
                SimpleFileOptions::default()
                    .last_modified_time(stamp)
                    .unix_permissions(0o600),
            )
            .unwrap();
        writer.write_all(b"payload").unwrap();
        writer
            .start_file(
                "stored.bin",
                SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Stored)
                    .last_modified_time(stamp)
                    .unix_permissions(0o755),
            )
            .unwrap();
        writer.write_all(b"raw").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_normalization_pins_attributes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.jar");
        fs::write(&path, messy_zip()).unwrap();

        normalize_archive(&path).unwrap();

        let bytes = fs::read(&path).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        for index in 0..archive.len() {
            let file = archive.by_index(index).unwrap();
            let stamp = file.last_modified().expect("entry timestamp");
            assert_eq!(
                (stamp.year(), stamp.month(), stamp.day()),
                (1980, 2, 1),
                "entry '{}' not pinned to the sentinel epoch",
                file.name()
            );
            let mode = file.unix_mode().expect("unix mode") & 0o777;
            if file.is_dir() {
                assert_eq!(mode, DIR_MODE, "directory '{}'", file.name());
            } else {
                assert_eq!(mode, FILE_MODE, "file '{}'", file.name());
            }
        }
    }

    #[test]
    fn test_normalization_preserves_content_and_method() {
        let normalized = normalize_bytes(&messy_zip()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(normalized)).unwrap();

        // entry order preserved: assets/, assets/data.txt, stored.bin
        let first = archive.by_index(0).unwrap();
        assert!(first.is_dir());
        drop(first);

        let mut data = archive.by_index(1).unwrap();
        assert_eq!(data.name(), "assets/data.txt");
        assert_eq!(data.compression(), CompressionMethod::Deflated);
        let mut contents = String::new();
        data.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "payload");
        drop(data);

        let raw = archive.by_index(2).unwrap();
        assert_eq!(raw.name(), "stored.bin");
        assert_eq!(raw.compression(), CompressionMethod::Stored);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_bytes(&messy_zip()).unwrap();
        let twice = normalize_bytes(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_tree_output_is_already_normal() {
        use crate::archive::ArchiveTree;

        let mut tree = ArchiveTree::new();
        tree.write("a/b.txt", b"content".to_vec());
        let bytes = tree.to_bytes().unwrap();
        assert_eq!(normalize_bytes(&bytes).unwrap(), bytes);
    }
}
