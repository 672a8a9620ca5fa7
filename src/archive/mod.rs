//! In-memory archive model for jar/zip assembly.
//!
//! Every assembly step works on an [`ArchiveTree`]: the full entry tree of a
//! zip archive held in memory, addressed by slash-separated relative paths.
//! Trees are opened from disk, mutated through the operations in [`ops`], and
//! written back with normalized entry attributes so that output archives are
//! byte-for-byte reproducible (see [`reproducible`]).

use std::collections::BTreeMap;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

pub mod ops;
pub mod reproducible;

/// A single archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Directory,
    File(FileEntry),
}

/// Contents of a regular-file entry.
///
/// The compression method is carried along so rewrites preserve how the
/// original archive stored the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub bytes: Vec<u8>,
    pub method: CompressionMethod,
}

/// The full entry tree of one archive.
///
/// Entries are kept in a sorted map, which makes serialization order
/// deterministic without a separate sorting pass.
#[derive(Debug, Clone, Default)]
pub struct ArchiveTree {
    entries: BTreeMap<String, Entry>,
}

/// Normalize an entry path: forward slashes only, no leading or trailing
/// separator. Some zip writers emit backslash-separated names.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

fn join_paths(base: &str, relative: &str) -> String {
    if base.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{relative}")
    }
}

impl ArchiveTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an archive from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading archive '{}'", path.display()))?;
        Self::from_bytes(&bytes)
            .with_context(|| format!("opening archive '{}'", path.display()))
    }

    /// Parse an archive from a byte buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).context("parsing zip central directory")?;
        let mut tree = Self::new();
        for index in 0..archive.len() {
            let mut file = archive
                .by_index(index)
                .with_context(|| format!("reading zip entry #{index}"))?;
            let name = normalize_path(file.name());
            if name.is_empty() {
                continue;
            }
            if file.is_dir() {
                tree.create_dirs(&name);
            } else {
                let method = file.compression();
                let mut bytes = Vec::with_capacity(file.size() as usize);
                file.read_to_end(&mut bytes)
                    .with_context(|| format!("decompressing zip entry '{name}'"))?;
                tree.insert_file(&name, bytes, method);
            }
        }
        Ok(tree)
    }

    /// Serialize the tree into a zip byte buffer.
    ///
    /// Entries are written in sorted path order with the sentinel timestamp
    /// and canonical permission bits, so identical trees always produce
    /// identical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, entry) in &self.entries {
            match entry {
                Entry::Directory => {
                    writer
                        .add_directory(path.clone(), reproducible::dir_options())
                        .with_context(|| format!("writing zip directory '{path}'"))?;
                }
                Entry::File(file) => {
                    writer
                        .start_file(path.clone(), reproducible::file_options(file.method))
                        .with_context(|| format!("writing zip entry '{path}'"))?;
                    writer
                        .write_all(&file.bytes)
                        .with_context(|| format!("writing zip entry '{path}'"))?;
                }
            }
        }
        let cursor = writer.finish().context("finishing zip archive")?;
        Ok(cursor.into_inner())
    }

    /// Write the tree to disk, staging to a `.part` file and renaming so no
    /// partial archive is ever left at the target path.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        write_atomic(path, &bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(&normalize_path(path))
    }

    pub fn is_dir(&self, path: &str) -> bool {
        matches!(self.entries.get(&normalize_path(path)), Some(Entry::Directory))
    }

    pub fn is_file(&self, path: &str) -> bool {
        matches!(self.entries.get(&normalize_path(path)), Some(Entry::File(_)))
    }

    /// Read the contents of a regular-file entry.
    pub fn read(&self, path: &str) -> Result<&[u8]> {
        let normalized = normalize_path(path);
        match self.entries.get(&normalized) {
            Some(Entry::File(file)) => Ok(&file.bytes),
            Some(Entry::Directory) => bail!("archive entry '{normalized}' is a directory"),
            None => bail!("archive entry '{normalized}' not found"),
        }
    }

    /// Read a regular-file entry as UTF-8 text.
    pub fn read_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes.to_vec())
            .with_context(|| format!("archive entry '{}' is not valid UTF-8", normalize_path(path)))
    }

    /// Write a regular-file entry, creating missing parent directories and
    /// replacing any existing entry at the path.
    pub fn write(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        self.insert_file(&normalize_path(path), bytes.into(), CompressionMethod::Deflated);
    }

    fn insert_file(&mut self, path: &str, bytes: Vec<u8>, method: CompressionMethod) {
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.create_dirs(parent);
        }
        self.entries
            .insert(path.to_string(), Entry::File(FileEntry { bytes, method }));
    }

    /// Idempotent recursive directory creation.
    pub fn create_dirs(&mut self, path: &str) {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return;
        }
        let mut current = String::new();
        for part in normalized.split('/') {
            current = join_paths(&current, part);
            self.entries
                .entry(current.clone())
                .or_insert(Entry::Directory);
        }
    }

    /// Immediate children of the archive root, in sorted order.
    pub fn root_entries(&self) -> Vec<String> {
        self.entries
            .keys()
            .filter(|path| !path.contains('/'))
            .cloned()
            .collect()
    }

    /// All entry paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut BTreeMap<String, Entry> {
        &mut self.entries
    }
}

/// Write bytes to `path` by staging to a sibling `.part` file and renaming.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("archive");
    let staging = path.with_file_name(format!("{file_name}.part"));
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }
    fs::write(&staging, bytes)
        .with_context(|| format!("writing staged archive '{}'", staging.display()))?;
    fs::rename(&staging, path).with_context(|| {
        format!(
            "replacing '{}' with staged archive '{}'",
            path.display(),
            staging.display()
        )
    })?;
    Ok(())
}
