//! Tree operations over archive contents.
//!
//! These are the traversal primitives every assembler is built on: recursive
//! copy with a filter predicate, recursive move, recursive delete, and
//! host-filesystem import. The predicate receives `(path, is_dir)` on the
//! source side; returning `false` for a directory skips its whole subtree,
//! returning `false` for a file skips only that file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use super::{join_paths, normalize_path, ArchiveTree, Entry};

impl ArchiveTree {
    /// Copy a file or directory subtree into another tree.
    ///
    /// Missing intermediate directories are created in the target;
    /// pre-existing target entries are overwritten.
    pub fn copy_into(
        &self,
        from: &str,
        target: &mut ArchiveTree,
        to: &str,
        predicate: impl Fn(&str, bool) -> bool,
    ) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);

        match self.entries().get(&from) {
            Some(Entry::File(file)) => {
                if predicate(&from, false) {
                    target.insert_file(&to, file.bytes.clone(), file.method);
                }
                Ok(())
            }
            Some(Entry::Directory) => {
                if !predicate(&from, true) {
                    return Ok(());
                }
                target.create_dirs(&to);

                let mut skipped: Option<String> = None;
                for key in self.subtree_keys(&from) {
                    if key == from {
                        continue;
                    }
                    if let Some(prefix) = &skipped {
                        if key.starts_with(prefix.as_str())
                            && key.as_bytes().get(prefix.len()) == Some(&b'/')
                        {
                            continue;
                        }
                        skipped = None;
                    }
                    let relative = &key[from.len() + 1..];
                    let dest = join_paths(&to, relative);
                    match &self.entries()[&key] {
                        Entry::Directory => {
                            if predicate(&key, true) {
                                target.create_dirs(&dest);
                            } else {
                                skipped = Some(key.clone());
                            }
                        }
                        Entry::File(file) => {
                            if predicate(&key, false) {
                                target.insert_file(&dest, file.bytes.clone(), file.method);
                            }
                        }
                    }
                }
                Ok(())
            }
            None => bail!("archive entry '{from}' not found"),
        }
    }

    /// Copy an entry to the same path in another tree, unfiltered.
    pub fn copy_all_into(&self, path: &str, target: &mut ArchiveTree) -> Result<()> {
        self.copy_into(path, target, path, |_, _| true)
    }

    /// Move a file or directory subtree into another tree: an unfiltered
    /// copy followed by a bottom-up delete of the source.
    pub fn move_into(&mut self, from: &str, target: &mut ArchiveTree, to: &str) -> Result<()> {
        self.copy_into(from, target, to, |_, _| true)?;
        self.delete(from)
    }

    /// Recursive bottom-up deletion. Fails when the path does not exist.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let path = normalize_path(path);
        let keys = self.subtree_keys(&path);
        if keys.is_empty() {
            bail!("archive entry '{path}' not found");
        }
        // Children before parents, as a real filesystem would require.
        for key in keys.iter().rev() {
            self.entries_mut().remove(key);
        }
        Ok(())
    }

    /// Recursive deletion that tolerates a missing path. Returns whether
    /// anything was removed.
    pub fn delete_if_exists(&mut self, path: &str) -> bool {
        self.delete(path).is_ok()
    }

    /// Import a host file or directory tree under the same predicate
    /// contract as [`ArchiveTree::copy_into`]. The predicate receives the
    /// destination archive path.
    pub fn copy_from_disk(
        &mut self,
        source: &Path,
        to: &str,
        predicate: impl Fn(&str, bool) -> bool,
    ) -> Result<()> {
        let to = normalize_path(to);
        if !source.exists() {
            bail!("source path '{}' not found", source.display());
        }
        if source.is_file() {
            if predicate(&to, false) {
                let bytes = fs::read(source)
                    .with_context(|| format!("reading file '{}'", source.display()))?;
                self.write(&to, bytes);
            }
            return Ok(());
        }

        let mut iter = WalkDir::new(source).sort_by_file_name().into_iter();
        while let Some(entry) = iter.next() {
            let entry =
                entry.with_context(|| format!("walking directory '{}'", source.display()))?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .with_context(|| format!("relativizing '{}'", entry.path().display()))?;
            let dest = join_paths(&to, &normalize_path(&relative.to_string_lossy()));
            if entry.file_type().is_dir() {
                if predicate(&dest, true) {
                    self.create_dirs(&dest);
                } else {
                    iter.skip_current_dir();
                }
            } else if predicate(&dest, false) {
                let bytes = fs::read(entry.path())
                    .with_context(|| format!("reading file '{}'", entry.path().display()))?;
                self.write(&dest, bytes);
            }
        }
        Ok(())
    }

    /// Sorted keys of the entry at `path` and all of its descendants.
    ///
    /// Sibling entries that merely share the prefix (`assets-extra` next to
    /// `assets`) are not part of the subtree.
    fn subtree_keys(&self, path: &str) -> Vec<String> {
        let mut keys = Vec::new();
        if self.entries().contains_key(path) {
            keys.push(path.to_string());
        }
        let prefix = format!("{path}/");
        keys.extend(
            self.entries()
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
                .map(|(key, _)| key.clone()),
        );
        keys
    }
}
