//! Jar assembly pipelines.
//!
//! Each assembler is one strictly sequential, all-or-nothing run: open the
//! input archives, redistribute their trees, splice the descriptors and
//! nested-jar metadata, and write the normalized output through a staged
//! rename. Any failure aborts the run with no artifact left at the target
//! path; the surrounding build re-invokes the task from scratch.

pub mod final_jar;
pub mod neoforge;

pub use final_jar::FinalAssembly;
pub use neoforge::NeoForgeAssembly;

use std::path::Path;

use anyhow::{bail, Context, Result};

/// Nested-jar entry name derived from an input jar's file name, with the
/// mapping classifier swapped for the loader classifier
/// (`-intermediary` → `-fabric`, `-mojmap` → `-neoforge`).
pub(crate) fn nested_jar_name(input: &Path, classifier: &str, replacement: &str) -> Result<String> {
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("input jar '{}' has no usable file name", input.display()))?;
    if !file_name.ends_with(".jar") {
        bail!("input '{file_name}' is not a jar file");
    }
    Ok(file_name.replace(classifier, replacement))
}
