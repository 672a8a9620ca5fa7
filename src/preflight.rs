//! Input validation before assembly starts.
//!
//! Assembly is all-or-nothing, so missing inputs are caught up front and
//! reported together instead of surfacing one at a time mid-merge.

use std::path::Path;

use anyhow::{bail, Result};

/// Check that every given input exists and is a regular file.
pub fn check_input_files(paths: &[&Path]) -> Result<()> {
    let missing: Vec<String> = paths
        .iter()
        .filter(|path| !path.is_file())
        .map(|path| path.display().to_string())
        .collect();
    if !missing.is_empty() {
        bail!("missing input file(s): {}", missing.join(", "));
    }
    Ok(())
}
