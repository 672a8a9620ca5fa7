//! Credential-gated publish hand-off.
//!
//! Uploading is delegated to an external client; this module only decides
//! whether publishing is possible and stages what the client needs. A
//! missing credential or changelog disables the step without failing the
//! build.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha512};

/// Environment variable holding the platform API token.
pub const TOKEN_VAR: &str = "MODRINTH_TOKEN";

/// Everything the external upload client needs for one release.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub package: PathBuf,
    pub version_name: String,
    /// Digest the platform records for the uploaded package.
    pub sha512: String,
}

/// Outcome of the publish gate.
#[derive(Debug, Clone)]
pub enum UploadGate {
    Ready(UploadPlan),
    /// No API token in the environment; publishing is skipped.
    MissingToken,
    /// No changelog section for this version; publishing is skipped.
    MissingChangelog,
}

/// The platform API token, when configured and non-empty.
pub fn modrinth_token() -> Option<String> {
    std::env::var(TOKEN_VAR).ok().filter(|token| !token.is_empty())
}

/// Gate the publish step on its optional inputs and stage the hand-off.
pub fn prepare_upload(
    package: &Path,
    version_name: &str,
    changelog: Option<&str>,
) -> Result<UploadGate> {
    if modrinth_token().is_none() {
        return Ok(UploadGate::MissingToken);
    }
    if changelog.is_none() {
        return Ok(UploadGate::MissingChangelog);
    }
    let sha512 = sha512_hex(package)?;
    Ok(UploadGate::Ready(UploadPlan {
        package: package.to_path_buf(),
        version_name: version_name.to_string(),
        sha512,
    }))
}

/// Hex-encoded SHA-512 of a file, streamed in chunks.
pub fn sha512_hex(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buffer)
            .with_context(|| format!("hashing '{}'", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    Ok(hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sha512_hex() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.zip");
        fs::write(&path, b"abc").unwrap();
        // known SHA-512 of "abc"
        assert_eq!(
            sha512_hex(&path).unwrap(),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_gate_without_token_skips() {
        // token variables are read per call; the test environment does not
        // set MODRINTH_TOKEN
        if std::env::var(TOKEN_VAR).is_ok() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let package = temp.path().join("modrinth.zip");
        fs::write(&package, b"zip").unwrap();

        let gate = prepare_upload(&package, "Dynamic Lights 4.0.0", Some("- notes")).unwrap();
        assert!(matches!(gate, UploadGate::MissingToken));
    }
}
