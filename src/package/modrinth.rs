//! Upload-ready package assembly for the Modrinth distribution platform.
//!
//! Pure assembly: a platform manifest, the rendered README, and the built
//! jars, zipped together. The actual upload is a separate, credential-gated
//! collaborator (see [`super::publish`]).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::archive::ArchiveTree;
use crate::config::{ModDependency, ProjectConfig};
use crate::preflight;
use crate::release::{mc_version_tag, VersionType};

pub struct ModrinthPackage<'a> {
    pub project: &'a ProjectConfig,
    pub changelog: &'a str,
    pub readme: &'a str,
    pub loaders: &'a [String],
    pub dependencies: &'a [ModDependency],
    /// Built jars bundled verbatim.
    pub files: &'a [PathBuf],
    pub output: &'a Path,
}

impl ModrinthPackage<'_> {
    /// Human-facing version name, e.g. `Dynamic Lights 4.0.0 (1.21.7)`.
    pub fn version_name(&self) -> String {
        format!(
            "{} {} ({})",
            self.project.display_name,
            self.project.version,
            mc_version_tag(&self.project.minecraft_version)
        )
    }

    pub fn package(&self) -> Result<()> {
        let file_paths: Vec<&Path> = self.files.iter().map(PathBuf::as_path).collect();
        preflight::check_input_files(&file_paths)?;

        let mut tree = ArchiveTree::new();
        tree.write("manifest.json", self.manifest()?);
        tree.write("README.md", self.readme);
        for file in self.files {
            let name = file
                .file_name()
                .and_then(|name| name.to_str())
                .with_context(|| format!("file '{}' has no usable name", file.display()))?;
            let bytes = fs::read(file)
                .with_context(|| format!("reading packaged file '{}'", file.display()))?;
            tree.write(name, bytes);
        }

        tree.write_to(self.output)?;
        println!(
            "[package:modrinth] wrote '{}' ({} files)",
            self.output.display(),
            self.files.len()
        );
        Ok(())
    }

    fn manifest(&self) -> Result<String> {
        let project = self.project;
        let mut manifest = Map::new();
        manifest.insert("version".into(), Value::from(project.version.as_str()));
        manifest.insert("name".into(), Value::from(self.version_name()));
        manifest.insert(
            "type".into(),
            Value::from(VersionType::classify(&project.version).as_str()),
        );
        manifest.insert("changelog".into(), Value::from(self.changelog));
        manifest.insert("game_versions".into(), Value::from(project.game_versions()));
        manifest.insert("loaders".into(), Value::from(self.loaders.to_vec()));

        let files: Vec<Value> = self
            .files
            .iter()
            .filter_map(|file| file.file_name())
            .filter_map(|name| name.to_str())
            .map(Value::from)
            .collect();
        manifest.insert("files".into(), Value::Array(files));

        if !self.dependencies.is_empty() {
            let dependencies: Vec<Value> = self
                .dependencies
                .iter()
                .map(|dependency| {
                    let mut entry = Map::new();
                    entry.insert(
                        "project_id".into(),
                        Value::from(dependency.project_id.as_str()),
                    );
                    entry.insert("type".into(), Value::from(dependency.kind.as_str()));
                    Value::Object(entry)
                })
                .collect();
            manifest.insert("dependencies".into(), Value::Array(dependencies));
        }

        serde_json::to_string_pretty(&manifest).context("serializing platform manifest")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use tempfile::TempDir;

    fn project() -> ProjectConfig {
        let config: BuildConfig = toml::from_str(
            r#"
[project]
name = "dynamiclights"
namespace = "dynlights"
display_name = "Dynamic Lights"
version = "4.0.0-beta.1"
description = "Dynamic lighting."
artifact_group = "dev.example"
minecraft_version = "1.21.7"
compatible_minecraft_versions = ["1.21.6"]

[assemble]
runtime_intermediary_jar = "unused"
runtime_mojmap_jar = "unused"
neoforge_loader_jar = "unused"
nested_jar_metadata = "unused"
output_dir = "unused"

[package]
[[package.dependencies]]
project_id = "P7dR8mSH"
type = "required"
[[package.dependencies]]
project_id = "reCfnRvJ"
type = "incompatible"
"#,
        )
        .unwrap();
        config.project
    }

    #[test]
    fn test_package_contents() {
        let temp = TempDir::new().unwrap();
        let jar = temp.path().join("dynamiclights-4.0.0-beta.1.jar");
        fs::write(&jar, b"PKjar").unwrap();
        let output = temp.path().join("modrinth.zip");

        let project = project();
        let loaders = vec!["fabric".to_string(), "quilt".to_string(), "neoforge".to_string()];
        let dependencies = vec![
            ModDependency {
                project_id: "P7dR8mSH".into(),
                kind: crate::config::DependencyType::Required,
            },
            ModDependency {
                project_id: "reCfnRvJ".into(),
                kind: crate::config::DependencyType::Incompatible,
            },
        ];
        let files = vec![jar.clone()];
        ModrinthPackage {
            project: &project,
            changelog: "- fixed lights",
            readme: "# Dynamic Lights",
            loaders: &loaders,
            dependencies: &dependencies,
            files: &files,
            output: &output,
        }
        .package()
        .unwrap();

        let tree = ArchiveTree::open(&output).unwrap();
        assert_eq!(tree.read("dynamiclights-4.0.0-beta.1.jar").unwrap(), b"PKjar");
        assert_eq!(tree.read("README.md").unwrap(), b"# Dynamic Lights");

        let manifest: Value =
            serde_json::from_str(&tree.read_string("manifest.json").unwrap()).unwrap();
        assert_eq!(manifest["version"], "4.0.0-beta.1");
        assert_eq!(manifest["name"], "Dynamic Lights 4.0.0-beta.1 (1.21.7)");
        assert_eq!(manifest["type"], "beta");
        assert_eq!(manifest["changelog"], "- fixed lights");
        assert_eq!(manifest["game_versions"][0], "1.21.7");
        assert_eq!(manifest["game_versions"][1], "1.21.6");
        assert_eq!(manifest["loaders"][1], "quilt");
        assert_eq!(manifest["files"][0], "dynamiclights-4.0.0-beta.1.jar");
        assert_eq!(manifest["dependencies"][0]["project_id"], "P7dR8mSH");
        assert_eq!(manifest["dependencies"][1]["type"], "incompatible");
    }

    #[test]
    fn test_missing_jar_fails() {
        let temp = TempDir::new().unwrap();
        let project = project();
        let files = vec![temp.path().join("absent.jar")];
        let loaders = vec!["fabric".to_string()];
        let err = ModrinthPackage {
            project: &project,
            changelog: "",
            readme: "",
            loaders: &loaders,
            dependencies: &[],
            files: &files,
            output: &temp.path().join("modrinth.zip"),
        }
        .package()
        .unwrap_err();
        assert!(err.to_string().contains("missing input file(s)"));
    }
}
