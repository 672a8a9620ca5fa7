//! Build configuration.
//!
//! Every assembler receives its project metadata and input/output paths as
//! explicit values; there is no ambient global state. The command-line
//! front-end loads one TOML file holding all of it, library callers
//! construct the structs directly.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::manifest::{Fmj, Nmt};

/// Project identity and release metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Archive base name, e.g. `dynamiclights`.
    pub name: String,
    /// Mod id / resource namespace, e.g. `dynlights`.
    pub namespace: String,
    pub display_name: String,
    pub version: String,
    pub description: String,
    /// Maven group the project's artifacts are published under.
    pub artifact_group: String,
    /// Artifact name of the nested API jar. Defaults to `<namespace>-api`.
    #[serde(default)]
    pub api_artifact: Option<String>,
    /// Entry path of the relocated (shaded) dependency package, when the
    /// runtime jar carries one.
    #[serde(default)]
    pub shadow_package: Option<String>,
    pub minecraft_version: String,
    #[serde(default)]
    pub compatible_minecraft_versions: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub sources: Option<String>,
}

impl ProjectConfig {
    pub fn api_artifact_id(&self) -> String {
        self.api_artifact
            .clone()
            .unwrap_or_else(|| format!("{}-api", self.namespace))
    }

    /// Mod id of the nested runtime sub-artifact.
    pub fn runtime_id(&self) -> String {
        format!("{}_runtime", self.namespace)
    }

    pub fn runtime_name(&self) -> String {
        format!("{} (Runtime)", self.display_name)
    }

    pub fn icon_entry(&self) -> String {
        format!("assets/{}/icon.png", self.namespace)
    }

    pub fn license_entry(&self) -> String {
        format!("LICENSE_{}", self.name)
    }

    /// Entry name of the mod's bundled default configuration.
    pub fn config_entry(&self) -> String {
        format!("{}.toml", self.namespace)
    }

    /// Game versions the release applies to: the build target first,
    /// then the declared compatible versions.
    pub fn game_versions(&self) -> Vec<String> {
        let mut versions = vec![self.minecraft_version.clone()];
        for version in &self.compatible_minecraft_versions {
            if !versions.contains(version) {
                versions.push(version.clone());
            }
        }
        versions
    }

    /// Fabric descriptor template for the top-level merged artifact.
    pub fn fabric_manifest(&self) -> Fmj {
        let mut fmj = Fmj::new(&self.namespace, &self.version)
            .with_name(&self.display_name)
            .with_description(&self.description)
            .with_icon(&self.icon_entry())
            .with_environment("client");
        if !self.authors.is_empty() {
            fmj = fmj.with_authors(&self.authors);
        }
        if !self.contributors.is_empty() {
            fmj = fmj.with_contributors(&self.contributors);
        }
        if let Some(license) = &self.license {
            fmj = fmj.with_license(license);
        }
        if let Some(homepage) = &self.homepage {
            fmj = fmj.with_contact("homepage", homepage);
        }
        if let Some(sources) = &self.sources {
            fmj = fmj.with_contact("sources", sources);
        }
        fmj
    }

    /// NeoForge descriptor template, flavoured as the runtime sub-artifact
    /// (the final assembly derives the top-level identity from it).
    pub fn neoforge_manifest(&self) -> Nmt {
        let mut nmt = Nmt::new(&self.runtime_id(), &self.version)
            .with_name(&self.runtime_name())
            .with_description(&self.description)
            .with_loader_version("[2,)")
            .with_logo(&self.icon_entry())
            .with_blur_logo(false);
        if let Some(license) = &self.license {
            nmt = nmt.with_license(license);
        }
        nmt
    }
}

/// Paths of the pre-built inputs and the assembly output directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssembleConfig {
    /// Intermediary-mapped runtime jar (the Fabric-flavoured variant).
    pub runtime_intermediary_jar: PathBuf,
    /// Mojmap-mapped runtime jar (merged into the NeoForge variant).
    pub runtime_mojmap_jar: PathBuf,
    /// Compiled NeoForge loader-specific jar.
    pub neoforge_loader_jar: PathBuf,
    /// Nested-jar metadata fragment produced by the dependency collector.
    pub nested_jar_metadata: PathBuf,
    /// Mixin configs whose refmap reference is rewritten in the NeoForge
    /// variant.
    #[serde(default)]
    pub mixin_configs: Vec<String>,
    pub output_dir: PathBuf,
}

impl AssembleConfig {
    /// Output path of the NeoForge-flavoured merged jar. Carries the
    /// `mojmap` classifier; the final assembly renames it when nesting.
    pub fn neoforge_output(&self, project: &ProjectConfig) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}-mojmap.jar", project.name, project.version))
    }

    /// Output path of the final multi-loader distributable.
    pub fn final_output(&self, project: &ProjectConfig) -> PathBuf {
        self.output_dir
            .join(format!("{}-{}.jar", project.name, project.version))
    }
}

/// A distribution-platform dependency declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModDependency {
    pub project_id: String,
    #[serde(rename = "type")]
    pub kind: DependencyType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Required,
    Optional,
    Incompatible,
    Embedded,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Required => "required",
            DependencyType::Optional => "optional",
            DependencyType::Incompatible => "incompatible",
            DependencyType::Embedded => "embedded",
        }
    }
}

/// Distribution packaging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageConfig {
    /// Changelog document; the section matching the project version is
    /// extracted. Defaults to `CHANGELOG.md`.
    #[serde(default)]
    pub changelog: Option<PathBuf>,
    /// README bundled into the package. Defaults to `README.md`.
    #[serde(default)]
    pub readme: Option<PathBuf>,
    /// Base URL that relative README links are rewritten against.
    #[serde(default)]
    pub readme_link_base: Option<String>,
    #[serde(default = "default_loaders")]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<ModDependency>,
    /// Output archive path. Defaults to `<output_dir>/modrinth.zip`.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_loaders() -> Vec<String> {
    vec!["fabric".into(), "quilt".into(), "neoforge".into()]
}

impl PackageConfig {
    pub fn changelog_path(&self) -> PathBuf {
        self.changelog.clone().unwrap_or_else(|| "CHANGELOG.md".into())
    }

    pub fn readme_path(&self) -> PathBuf {
        self.readme.clone().unwrap_or_else(|| "README.md".into())
    }

    pub fn output_path(&self, assemble: &AssembleConfig) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| assemble.output_dir.join("modrinth.zip"))
    }
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            changelog: None,
            readme: None,
            readme_link_base: None,
            loaders: default_loaders(),
            dependencies: Vec::new(),
            output: None,
        }
    }
}

/// The whole build configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    pub project: ProjectConfig,
    pub assemble: AssembleConfig,
    #[serde(default)]
    pub package: Option<PackageConfig>,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading build config '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("parsing build config '{}'", path.display()))
    }
}
