//! NeoForge-flavoured per-loader jar assembly.
//!
//! Merges the mojmap-mapped runtime jar with the compiled NeoForge
//! loader-specific jar: runtime classes and resources come over minus the
//! Fabric-only trees, the access widener is converted to an access
//! transformer, the mixin configs are pointed at the production refmap, and
//! the dependency collector's nested-jar metadata fragment is consolidated
//! into the output.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::archive::reproducible::normalize_archive;
use crate::archive::ArchiveTree;
use crate::config::ProjectConfig;
use crate::manifest::{convert_access_widener, NestedJarIndex};
use crate::preflight;

pub struct NeoForgeAssembly<'a> {
    pub project: &'a ProjectConfig,
    pub runtime_mojmap_jar: &'a Path,
    pub neoforge_jar: &'a Path,
    pub nested_jar_metadata: &'a Path,
    /// Mixin configs whose refmap reference is rewritten.
    pub mixin_configs: &'a [String],
    pub output: &'a Path,
}

impl NeoForgeAssembly<'_> {
    pub fn assemble(&self) -> Result<()> {
        preflight::check_input_files(&[
            self.runtime_mojmap_jar,
            self.neoforge_jar,
            self.nested_jar_metadata,
        ])?;

        let runtime = ArchiveTree::open(self.runtime_mojmap_jar)?;
        let loader = ArchiveTree::open(self.neoforge_jar)?;
        let mut out = ArchiveTree::new();

        // Runtime content, minus the Fabric-only trees, the widener (it is
        // converted below), and nested jars (the loader jar carries its own).
        for entry in runtime.root_entries() {
            if entry.ends_with("accesswidener") {
                continue;
            }
            runtime.copy_into(&entry, &mut out, &entry, |path, is_dir| {
                !path.contains("fabric") && (is_dir || !path.ends_with(".jar"))
            })?;
        }
        for entry in loader.root_entries() {
            loader.copy_into(&entry, &mut out, &entry, |path, _| !path.contains("fabric"))?;
        }

        self.convert_widener(&runtime, &mut out)?;
        for config in self.mixin_configs {
            self.set_refmap(&mut out, config)?;
        }
        self.consolidate_nested_metadata(&mut out)?;

        out.write_to(self.output)?;
        normalize_archive(self.output)?;
        println!(
            "[assemble:neoforge] wrote '{}' ({} entries)",
            self.output.display(),
            out.len()
        );
        Ok(())
    }

    fn convert_widener(&self, runtime: &ArchiveTree, out: &mut ArchiveTree) -> Result<()> {
        let widener_entry = format!("{}.accesswidener", self.project.namespace);
        let widener = runtime.read_string(&widener_entry).with_context(|| {
            format!(
                "reading access widener from '{}'",
                self.runtime_mojmap_jar.display()
            )
        })?;
        let transformer = convert_access_widener(&widener)
            .with_context(|| format!("converting access widener '{widener_entry}'"))?;
        out.write("META-INF/accesstransformer.cfg", transformer);
        Ok(())
    }

    fn set_refmap(&self, out: &mut ArchiveTree, config_entry: &str) -> Result<()> {
        let text = out.read_string(config_entry)?;
        let mut doc: Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing mixin config '{config_entry}'"))?;
        let Some(root) = doc.as_object_mut() else {
            bail!("mixin config '{config_entry}' is not a JSON object");
        };
        root.insert(
            "refmap".into(),
            Value::from(format!("{}-refmap.json", self.project.namespace)),
        );
        let text = serde_json::to_string_pretty(&doc)
            .with_context(|| format!("serializing mixin config '{config_entry}'"))?;
        out.write(config_entry, text);
        Ok(())
    }

    fn consolidate_nested_metadata(&self, out: &mut ArchiveTree) -> Result<()> {
        let fragment = fs::read_to_string(self.nested_jar_metadata).with_context(|| {
            format!(
                "reading nested-jar metadata '{}'",
                self.nested_jar_metadata.display()
            )
        })?;
        let mut index = NestedJarIndex::parse(&fragment).with_context(|| {
            format!(
                "parsing nested-jar metadata '{}'",
                self.nested_jar_metadata.display()
            )
        })?;
        // Project-group artifacts were collected under their build-internal
        // names; the published name is the API artifact.
        index.rewrite_identifier(
            &self.project.artifact_group,
            None,
            &self.project.api_artifact_id(),
        );
        out.create_dirs("META-INF/jarjar");
        out.write("META-INF/jarjar/metadata.json", index.to_json_string()?);
        Ok(())
    }
}
