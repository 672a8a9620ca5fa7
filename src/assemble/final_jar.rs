//! Final multi-loader jar assembly.
//!
//! Nests the Fabric-flavoured runtime jar and the assembled NeoForge jar
//! under `META-INF/jars/`, hoists the trees both variants share up to the
//! top level, rewrites the nested descriptors to their loader-qualified
//! runtime identity, and writes the top-level descriptors that tie the
//! bundle together for both loader families.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::archive::reproducible::normalize_archive;
use crate::archive::ArchiveTree;
use crate::config::ProjectConfig;
use crate::manifest::{fmj, DependencySide, Fmj, NestedJarEntry, NestedJarIndex, Nmt};
use crate::preflight;

use super::nested_jar_name;

pub struct FinalAssembly<'a> {
    pub project: &'a ProjectConfig,
    /// Top-level Fabric descriptor template.
    pub fmj_template: &'a Fmj,
    /// NeoForge descriptor template, flavoured as the runtime sub-artifact.
    pub nmt_template: &'a Nmt,
    pub runtime_intermediary_jar: &'a Path,
    pub runtime_neoforge_jar: &'a Path,
    pub output: &'a Path,
}

impl FinalAssembly<'_> {
    pub fn assemble(&self) -> Result<()> {
        preflight::check_input_files(&[self.runtime_intermediary_jar, self.runtime_neoforge_jar])?;

        let mut fabric = ArchiveTree::open(self.runtime_intermediary_jar)?;
        let mut neo = ArchiveTree::open(self.runtime_neoforge_jar)?;
        let mut out = ArchiveTree::new();

        let fabric_nested = format!(
            "META-INF/jars/{}",
            nested_jar_name(self.runtime_intermediary_jar, "-intermediary", "-fabric")?
        );
        let neo_nested = format!(
            "META-INF/jars/{}",
            nested_jar_name(self.runtime_neoforge_jar, "-mojmap", "-neoforge")?
        );
        out.create_dirs("META-INF/jars");

        self.hoist_shared_trees(&mut fabric, &mut neo, &mut out)?;
        self.write_fabric_descriptors(&mut fabric, &mut out, &fabric_nested)?;
        self.write_neoforge_descriptors(&mut neo, &mut out)?;

        // neither sub-jar may carry the other loader family's descriptor
        fabric.delete_if_exists("META-INF/neoforge.mods.toml");
        neo.delete_if_exists("fabric.mod.json");

        self.write_nested_metadata(&mut out, &neo_nested)?;

        out.write(&fabric_nested, fabric.to_bytes()?);
        out.write(&neo_nested, neo.to_bytes()?);

        out.write_to(self.output)?;
        normalize_archive(self.output)?;
        println!(
            "[assemble:final] wrote '{}' ({} entries)",
            self.output.display(),
            out.len()
        );
        Ok(())
    }

    /// Move the trees both variants carry up to the top-level jar so they
    /// exist exactly once, then push the mod icon back down (each nested
    /// descriptor still points at it).
    fn hoist_shared_trees(
        &self,
        fabric: &mut ArchiveTree,
        neo: &mut ArchiveTree,
        out: &mut ArchiveTree,
    ) -> Result<()> {
        if let Some(shadow) = &self.project.shadow_package {
            if fabric.contains(shadow) {
                bi_move(shadow, fabric, neo, out)?;
            }
        }
        let config_entry = self.project.config_entry();
        for path in ["META-INF/versions", config_entry.as_str()] {
            if fabric.contains(path) {
                bi_move(path, fabric, neo, out)?;
            }
        }
        bi_move("assets", fabric, neo, out)?;

        let license = self.project.license_entry();
        fabric
            .copy_all_into(&license, out)
            .with_context(|| format!("copying license entry '{license}'"))?;

        let icon = self.project.icon_entry();
        out.copy_all_into(&icon, fabric)
            .with_context(|| format!("restoring icon '{icon}' into the fabric jar"))?;
        out.copy_all_into(&icon, neo)
            .with_context(|| format!("restoring icon '{icon}' into the neoforge jar"))?;
        Ok(())
    }

    fn write_fabric_descriptors(
        &self,
        fabric: &mut ArchiveTree,
        out: &mut ArchiveTree,
        fabric_nested: &str,
    ) -> Result<()> {
        let project = self.project;

        // nested runtime jar takes the loader-qualified identity; the
        // original identity belongs to the top-level descriptor
        let text = fabric.read_string("fabric.mod.json")?;
        let mut doc: Value = serde_json::from_str(&text).with_context(|| {
            format!(
                "parsing fabric.mod.json from '{}'",
                self.runtime_intermediary_jar.display()
            )
        })?;
        fmj::rewrite_identity(
            &mut doc,
            &project.runtime_id(),
            &project.runtime_name(),
            &project.description,
        )?;
        fmj::set_mod_menu_parent(&mut doc, &project.namespace, &project.display_name)?;
        fabric.write(
            "fabric.mod.json",
            serde_json::to_string_pretty(&doc).context("serializing fabric.mod.json")?,
        );

        let mut parent = self
            .fmj_template
            .derive()
            .with_depend(&project.runtime_id(), &format!(">={}", project.version))
            .with_jar(fabric_nested);
        if let Some(environment) = self.fmj_template.environment() {
            let environment = environment.to_string();
            parent = parent.with_environment(&environment);
        }
        if let Some(mod_menu) = self.fmj_template.mod_menu() {
            parent = parent.with_mod_menu(mod_menu);
        }
        out.write("fabric.mod.json", parent.to_json_string()?);
        Ok(())
    }

    fn write_neoforge_descriptors(
        &self,
        neo: &mut ArchiveTree,
        out: &mut ArchiveTree,
    ) -> Result<()> {
        let project = self.project;

        let parent = self
            .nmt_template
            .derive()
            .with_namespace(&project.namespace)
            .with_name(&project.display_name)
            .with_description(&project.description)
            .with_depend(
                &project.runtime_id(),
                &format!("[{},)", project.version),
                DependencySide::Client,
            );
        out.write("META-INF/neoforge.mods.toml", parent.to_toml_string()?);

        let runtime = self
            .nmt_template
            .clone()
            .with_namespace(&project.runtime_id())
            .with_name(&project.runtime_name());
        neo.write("META-INF/neoforge.mods.toml", runtime.to_toml_string()?);
        Ok(())
    }

    fn write_nested_metadata(&self, out: &mut ArchiveTree, neo_nested: &str) -> Result<()> {
        let project = self.project;
        let mut index = NestedJarIndex::new();
        index.append(&NestedJarEntry {
            group: project.artifact_group.clone(),
            artifact: format!("{}-runtime-neoforge", project.namespace),
            range: format!("[{},)", project.version),
            artifact_version: project.version.clone(),
            path: neo_nested.to_string(),
            obfuscated: false,
        });
        out.create_dirs("META-INF/jarjar");
        out.write("META-INF/jarjar/metadata.json", index.to_json_string()?);
        Ok(())
    }
}

/// Move a tree from the fabric jar into the output, dropping the NeoForge
/// jar's duplicate of it.
fn bi_move(
    path: &str,
    fabric: &mut ArchiveTree,
    neo: &mut ArchiveTree,
    out: &mut ArchiveTree,
) -> Result<()> {
    fabric
        .move_into(path, out, path)
        .with_context(|| format!("hoisting '{path}' into the merged jar"))?;
    neo.delete_if_exists(path);
    Ok(())
}
