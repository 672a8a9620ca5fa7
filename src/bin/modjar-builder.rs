use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use modjar_builder::archive::reproducible::normalize_archive;
use modjar_builder::config::{BuildConfig, PackageConfig};
use modjar_builder::package::publish::{prepare_upload, UploadGate, TOKEN_VAR};
use modjar_builder::package::ModrinthPackage;
use modjar_builder::release::{extract_changelog, mc_version_tag, rewrite_relative_links};
use modjar_builder::{FinalAssembly, NeoForgeAssembly};

fn usage() -> &'static str {
    "Usage:\n  modjar-builder assemble neoforge <config.toml>\n  modjar-builder assemble final <config.toml>\n  modjar-builder assemble all <config.toml>\n  modjar-builder package modrinth <config.toml>\n  modjar-builder publish modrinth <config.toml>\n  modjar-builder normalize <archive>"
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [assemble, variant, config] if assemble == "assemble" && variant == "neoforge" => {
            assemble_neoforge(&load(config)?)
        }
        [assemble, variant, config] if assemble == "assemble" && variant == "final" => {
            assemble_final(&load(config)?)
        }
        [assemble, variant, config] if assemble == "assemble" && variant == "all" => {
            let config = load(config)?;
            assemble_neoforge(&config)?;
            assemble_final(&config)
        }
        [package, target, config] if package == "package" && target == "modrinth" => {
            package_modrinth(&load(config)?).map(|_| ())
        }
        [publish, target, config] if publish == "publish" && target == "modrinth" => {
            publish_modrinth(&load(config)?)
        }
        [normalize, archive] if normalize == "normalize" => {
            normalize_archive(Path::new(archive))?;
            println!("[normalize] rewrote '{archive}'");
            Ok(())
        }
        _ => bail!(usage()),
    }
}

fn load(path: &str) -> Result<BuildConfig> {
    BuildConfig::load(Path::new(path))
}

fn assemble_neoforge(config: &BuildConfig) -> Result<()> {
    let assemble = &config.assemble;
    NeoForgeAssembly {
        project: &config.project,
        runtime_mojmap_jar: &assemble.runtime_mojmap_jar,
        neoforge_jar: &assemble.neoforge_loader_jar,
        nested_jar_metadata: &assemble.nested_jar_metadata,
        mixin_configs: &assemble.mixin_configs,
        output: &assemble.neoforge_output(&config.project),
    }
    .assemble()
    .context("assembling the neoforge jar")
}

fn assemble_final(config: &BuildConfig) -> Result<()> {
    let assemble = &config.assemble;
    let neoforge_jar = assemble.neoforge_output(&config.project);
    if !neoforge_jar.is_file() {
        bail!(
            "missing merged neoforge jar '{}'; run 'assemble neoforge' first",
            neoforge_jar.display()
        );
    }

    let fmj_template = config.project.fabric_manifest();
    let nmt_template = config.project.neoforge_manifest();
    FinalAssembly {
        project: &config.project,
        fmj_template: &fmj_template,
        nmt_template: &nmt_template,
        runtime_intermediary_jar: &assemble.runtime_intermediary_jar,
        runtime_neoforge_jar: &neoforge_jar,
        output: &assemble.final_output(&config.project),
    }
    .assemble()
    .context("assembling the final jar")
}

/// Build the upload package. Returns the package path and the changelog
/// section, when one exists for this version.
fn package_modrinth(config: &BuildConfig) -> Result<(PathBuf, Option<String>)> {
    let package = config.package.clone().unwrap_or_else(PackageConfig::default);

    let changelog = read_changelog(&package, &config.project.version)?;
    if changelog.is_none() {
        println!(
            "[package:modrinth] no changelog section for {}; packaging without one",
            config.project.version
        );
    }

    let readme_path = package.readme_path();
    let readme = std::fs::read_to_string(&readme_path)
        .with_context(|| format!("reading README '{}'", readme_path.display()))?;
    let readme = match &package.readme_link_base {
        Some(base) => rewrite_relative_links(&readme, base),
        None => readme,
    };

    let output = package.output_path(&config.assemble);
    let files = vec![config.assemble.final_output(&config.project)];
    ModrinthPackage {
        project: &config.project,
        changelog: changelog.as_deref().unwrap_or(""),
        readme: &readme,
        loaders: &package.loaders,
        dependencies: &package.dependencies,
        files: &files,
        output: &output,
    }
    .package()
    .context("packaging for modrinth")?;

    Ok((output, changelog))
}

fn publish_modrinth(config: &BuildConfig) -> Result<()> {
    let (output, changelog) = package_modrinth(config)?;

    let version_name = format!(
        "{} {} ({})",
        config.project.display_name,
        config.project.version,
        mc_version_tag(&config.project.minecraft_version)
    );
    match prepare_upload(&output, &version_name, changelog.as_deref())? {
        UploadGate::MissingToken => {
            println!("[publish:modrinth] {TOKEN_VAR} is not set; skipping publish");
            Ok(())
        }
        UploadGate::MissingChangelog => {
            println!(
                "[publish:modrinth] no changelog section for {}; skipping publish",
                config.project.version
            );
            Ok(())
        }
        UploadGate::Ready(plan) => {
            println!(
                "[publish:modrinth] '{}' staged for upload as \"{}\" (sha512 {})",
                plan.package.display(),
                plan.version_name,
                plan.sha512
            );
            Ok(())
        }
    }
}

fn read_changelog(package: &PackageConfig, version: &str) -> Result<Option<String>> {
    let path = package.changelog_path();
    if !path.is_file() {
        return Ok(None);
    }
    let markdown = std::fs::read_to_string(&path)
        .with_context(|| format!("reading changelog '{}'", path.display()))?;
    Ok(extract_changelog(&markdown, version))
}
