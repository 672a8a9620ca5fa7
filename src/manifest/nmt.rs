//! NeoForge mod descriptor (`neoforge.mods.toml`) splicing.

use anyhow::{Context, Result};
use toml::{Table, Value};

/// Which physical side a NeoForge dependency edge applies to.
///
/// NeoForge dependency edges always carry a side marker; the Fabric dialect
/// has no equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySide {
    Client,
    Server,
    Both,
}

impl DependencySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencySide::Client => "CLIENT",
            DependencySide::Server => "SERVER",
            DependencySide::Both => "BOTH",
        }
    }
}

/// A `neoforge.mods.toml` document under construction.
///
/// Backed by a generic TOML table; only spliced fields get typed helpers.
#[derive(Debug, Clone)]
pub struct Nmt {
    root: Table,
}

impl Nmt {
    pub fn new(namespace: &str, version: &str) -> Self {
        let mut root = Table::new();
        root.insert("modLoader".into(), Value::String("javafml".into()));
        root.insert("loaderVersion".into(), Value::String("[1,)".into()));

        let mut mods_entry = Table::new();
        mods_entry.insert("modId".into(), Value::String(namespace.into()));
        mods_entry.insert("version".into(), Value::String(version.into()));
        root.insert("mods".into(), Value::Array(vec![Value::Table(mods_entry)]));

        Self { root }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let root: Table = toml::from_str(text).context("parsing neoforge mod descriptor")?;
        Ok(Self { root })
    }

    /// Derive a wrapper descriptor: loader header and `[[mods]]` identity are
    /// copied, dependency edges are not.
    pub fn derive(&self) -> Self {
        let mut root = Table::new();
        for field in ["modLoader", "loaderVersion", "license"] {
            if let Some(value) = self.root.get(field) {
                root.insert(field.to_string(), value.clone());
            }
        }
        let mut mods_entry = Table::new();
        if let Some(source) = self.mods_entry() {
            for field in ["modId", "version", "displayName", "description", "logoFile", "logoBlur"]
            {
                if let Some(value) = source.get(field) {
                    mods_entry.insert(field.to_string(), value.clone());
                }
            }
        }
        root.insert("mods".into(), Value::Array(vec![Value::Table(mods_entry)]));
        Self { root }
    }

    /// The descriptor's mod id.
    pub fn namespace(&self) -> Option<&str> {
        self.mods_entry()
            .and_then(|entry| entry.get("modId"))
            .and_then(Value::as_str)
    }

    /// Rename the mod id. Also renames the matching `[dependencies.<id>]`
    /// key so existing dependency edges stay attached.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        let previous = self.namespace().map(str::to_string);
        if let Some(entry) = self.mods_entry_mut() {
            entry.insert("modId".into(), Value::String(namespace.into()));
        }
        if let Some(previous) = previous {
            if previous != namespace {
                if let Some(Value::Table(dependencies)) = self.root.get_mut("dependencies") {
                    if let Some(edges) = dependencies.remove(&previous) {
                        dependencies.insert(namespace.to_string(), edges);
                    }
                }
            }
        }
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        if let Some(entry) = self.mods_entry_mut() {
            entry.insert("displayName".into(), Value::String(name.into()));
        }
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if let Some(entry) = self.mods_entry_mut() {
            entry.insert("description".into(), Value::String(description.into()));
        }
        self
    }

    pub fn with_logo(mut self, path: &str) -> Self {
        if let Some(entry) = self.mods_entry_mut() {
            entry.insert("logoFile".into(), Value::String(path.into()));
        }
        self
    }

    pub fn with_blur_logo(mut self, blur: bool) -> Self {
        if let Some(entry) = self.mods_entry_mut() {
            entry.insert("logoBlur".into(), Value::Boolean(blur));
        }
        self
    }

    pub fn with_loader_version(mut self, range: &str) -> Self {
        self.root
            .insert("loaderVersion".into(), Value::String(range.into()));
        self
    }

    pub fn with_license(mut self, license: &str) -> Self {
        self.root
            .insert("license".into(), Value::String(license.into()));
        self
    }

    pub fn loader_version(&self) -> Option<&str> {
        self.root.get("loaderVersion").and_then(Value::as_str)
    }

    /// Add a required dependency edge for the given side.
    pub fn with_depend(self, id: &str, range: &str, side: DependencySide) -> Self {
        self.with_dependency_edge(id, range, "required", side)
    }

    /// Add an incompatibility edge for the given side.
    pub fn with_break(self, id: &str, range: &str, side: DependencySide) -> Self {
        self.with_dependency_edge(id, range, "incompatible", side)
    }

    fn with_dependency_edge(
        mut self,
        id: &str,
        range: &str,
        kind: &str,
        side: DependencySide,
    ) -> Self {
        let Some(namespace) = self.namespace().map(str::to_string) else {
            return self;
        };
        let mut edge = Table::new();
        edge.insert("modId".into(), Value::String(id.into()));
        edge.insert("type".into(), Value::String(kind.into()));
        edge.insert("versionRange".into(), Value::String(range.into()));
        edge.insert("ordering".into(), Value::String("NONE".into()));
        edge.insert("side".into(), Value::String(side.as_str().into()));

        let dependencies = self
            .root
            .entry("dependencies")
            .or_insert_with(|| Value::Table(Table::new()));
        if let Value::Table(dependencies) = dependencies {
            let edges = dependencies
                .entry(namespace)
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(edges) = edges {
                // one edge per mod id: re-declaring replaces the constraint
                let existing = edges.iter_mut().find(|existing| {
                    existing.get("modId").and_then(Value::as_str) == Some(id)
                });
                match existing {
                    Some(existing) => *existing = Value::Table(edge),
                    None => edges.push(Value::Table(edge)),
                }
            }
        }
        self
    }

    /// Dependency edges attached to the current mod id.
    pub fn dependency_edges(&self) -> Vec<&Table> {
        let Some(namespace) = self.namespace() else {
            return Vec::new();
        };
        self.root
            .get("dependencies")
            .and_then(|deps| deps.get(namespace))
            .and_then(Value::as_array)
            .map(|edges| edges.iter().filter_map(Value::as_table).collect())
            .unwrap_or_default()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.root).context("serializing neoforge mod descriptor")
    }

    fn mods_entry(&self) -> Option<&Table> {
        self.root
            .get("mods")
            .and_then(Value::as_array)
            .and_then(|mods| mods.first())
            .and_then(Value::as_table)
    }

    fn mods_entry_mut(&mut self) -> Option<&mut Table> {
        self.root
            .get_mut("mods")
            .and_then(Value::as_array_mut)
            .and_then(|mods| mods.first_mut())
            .and_then(Value::as_table_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Nmt {
        Nmt::new("dynlights_runtime", "4.0.0")
            .with_name("Dynamic Lights (Runtime)")
            .with_description("Lights.")
            .with_loader_version("[2,)")
            .with_license("MIT")
            .with_logo("assets/dynlights/icon.png")
            .with_blur_logo(false)
            .with_depend("minecraft", "[1.21.7,)", DependencySide::Both)
    }

    #[test]
    fn test_dependency_edge_carries_side() {
        let nmt = sample().with_depend("dynlights_api", "[4.0.0,)", DependencySide::Client);
        let edges = nmt.dependency_edges();
        assert_eq!(edges.len(), 2);
        let edge = edges[1];
        assert_eq!(edge["modId"].as_str(), Some("dynlights_api"));
        assert_eq!(edge["type"].as_str(), Some("required"));
        assert_eq!(edge["versionRange"].as_str(), Some("[4.0.0,)"));
        assert_eq!(edge["side"].as_str(), Some("CLIENT"));
    }

    #[test]
    fn test_redeclaring_dependency_replaces_range() {
        let nmt = sample().with_depend("minecraft", "[1.21.6,1.22)", DependencySide::Both);
        let edges = nmt.dependency_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["versionRange"].as_str(), Some("[1.21.6,1.22)"));
    }

    #[test]
    fn test_namespace_rename_moves_dependency_edges() {
        let nmt = sample().with_namespace("dynlights");
        assert_eq!(nmt.namespace(), Some("dynlights"));
        let edges = nmt.dependency_edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["modId"].as_str(), Some("minecraft"));

        let text = nmt.to_toml_string().unwrap();
        assert!(text.contains("[[dependencies.dynlights]]"));
        assert!(!text.contains("dynlights_runtime"));
    }

    #[test]
    fn test_derive_copies_identity_not_edges() {
        let parent = sample().derive();
        assert_eq!(parent.namespace(), Some("dynlights_runtime"));
        assert_eq!(parent.loader_version(), Some("[2,)"));
        assert!(parent.dependency_edges().is_empty());

        let text = parent.to_toml_string().unwrap();
        assert!(text.contains("logoFile"));
        assert!(text.contains("modLoader"));
    }

    #[test]
    fn test_round_trip_preserves_unknown_fields() {
        let source = r#"
modLoader = "javafml"
loaderVersion = "[2,)"
license = "MIT"
issueTrackerURL = "https://example.invalid/issues"

[[mods]]
modId = "dynlights"
version = "4.0.0"
unknownKey = "survives"
"#;
        let nmt = Nmt::parse(source).unwrap().with_name("Dynamic Lights");
        let text = nmt.to_toml_string().unwrap();
        assert!(text.contains("issueTrackerURL"));
        assert!(text.contains("unknownKey = \"survives\""));
        assert!(text.contains("displayName = \"Dynamic Lights\""));
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        assert!(Nmt::parse("not = [toml").is_err());
    }
}
