//! Fabric mod descriptor (`fabric.mod.json`) splicing.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// Identity fields copied when deriving a wrapper descriptor from a child.
const IDENTITY_FIELDS: &[&str] = &[
    "schemaVersion",
    "id",
    "version",
    "name",
    "description",
    "authors",
    "contributors",
    "contact",
    "license",
    "icon",
];

/// A `fabric.mod.json` document under construction.
///
/// Backed by a generic JSON object so fields this pipeline does not model
/// survive a round-trip untouched.
#[derive(Debug, Clone)]
pub struct Fmj {
    root: Map<String, Value>,
}

impl Fmj {
    pub fn new(id: &str, version: &str) -> Self {
        let mut root = Map::new();
        root.insert("schemaVersion".into(), Value::from(1));
        root.insert("id".into(), Value::from(id));
        root.insert("version".into(), Value::from(version));
        Self { root }
    }

    /// Parse a descriptor document. The top level must be a JSON object.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).context("parsing fabric mod descriptor")?;
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => bail!("fabric mod descriptor is not a JSON object"),
        }
    }

    /// Derive a wrapper descriptor: identity fields are copied from `self`,
    /// everything else (entrypoints, mixins, dependency edges) starts fresh.
    pub fn derive(&self) -> Self {
        let mut root = Map::new();
        for field in IDENTITY_FIELDS {
            if let Some(value) = self.root.get(*field) {
                root.insert((*field).to_string(), value.clone());
            }
        }
        Self { root }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.root.insert("name".into(), Value::from(name));
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.root.insert("description".into(), Value::from(description));
        self
    }

    pub fn with_authors(mut self, authors: &[String]) -> Self {
        self.root.insert("authors".into(), Value::from(authors.to_vec()));
        self
    }

    pub fn with_contributors(mut self, contributors: &[String]) -> Self {
        self.root
            .insert("contributors".into(), Value::from(contributors.to_vec()));
        self
    }

    pub fn with_license(mut self, license: &str) -> Self {
        self.root.insert("license".into(), Value::from(license));
        self
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.root.insert("icon".into(), Value::from(icon));
        self
    }

    pub fn with_environment(mut self, environment: &str) -> Self {
        self.root.insert("environment".into(), Value::from(environment));
        self
    }

    pub fn with_contact(mut self, key: &str, url: &str) -> Self {
        let contact = self
            .root
            .entry("contact")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(contact) = contact {
            contact.insert(key.to_string(), Value::from(url));
        }
        self
    }

    pub fn with_entrypoint(mut self, key: &str, reference: &str) -> Self {
        let entrypoints = self
            .root
            .entry("entrypoints")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(entrypoints) = entrypoints {
            let list = entrypoints
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = list {
                list.push(Value::from(reference));
            }
        }
        self
    }

    pub fn with_access_widener(mut self, path: &str) -> Self {
        self.root.insert("accessWidener".into(), Value::from(path));
        self
    }

    pub fn with_mixins(mut self, configs: &[String]) -> Self {
        self.root.insert("mixins".into(), Value::from(configs.to_vec()));
        self
    }

    /// Add a dependency edge. Fabric dependency edges carry no side marker.
    pub fn with_depend(self, id: &str, range: &str) -> Self {
        self.with_edge("depends", id, range)
    }

    pub fn with_recommend(self, id: &str, range: &str) -> Self {
        self.with_edge("recommends", id, range)
    }

    pub fn with_break(self, id: &str, range: &str) -> Self {
        self.with_edge("breaks", id, range)
    }

    fn with_edge(mut self, kind: &str, id: &str, range: &str) -> Self {
        let edges = self
            .root
            .entry(kind)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(edges) = edges {
            edges.insert(id.to_string(), Value::from(range));
        }
        self
    }

    /// Point the descriptor at a nested jar.
    pub fn with_jar(mut self, path: &str) -> Self {
        let jars = self
            .root
            .entry("jars")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(jars) = jars {
            let mut pointer = Map::new();
            pointer.insert("file".into(), Value::from(path));
            jars.push(Value::Object(pointer));
        }
        self
    }

    /// Replace the embedded `custom.modmenu` block wholesale.
    pub fn with_mod_menu(mut self, block: Value) -> Self {
        let custom = self
            .root
            .entry("custom")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(custom) = custom {
            custom.insert("modmenu".into(), block);
        }
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.root.get("id").and_then(Value::as_str)
    }

    pub fn environment(&self) -> Option<&str> {
        self.root.get("environment").and_then(Value::as_str)
    }

    /// Clone of the embedded `custom.modmenu` block, when present.
    pub fn mod_menu(&self) -> Option<Value> {
        self.root
            .get("custom")
            .and_then(|custom| custom.get("modmenu"))
            .cloned()
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root).context("serializing fabric mod descriptor")
    }
}

/// Overwrite the three identity fields of a parsed descriptor in place.
///
/// Unrecognized fields and field order are untouched.
pub fn rewrite_identity(doc: &mut Value, id: &str, name: &str, description: &str) -> Result<()> {
    let Some(root) = doc.as_object_mut() else {
        bail!("fabric mod descriptor is not a JSON object");
    };
    root.insert("id".into(), Value::from(id));
    root.insert("name".into(), Value::from(name));
    root.insert("description".into(), Value::from(description));
    Ok(())
}

/// Record the parent back-reference inside the descriptor's embedded
/// `custom.modmenu` block, creating missing intermediate objects.
pub fn set_mod_menu_parent(doc: &mut Value, parent_id: &str, parent_name: &str) -> Result<()> {
    let Some(root) = doc.as_object_mut() else {
        bail!("fabric mod descriptor is not a JSON object");
    };
    let custom = root
        .entry("custom")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(custom) = custom.as_object_mut() else {
        bail!("descriptor field 'custom' is not a JSON object");
    };
    let modmenu = custom
        .entry("modmenu")
        .or_insert_with(|| Value::Object(Map::new()));
    let Some(modmenu) = modmenu.as_object_mut() else {
        bail!("descriptor field 'custom.modmenu' is not a JSON object");
    };
    let mut parent = Map::new();
    parent.insert("id".into(), Value::from(parent_id));
    parent.insert("name".into(), Value::from(parent_name));
    modmenu.insert("parent".into(), Value::Object(parent));
    Ok(())
}
