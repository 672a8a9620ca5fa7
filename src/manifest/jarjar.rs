//! Jar-in-jar metadata (`META-INF/jarjar/metadata.json`) merging.
//!
//! Fragments produced per dependency collector are merged into one
//! consolidated index per output artifact. Entries are append-only; the only
//! in-place mutation is a targeted identifier rewrite when a nested artifact
//! is re-labelled.

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

/// One nested-jar index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedJarEntry {
    pub group: String,
    pub artifact: String,
    /// Maven-style version range, e.g. `[4.0.0,)`.
    pub range: String,
    pub artifact_version: String,
    /// Entry path of the nested jar inside the carrying archive.
    pub path: String,
    pub obfuscated: bool,
}

impl NestedJarEntry {
    fn to_value(&self) -> Value {
        let mut identifier = Map::new();
        identifier.insert("group".into(), Value::from(self.group.as_str()));
        identifier.insert("artifact".into(), Value::from(self.artifact.as_str()));

        let mut version = Map::new();
        version.insert("range".into(), Value::from(self.range.as_str()));
        version.insert(
            "artifactVersion".into(),
            Value::from(self.artifact_version.as_str()),
        );

        let mut entry = Map::new();
        entry.insert("identifier".into(), Value::Object(identifier));
        entry.insert("version".into(), Value::Object(version));
        entry.insert("path".into(), Value::from(self.path.as_str()));
        entry.insert("isObfuscated".into(), Value::Bool(self.obfuscated));
        Value::Object(entry)
    }
}

/// A consolidated nested-jar metadata document.
#[derive(Debug, Clone, Default)]
pub struct NestedJarIndex {
    jars: Vec<Value>,
}

impl NestedJarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a metadata document or fragment.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).context("parsing nested-jar metadata")?;
        let Some(root) = value.as_object() else {
            bail!("nested-jar metadata is not a JSON object");
        };
        let Some(jars) = root.get("jars").and_then(Value::as_array) else {
            bail!("nested-jar metadata has no 'jars' array");
        };
        Ok(Self { jars: jars.clone() })
    }

    pub fn len(&self) -> usize {
        self.jars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jars.is_empty()
    }

    /// Append one entry. Re-appending an entry identical to one already
    /// present is a no-op, which makes repeated merges of the same fragment
    /// idempotent.
    pub fn append(&mut self, entry: &NestedJarEntry) {
        self.append_value(entry.to_value());
    }

    fn append_value(&mut self, value: Value) {
        if !self.jars.contains(&value) {
            self.jars.push(value);
        }
    }

    /// Merge every entry of another index into this one, preserving order
    /// and skipping exact duplicates.
    pub fn merge_from(&mut self, other: &NestedJarIndex) {
        for entry in &other.jars {
            self.append_value(entry.clone());
        }
    }

    /// Replace the artifact name of entries whose identifier matches
    /// `group` (and, when given, `artifact`). Group, version, and path are
    /// untouched. Returns the number of rewritten entries.
    pub fn rewrite_identifier(
        &mut self,
        group: &str,
        artifact: Option<&str>,
        new_artifact: &str,
    ) -> usize {
        let mut rewritten = 0;
        for entry in &mut self.jars {
            let Some(identifier) = entry
                .get_mut("identifier")
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            if identifier.get("group").and_then(Value::as_str) != Some(group) {
                continue;
            }
            if let Some(artifact) = artifact {
                if identifier.get("artifact").and_then(Value::as_str) != Some(artifact) {
                    continue;
                }
            }
            identifier.insert("artifact".into(), Value::from(new_artifact));
            rewritten += 1;
        }
        rewritten
    }

    /// Artifact names currently present, in entry order.
    pub fn artifacts(&self) -> Vec<&str> {
        self.jars
            .iter()
            .filter_map(|entry| {
                entry
                    .get("identifier")
                    .and_then(|identifier| identifier.get("artifact"))
                    .and_then(Value::as_str)
            })
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut root = Map::new();
        root.insert("jars".into(), Value::Array(self.jars.clone()));
        serde_json::to_string_pretty(&root).context("serializing nested-jar metadata")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(artifact: &str, path: &str) -> NestedJarEntry {
        NestedJarEntry {
            group: "dev.example".into(),
            artifact: artifact.into(),
            range: "[4.0.0,)".into(),
            artifact_version: "4.0.0".into(),
            path: path.into(),
            obfuscated: false,
        }
    }

    #[test]
    fn test_append_and_serialize() {
        let mut index = NestedJarIndex::new();
        index.append(&entry("dynlights-runtime-neoforge", "META-INF/jars/a.jar"));

        let text = index.to_json_string().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let jar = &value["jars"][0];
        assert_eq!(jar["identifier"]["group"], "dev.example");
        assert_eq!(jar["identifier"]["artifact"], "dynlights-runtime-neoforge");
        assert_eq!(jar["version"]["range"], "[4.0.0,)");
        assert_eq!(jar["version"]["artifactVersion"], "4.0.0");
        assert_eq!(jar["path"], "META-INF/jars/a.jar");
        assert_eq!(jar["isObfuscated"], false);
    }

    #[test]
    fn test_merge_is_append_safe() {
        let mut a = NestedJarIndex::new();
        a.append(&entry("alpha", "META-INF/jars/alpha.jar"));
        let mut b = NestedJarIndex::new();
        b.append(&entry("beta", "META-INF/jars/beta.jar"));

        a.merge_from(&b);
        assert_eq!(a.artifacts(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_repeated_merge_is_idempotent() {
        let mut consolidated = NestedJarIndex::new();
        let mut fragment = NestedJarIndex::new();
        fragment.append(&entry("alpha", "META-INF/jars/alpha.jar"));

        consolidated.merge_from(&fragment);
        consolidated.merge_from(&fragment);
        assert_eq!(consolidated.len(), 1);

        // a genuinely different version of the same artifact still appends
        fragment = NestedJarIndex::new();
        let mut newer = entry("alpha", "META-INF/jars/alpha.jar");
        newer.artifact_version = "4.1.0".into();
        fragment.append(&newer);
        consolidated.merge_from(&fragment);
        assert_eq!(consolidated.len(), 2);
    }

    #[test]
    fn test_rewrite_identifier_targets_exact_pair() {
        let mut index = NestedJarIndex::new();
        index.append(&entry("api", "META-INF/jars/api.jar"));
        index.append(&entry("runtime", "META-INF/jars/runtime.jar"));
        let mut foreign = entry("api", "META-INF/jars/other.jar");
        foreign.group = "org.other".into();
        index.append(&foreign);

        let rewritten = index.rewrite_identifier("dev.example", Some("api"), "dynlights-api");
        assert_eq!(rewritten, 1);
        assert_eq!(index.artifacts(), vec!["dynlights-api", "runtime", "api"]);

        // version and path untouched
        let text = index.to_json_string().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["jars"][0]["path"], "META-INF/jars/api.jar");
        assert_eq!(value["jars"][0]["version"]["artifactVersion"], "4.0.0");
    }

    #[test]
    fn test_rewrite_identifier_group_wide() {
        let mut index = NestedJarIndex::new();
        index.append(&entry("api", "META-INF/jars/api.jar"));
        let mut foreign = entry("lib", "META-INF/jars/lib.jar");
        foreign.group = "org.other".into();
        index.append(&foreign);

        let rewritten = index.rewrite_identifier("dev.example", None, "dynlights-api");
        assert_eq!(rewritten, 1);
        assert_eq!(index.artifacts(), vec!["dynlights-api", "lib"]);
    }

    #[test]
    fn test_parse_round_trip_preserves_unknown_entry_fields() {
        let source = r#"{"jars": [{"identifier": {"group": "g", "artifact": "a"},
            "version": {"range": "[1,)", "artifactVersion": "1"},
            "path": "META-INF/jars/a.jar", "isObfuscated": true, "extra": 42}]}"#;
        let index = NestedJarIndex::parse(source).unwrap();
        let text = index.to_json_string().unwrap();
        assert!(text.contains("\"extra\": 42"));
        assert!(text.contains("\"isObfuscated\": true"));
    }

    #[test]
    fn test_parse_rejects_missing_jars_array() {
        assert!(NestedJarIndex::parse("{}").is_err());
        assert!(NestedJarIndex::parse("[]").is_err());
    }
}
