//! Access widener to access transformer conversion.
//!
//! The Fabric toolchain widens member access through an `.accesswidener`
//! document; NeoForge reads an `accesstransformer.cfg` instead. The NeoForge
//! flavoured jar therefore carries a converted copy of the runtime jar's
//! widener.
//!
//! Mapping:
//!
//! | widener directive     | transformer access |
//! |-----------------------|--------------------|
//! | `accessible class`    | `public`           |
//! | `extendable class`    | `public-f`         |
//! | `accessible method`   | `public`           |
//! | `extendable method`   | `protected-f`      |
//! | `accessible field`    | `public`           |
//! | `mutable field`       | `public-f`         |

use anyhow::{bail, Result};

/// Convert an access widener document into access transformer lines.
///
/// `transitive-` prefixes are accepted and treated as their plain
/// counterpart; comments and blank lines are dropped. Malformed lines fail
/// with their line number so the upstream document can be fixed.
pub fn convert_access_widener(source: &str) -> Result<String> {
    let mut lines = Vec::new();
    let mut saw_header = false;

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !saw_header {
            let mut header = line.split_whitespace();
            if header.next() != Some("accessWidener") {
                bail!("line {}: missing accessWidener header", index + 1);
            }
            match header.next() {
                Some("v1") | Some("v2") => {}
                Some(version) => {
                    bail!("line {}: unsupported accessWidener version '{version}'", index + 1)
                }
                None => bail!("line {}: accessWidener header has no version", index + 1),
            }
            if header.next().is_none() {
                bail!("line {}: accessWidener header has no namespace", index + 1);
            }
            saw_header = true;
            continue;
        }
        lines.push(convert_line(index + 1, line)?);
    }

    if !saw_header {
        bail!("access widener document has no header");
    }
    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}

fn convert_line(line_number: usize, line: &str) -> Result<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [access, kind, rest @ ..] = tokens.as_slice() else {
        bail!("line {line_number}: incomplete access widener entry");
    };
    let access = access.strip_prefix("transitive-").unwrap_or(access);

    match (*kind, rest) {
        ("class", [class]) => {
            let modifier = match access {
                "accessible" => "public",
                "extendable" => "public-f",
                other => bail!("line {line_number}: invalid class access '{other}'"),
            };
            Ok(format!("{modifier} {}", dotted(class)))
        }
        ("method", [class, name, descriptor]) => {
            let modifier = match access {
                "accessible" => "public",
                "extendable" => "protected-f",
                other => bail!("line {line_number}: invalid method access '{other}'"),
            };
            Ok(format!("{modifier} {} {name}{descriptor}", dotted(class)))
        }
        ("field", [class, name, _descriptor]) => {
            let modifier = match access {
                "accessible" => "public",
                "mutable" => "public-f",
                other => bail!("line {line_number}: invalid field access '{other}'"),
            };
            Ok(format!("{modifier} {} {name}", dotted(class)))
        }
        _ => bail!("line {line_number}: malformed access widener entry '{line}'"),
    }
}

fn dotted(class: &str) -> String {
    class.replace('/', ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_every_directive_kind() {
        let source = "\
accessWidener v2 named
# widened for the packing pipeline
accessible class net/minecraft/client/Minecraft
extendable class net/minecraft/client/renderer/LevelRenderer
accessible method net/minecraft/client/Minecraft getInstance ()Lnet/minecraft/client/Minecraft;
extendable method net/minecraft/client/Camera setup (F)V
accessible field net/minecraft/client/Minecraft level Lnet/minecraft/client/multiplayer/ClientLevel;
mutable field net/minecraft/world/entity/Entity position Lnet/minecraft/world/phys/Vec3;
";
        let output = convert_access_widener(source).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "public net.minecraft.client.Minecraft",
                "public-f net.minecraft.client.renderer.LevelRenderer",
                "public net.minecraft.client.Minecraft getInstance()Lnet/minecraft/client/Minecraft;",
                "protected-f net.minecraft.client.Camera setup(F)V",
                "public net.minecraft.client.Minecraft level",
                "public-f net.minecraft.world.entity.Entity position",
            ]
        );
    }

    #[test]
    fn test_transitive_prefix_is_stripped() {
        let source = "accessWidener v2 named\ntransitive-accessible class a/b/C\n";
        assert_eq!(convert_access_widener(source).unwrap(), "public a.b.C\n");
    }

    #[test]
    fn test_missing_header_fails() {
        let err = convert_access_widener("accessible class a/b/C\n").unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn test_invalid_directive_reports_line() {
        let source = "accessWidener v2 named\nmutable class a/b/C\n";
        let err = convert_access_widener(source).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_unsupported_version_fails() {
        let err = convert_access_widener("accessWidener v9 named\n").unwrap_err();
        assert!(err.to_string().contains("v9"));
    }
}
