//! Release metadata helpers: version classification, changelog extraction,
//! and README rewriting for distribution-platform bodies.

use std::fmt;

/// Release channel classification derived from the version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionType {
    Release,
    Beta,
    Alpha,
}

impl VersionType {
    /// Classify a mod version string by its pre-release markers.
    pub fn classify(version: &str) -> Self {
        let version = version.to_ascii_lowercase();
        if version.contains("alpha") {
            VersionType::Alpha
        } else if version.contains("beta") || version.contains("-pre") || version.contains("-rc") {
            VersionType::Beta
        } else {
            VersionType::Release
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionType::Release => "release",
            VersionType::Beta => "beta",
            VersionType::Alpha => "alpha",
        }
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short display tag for a game version: `x.y.0` releases shorten to `x.y`,
/// everything else passes through.
pub fn mc_version_tag(version: &str) -> &str {
    match version.strip_suffix(".0") {
        Some(short) if short.contains('.') => short,
        _ => version,
    }
}

/// Extract the changelog section for one version from a Markdown changelog.
///
/// The section is the text between the `##` heading containing the version
/// and the next `##` heading, without the heading itself. Returns `None`
/// when no heading matches, which disables publishing rather than failing
/// the build.
pub fn extract_changelog(markdown: &str, version: &str) -> Option<String> {
    let mut section = String::new();
    let mut in_section = false;

    for line in markdown.lines() {
        let is_heading = line.starts_with("## ");
        if in_section && is_heading {
            break;
        }
        if in_section {
            section.push_str(line);
            section.push('\n');
        } else if is_heading && line.split_whitespace().any(|token| token == version) {
            in_section = true;
        }
    }

    if !in_section {
        return None;
    }
    Some(section.trim().to_string())
}

/// Rewrite relative Markdown link and image targets against a base URL.
///
/// Platform bodies are rendered far away from the repository, so relative
/// targets (`images/screenshot.png`) must become absolute. Absolute URLs,
/// fragment links, and `mailto:` targets are untouched.
pub fn rewrite_relative_links(markdown: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut output = String::with_capacity(markdown.len());
    let mut rest = markdown;

    while let Some(start) = rest.find("](") {
        let target_start = start + 2;
        let Some(length) = rest[target_start..].find(')') else {
            break;
        };
        let target = &rest[target_start..target_start + length];
        output.push_str(&rest[..target_start]);
        if is_relative_target(target) {
            // an optional `"title"` suffix stays behind the rewritten target
            let (path, title) = match target.split_once(' ') {
                Some((path, title)) => (path, Some(title)),
                None => (target, None),
            };
            output.push_str(base);
            output.push('/');
            output.push_str(path.trim_start_matches("./"));
            if let Some(title) = title {
                output.push(' ');
                output.push_str(title);
            }
        } else {
            output.push_str(target);
        }
        rest = &rest[target_start + length..];
    }
    output.push_str(rest);
    output
}

fn is_relative_target(target: &str) -> bool {
    !(target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with('#')
        || target.starts_with("mailto:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_classification() {
        assert_eq!(VersionType::classify("4.0.0"), VersionType::Release);
        assert_eq!(VersionType::classify("4.0.0-beta.2"), VersionType::Beta);
        assert_eq!(VersionType::classify("4.0.0-pre1"), VersionType::Beta);
        assert_eq!(VersionType::classify("4.0.0-rc.1"), VersionType::Beta);
        assert_eq!(VersionType::classify("4.1.0-alpha.5"), VersionType::Alpha);
        assert_eq!(VersionType::Beta.to_string(), "beta");
    }

    #[test]
    fn test_mc_version_tag() {
        assert_eq!(mc_version_tag("1.21.0"), "1.21");
        assert_eq!(mc_version_tag("1.21.7"), "1.21.7");
        assert_eq!(mc_version_tag("24w33a"), "24w33a");
    }

    #[test]
    fn test_extract_changelog_picks_matching_section() {
        let changelog = "\
# Changelog

## 4.1.0

- new things

## 4.0.0

- initial multi-loader release
- fixed lights

## 3.9.0

- old
";
        let section = extract_changelog(changelog, "4.0.0").unwrap();
        assert_eq!(section, "- initial multi-loader release\n- fixed lights");
        assert!(extract_changelog(changelog, "9.9.9").is_none());
    }

    #[test]
    fn test_rewrite_relative_links() {
        let markdown = "\
![screenshot](images/screenshot.png)
[docs](https://example.invalid/docs) [section](#usage)
[guide](docs/guide.md \"The guide\")
";
        let rewritten =
            rewrite_relative_links(markdown, "https://raw.example.invalid/repo/main/");
        assert!(rewritten.contains("](https://raw.example.invalid/repo/main/images/screenshot.png)"));
        assert!(rewritten.contains("](https://example.invalid/docs)"));
        assert!(rewritten.contains("](#usage)"));
        assert!(rewritten
            .contains("](https://raw.example.invalid/repo/main/docs/guide.md \"The guide\")"));
    }
}
