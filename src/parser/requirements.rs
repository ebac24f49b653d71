//! requirements.txt diff parser (PEP 508)
//!
//! Reads the added (`+`) and removed (`-`) lines of a unified diff and turns each
//! pinned requirement into a [`DependencyChange`]. File header lines (`+++`, `---`),
//! context lines, comments and requirements without a version specifier are skipped.

use std::str::FromStr;

use indexmap::IndexMap;
use pep508_rs::{Requirement, VerbatimUrl, VersionOrUrl};
use tracing::debug;

use crate::parser::types::DependencyChange;

/// Side of the diff a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Old,
    New,
}

/// Parser for unified diffs of requirements files
#[derive(Debug, Default)]
pub struct RequirementsDiffParser;

impl RequirementsDiffParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a unified diff and return dependency changes in first-seen order.
    ///
    /// When a package occurs on the same side more than once, the later line
    /// overwrites the earlier version (last write wins).
    pub fn parse(&self, diff_content: &str) -> Vec<DependencyChange> {
        let mut changes: IndexMap<String, DependencyChange> = IndexMap::new();

        for line in diff_content.lines() {
            let Some((side, body)) = classify_line(line) else {
                continue;
            };

            let Some((name, version)) = parse_pinned_requirement(body) else {
                continue;
            };

            let change = changes
                .entry(name.clone())
                .or_insert_with(|| DependencyChange::new(&name, None, None));

            match side {
                Side::Old => change.old_version = Some(version),
                Side::New => change.new_version = Some(version),
            }
        }

        changes.into_values().collect()
    }
}

fn classify_line(line: &str) -> Option<(Side, &str)> {
    if let Some(body) = line.strip_prefix('+') {
        if body.starts_with('+') {
            return None;
        }
        return Some((Side::New, body));
    }

    if let Some(body) = line.strip_prefix('-') {
        if body.starts_with('-') {
            return None;
        }
        return Some((Side::Old, body));
    }

    None
}

/// Parse a requirement and return its name and the version of its first
/// specifier, spelled as written on the line
fn parse_pinned_requirement(body: &str) -> Option<(String, String)> {
    let body = body.trim();
    if body.is_empty() || body.starts_with('#') {
        return None;
    }

    let req = Requirement::<VerbatimUrl>::from_str(body)
        .inspect_err(|e| debug!("Skipping unparsable requirement '{}': {}", body, e))
        .ok()?;

    let Some(VersionOrUrl::VersionSpecifier(specifiers)) = &req.version_or_url else {
        return None;
    };

    // tags are matched against the literal text, so `2019.01.05` must not become `2019.1.5`
    let version = match first_specifier_version(body) {
        Some(raw) => raw.to_string(),
        None => specifiers.iter().next()?.version().to_string(),
    };

    Some((req.name.to_string(), version))
}

fn is_operator(c: char) -> bool {
    matches!(c, '=' | '<' | '>' | '!' | '~')
}

/// Version text of the first specifier of an already validated requirement
fn first_specifier_version(requirement: &str) -> Option<&str> {
    let specifiers = requirement.split(';').next()?;
    let start = specifiers.find(is_operator)?;
    let rest =
        specifiers[start..].trim_start_matches(|c: char| is_operator(c) || c.is_whitespace());
    let end = rest
        .find(|c: char| c == ',' || c == ')' || c.is_whitespace())
        .unwrap_or(rest.len());
    Some(&rest[..end]).filter(|version| !version.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_detects_version_update() {
        let diff = r#"
--- a/requirements.txt
+++ b/requirements.txt
@@ -1,1 +1,1 @@
-requests==2.25.1
+requests==2.26.0
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![DependencyChange::update("requests", "2.25.1", "2.26.0")]
        );
    }

    #[test]
    fn parse_detects_additions_and_removals() {
        let diff = r#"
--- a/requirements.txt
+++ b/requirements.txt
@@ -1,2 +1,2 @@
-flask==1.1.2
 six==1.16.0
+django==3.2.0
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![
                DependencyChange::new("flask", Some("1.1.2"), None),
                DependencyChange::new("django", None, Some("3.2.0")),
            ]
        );
    }

    #[test]
    fn parse_ignores_context_lines_and_file_headers() {
        let diff = r#"
--- a/README.md
+++ b/README.md
@@ -1,1 +1,1 @@
 requests==2.25.1
"#;

        assert!(RequirementsDiffParser::new().parse(diff).is_empty());
    }

    #[test]
    fn parse_skips_invalid_and_unpinned_lines() {
        let diff = r#"
-# a comment
+not a requirement !!
+requests
-
+numpy>=1.20
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![DependencyChange::new("numpy", None, Some("1.20"))]
        );
    }

    #[test]
    fn parse_keeps_last_write_for_duplicate_lines() {
        let diff = r#"
-requests==2.24.0
-requests==2.25.1
+requests==2.26.0
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![DependencyChange::update("requests", "2.25.1", "2.26.0")]
        );
    }

    #[test]
    fn parse_preserves_first_seen_order() {
        let diff = r#"
-zope==1.0
-attrs==20.0
+attrs==21.0
+zope==2.0
"#;

        let names: Vec<_> = RequirementsDiffParser::new()
            .parse(diff)
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["zope", "attrs"]);
    }

    #[test]
    fn parse_keeps_versions_as_written() {
        let diff = r#"
-certifi==2019.01.05
+certifi==2019.02.01
-tzdata==1.0.0-rc1
+tzdata==1.0.0-rc2
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![
                DependencyChange::update("certifi", "2019.01.05", "2019.02.01"),
                DependencyChange::update("tzdata", "1.0.0-rc1", "1.0.0-rc2"),
            ]
        );
    }

    #[test]
    fn parse_reads_first_specifier_past_extras_and_markers() {
        let diff = r#"
-requests[socks] >= 02.25 , <3 ; python_version >= "3.6"
+requests[socks] (==2.26.0)
"#;

        let changes = RequirementsDiffParser::new().parse(diff);

        assert_eq!(
            changes,
            vec![DependencyChange::update("requests", "02.25", "2.26.0")]
        );
    }

    #[test]
    fn first_specifier_version_returns_raw_text() {
        assert_eq!(first_specifier_version("pkg===1.0.0-RC1"), Some("1.0.0-RC1"));
        assert_eq!(first_specifier_version("pkg~=1.4.05,!=1.4.7"), Some("1.4.05"));
        assert_eq!(first_specifier_version("pkg"), None);
    }
}
