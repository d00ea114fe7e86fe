//! Directory-backed workstream source
//!
//! Workstreams are markdown files (`<dir>/*.md`) with YAML front matter:
//!
//! ```text
//! ---
//! ws_id: 00-001-02
//! feature: F001
//! status: backlog
//! depends_on: [00-001-01]
//! ---
//! ```
//!
//! When `depends_on` is absent, prerequisites are read from a markdown
//! dependency section (`Dependencies:`, `**Dependencies:**` or
//! `### Dependencies`) listing `- <id>` items.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{WorkstreamNode, WorkstreamSource};
use crate::error::{Result, SdpError};

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    ws_id: Option<String>,
    feature: Option<String>,
    status: Option<String>,
    depends_on: Option<Vec<String>>,
}

/// Loads workstreams from markdown files in one directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn markdown_files(&self) -> Result<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&self.dir.to_string_lossy());
        let pattern = format!("{}/*.md", base.trim_end_matches('/'));

        let paths = glob::glob(&pattern).map_err(|e| SdpError::WorkstreamParse {
            path: pattern.clone(),
            reason: e.to_string(),
        })?;

        let mut files = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => debug!(error = %e, "skipping unreadable workstream path"),
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl WorkstreamSource for DirectorySource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load_workstreams(&self, feature_id: &str) -> Result<Vec<WorkstreamNode>> {
        let mut workstreams = Vec::new();

        for path in self.markdown_files()? {
            let content = tokio::fs::read_to_string(&path).await?;
            let node = parse_workstream(&path.to_string_lossy(), &content)?;
            if node.feature != feature_id {
                continue;
            }
            workstreams.push(node);
        }

        if workstreams.is_empty() {
            return Err(SdpError::FeatureNotFound {
                feature_id: feature_id.to_string(),
            });
        }

        // Stable input order keeps the scheduler's tie-break deterministic
        workstreams.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(count = workstreams.len(), "loaded workstreams");
        Ok(workstreams)
    }
}

/// Parse one workstream markdown document.
///
/// `path` is only used for error messages.
pub fn parse_workstream(path: &str, content: &str) -> Result<WorkstreamNode> {
    let parse_err = |reason: &str| SdpError::WorkstreamParse {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let (front, body) = split_front_matter(content)
        .ok_or_else(|| parse_err("expected front matter between '---' delimiters"))?;

    let fm: FrontMatter = if front.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(front).map_err(|e| parse_err(&e.to_string()))?
    };

    let id = fm
        .ws_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| parse_err("missing required field: ws_id"))?;
    let feature = fm
        .feature
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| parse_err("missing required field: feature"))?;

    let prerequisites = match fm.depends_on {
        Some(deps) => deps,
        None => dependency_section(body),
    };

    Ok(WorkstreamNode {
        id,
        feature,
        status: fm.status.unwrap_or_default(),
        prerequisites,
    })
}

fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let rest = content.trim_start().strip_prefix("---")?;
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let rest = rest.strip_prefix('\n')?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn is_dependency_heading(line: &str) -> bool {
    line.starts_with("Dependencies:")
        || line.starts_with("**Dependencies:**")
        || line.starts_with("### Dependencies")
        || line.starts_with("###Dependencies")
}

/// Collect `- <id>` items under a dependency heading
fn dependency_section(body: &str) -> Vec<String> {
    let mut deps = Vec::new();
    let mut in_section = false;

    for line in body.lines() {
        let trimmed = line.trim();

        if is_dependency_heading(trimmed) {
            in_section = true;
            continue;
        }

        if in_section && (trimmed.starts_with("##") || trimmed.starts_with("**")) {
            if !trimmed.to_lowercase().contains("dependencies") {
                in_section = false;
            }
            continue;
        }

        if !in_section {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-') {
            let dep = item
                .split_whitespace()
                .next()
                .unwrap_or("")
                .trim_matches(|c| c == '`' || c == ',');
            if !dep.is_empty() && !dep.eq_ignore_ascii_case("none") {
                deps.push(dep.to_string());
            }
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WITH_DEPENDS_ON: &str = "---\nws_id: 00-001-02\nfeature: F001\nstatus: backlog\ndepends_on:\n  - 00-001-01\n---\n\n## Goal\nBuild it\n";

    #[test]
    fn test_parse_front_matter_depends_on() {
        let node = parse_workstream("x.md", WITH_DEPENDS_ON).unwrap();
        assert_eq!(node.id, "00-001-02");
        assert_eq!(node.feature, "F001");
        assert_eq!(node.status, "backlog");
        assert_eq!(node.prerequisites, vec!["00-001-01".to_string()]);
    }

    #[test]
    fn test_parse_dependency_section() {
        let doc = "---\nws_id: 00-001-03\nfeature: F001\n---\n\n### Dependencies\n\n- `00-001-01`\n- 00-001-02 (core model)\n\n## Goal\n- not-a-dep\n";
        let node = parse_workstream("x.md", doc).unwrap();
        assert_eq!(
            node.prerequisites,
            vec!["00-001-01".to_string(), "00-001-02".to_string()]
        );
    }

    #[test]
    fn test_parse_dependency_section_none() {
        let doc = "---\nws_id: a\nfeature: F\n---\n**Dependencies:**\n- None\n";
        let node = parse_workstream("x.md", doc).unwrap();
        assert!(node.prerequisites.is_empty());
    }

    #[test]
    fn test_parse_missing_required_fields() {
        let err = parse_workstream("x.md", "---\nfeature: F\n---\n").unwrap_err();
        assert!(err.to_string().contains("ws_id"));

        let err = parse_workstream("x.md", "---\nws_id: a\n---\n").unwrap_err();
        assert!(err.to_string().contains("feature"));
    }

    #[test]
    fn test_parse_without_front_matter() {
        let err = parse_workstream("plain.md", "# Just a heading\n").unwrap_err();
        assert_eq!(err.code(), "SDP-003");
        assert!(err.to_string().contains("plain.md"));
    }

    #[tokio::test]
    async fn test_directory_source_loads_feature_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("b.md"),
            "---\nws_id: b\nfeature: F1\ndepends_on: [a]\n---\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.md"), "---\nws_id: a\nfeature: F1\n---\n").unwrap();
        std::fs::write(dir.path().join("z.md"), "---\nws_id: z\nfeature: F2\n---\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = DirectorySource::new(dir.path());
        let nodes = source.load_workstreams("F1").await.unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_directory_source_feature_not_found() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "---\nws_id: a\nfeature: F1\n---\n").unwrap();

        let source = DirectorySource::new(dir.path());
        let err = source.load_workstreams("F9").await.unwrap_err();
        assert!(matches!(err, SdpError::FeatureNotFound { .. }));

        let empty = DirectorySource::new(dir.path().join("missing"));
        let err = empty.load_workstreams("F1").await.unwrap_err();
        assert!(matches!(err, SdpError::FeatureNotFound { .. }));
    }
}
