//! Workspace diff engine
//!
//! Computes a structured view of a task workspace's changes: tracked
//! modifications against HEAD (or an arbitrary branch), plus untracked
//! files discovered through a status scan. Untracked files are filtered
//! by the repository's ignore rules because the scan goes through git
//! itself.

use std::path::Path;
use tracing::debug;

use crate::commands::{git_command, git_command_checked};
use crate::error::Result;

/// Options for a diff computation
#[derive(Debug, Clone, Default)]
pub struct DiffOptions {
    /// Restrict the diff to a single path, relative to the workspace
    pub file_path: Option<String>,
    /// Render a flat list of changed paths instead of diff bodies
    pub only_files: bool,
    /// Compare against this branch instead of the worktree's HEAD
    pub branch: Option<String>,
}

/// Where a change was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Known to git; includes renames and deletions
    Tracked,
    /// Present on disk but never added
    Untracked,
}

/// One changed file
#[derive(Debug, Clone)]
pub struct DiffEntry {
    /// Path relative to the workspace root
    pub path: String,
    pub kind: ChangeKind,
    /// Unified-diff body; `None` for binary content
    pub body: Option<String>,
}

/// Structured diff result
#[derive(Debug, Clone)]
pub struct DiffReport {
    pub entries: Vec<DiffEntry>,
    file_filter: Option<String>,
    only_files: bool,
}

impl DiffReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changed paths in discovery order
    pub fn changed_paths(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.path.as_str()).collect()
    }

    /// Render the report as human-readable text
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return match &self.file_filter {
                Some(path) => format!("No changes found for file: {}", path),
                None => "No changes found in workspace".to_string(),
            };
        }

        if self.only_files {
            let mut out = String::from("Changed Files\n");
            for path in self.changed_paths() {
                out.push_str("  ");
                out.push_str(path);
                out.push('\n');
            }
            return out;
        }

        let mut out = String::new();
        for entry in &self.entries {
            match &entry.body {
                Some(body) => {
                    out.push_str(body);
                    if !body.ends_with('\n') {
                        out.push('\n');
                    }
                }
                None => {
                    out.push_str(&format!("Binary file {} changed\n", entry.path));
                }
            }
        }
        out
    }
}

/// Compute the diff of a workspace.
///
/// Tracked changes come from `git diff` against the comparison target
/// (HEAD by default, or `options.branch`). Untracked files come from a
/// porcelain status scan, so gitignore rules — including nested ones —
/// apply. When `options.file_path` is set, only tracked changes are
/// consulted; an untracked file requested by explicit path reports as
/// "no changes" rather than showing its content.
pub async fn compute_diff(workspace: &Path, options: &DiffOptions) -> Result<DiffReport> {
    let target = options.branch.as_deref().unwrap_or("HEAD");

    let mut entries = Vec::new();

    let raw = match &options.file_path {
        Some(file) => git_command_checked(workspace, &["diff", target, "--", file]).await?,
        None => git_command_checked(workspace, &["diff", target]).await?,
    };
    entries.extend(parse_tracked_chunks(&raw));

    if options.file_path.is_none() {
        entries.extend(scan_untracked(workspace).await?);
    }

    debug!(
        "Diff of {:?} against {}: {} changed file(s)",
        workspace,
        target,
        entries.len()
    );

    Ok(DiffReport {
        entries,
        file_filter: options.file_path.clone(),
        only_files: options.only_files,
    })
}

/// Split raw `git diff` output into per-file entries, preserving the
/// native rename/delete/binary notation inside each body.
fn parse_tracked_chunks(raw: &str) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    let mut current: Option<(String, String)> = None;

    for line in raw.lines() {
        if line.starts_with("diff --git ") {
            if let Some((path, body)) = current.take() {
                entries.push(DiffEntry {
                    path,
                    kind: ChangeKind::Tracked,
                    body: Some(body),
                });
            }
            let path = path_from_header(line).unwrap_or_default();
            current = Some((path, format!("{}\n", line)));
        } else if let Some((_, ref mut body)) = current {
            body.push_str(line);
            body.push('\n');
        }
    }
    if let Some((path, body)) = current {
        entries.push(DiffEntry {
            path,
            kind: ChangeKind::Tracked,
            body: Some(body),
        });
    }

    entries
}

/// Extract the post-image path from a `diff --git a/... b/...` header
fn path_from_header(line: &str) -> Option<String> {
    let rest = line.strip_prefix("diff --git ")?;
    let pos = rest.rfind(" b/")?;
    Some(rest[pos + 3..].trim_matches('"').to_string())
}

/// Discover untracked files via `git status --porcelain -uall`.
///
/// Git applies the repository's ignore rules here, so ignored files
/// never reach the report.
async fn scan_untracked(workspace: &Path) -> Result<Vec<DiffEntry>> {
    let status = git_command_checked(workspace, &["status", "--porcelain", "-uall"]).await?;

    let mut entries = Vec::new();
    for line in status.lines() {
        let Some(path) = line.strip_prefix("?? ") else {
            continue;
        };
        let path = path.trim_matches('"').to_string();
        entries.push(untracked_entry(workspace, path).await?);
    }
    Ok(entries)
}

async fn untracked_entry(workspace: &Path, path: String) -> Result<DiffEntry> {
    let bytes = tokio::fs::read(workspace.join(&path)).await?;

    let body = match String::from_utf8(bytes) {
        Ok(content) => {
            let mut body = format!(
                "diff --git a/{path} b/{path}\nnew file mode 100644\n--- /dev/null\n+++ b/{path}\n"
            );
            for line in content.lines() {
                body.push('+');
                body.push_str(line);
                body.push('\n');
            }
            Some(body)
        }
        // Binary content: listed without a textual body
        Err(_) => None,
    };

    Ok(DiffEntry {
        path,
        kind: ChangeKind::Untracked,
        body,
    })
}

/// Verify that a branch reference resolves before diffing against it
pub async fn branch_ref_exists(workspace: &Path, branch: &str) -> Result<bool> {
    let output = git_command(workspace, &["rev-parse", "--verify", branch]).await?;
    Ok(output.success)
}
