//! Agent registry
//!
//! The set of supported agents is closed: resolution goes through an
//! explicit match on this enum, never free-form string dispatch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Supported coding agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Claude,
    Codex,
    Cursor,
    Gemini,
    Qwen,
}

impl AgentKind {
    /// Resolve an agent by name
    pub fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            "cursor" | "cursor-agent" => Ok(Self::Cursor),
            "gemini" => Ok(Self::Gemini),
            "qwen" => Ok(Self::Qwen),
            _ => Err(Error::UnknownAgent(s.to_string())),
        }
    }

    /// Canonical agent name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Cursor => "cursor",
            Self::Gemini => "gemini",
            Self::Qwen => "qwen",
        }
    }

    /// Binary the agent exposes inside the container
    pub fn command(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
            Self::Cursor => "cursor-agent",
            Self::Gemini => "gemini",
            Self::Qwen => "qwen",
        }
    }

    /// Arguments for a cheap availability probe of the agent binary
    pub fn check_args(&self) -> &'static [&'static str] {
        &["--version"]
    }

    /// Host credential directories mounted into the container, as
    /// `(host, container)` pairs relative to the respective home.
    pub fn container_mounts(&self, home: &Path) -> Vec<(PathBuf, PathBuf)> {
        let dirs: &[&str] = match self {
            Self::Claude => &[".claude"],
            Self::Codex => &[".codex"],
            Self::Cursor => &[".cursor"],
            Self::Gemini => &[".gemini"],
            Self::Qwen => &[".qwen"],
        };
        dirs.iter()
            .map(|d| (home.join(d), PathBuf::from("/root").join(d)))
            .collect()
    }

    /// All supported agents
    pub fn all() -> &'static [AgentKind] {
        &[
            Self::Claude,
            Self::Codex,
            Self::Cursor,
            Self::Gemini,
            Self::Qwen,
        ]
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_known_agents() {
        assert_eq!(AgentKind::from_str("claude").unwrap(), AgentKind::Claude);
        assert_eq!(AgentKind::from_str("Codex").unwrap(), AgentKind::Codex);
        assert_eq!(
            AgentKind::from_str("cursor-agent").unwrap(),
            AgentKind::Cursor
        );
        assert_eq!(AgentKind::from_str(" qwen ").unwrap(), AgentKind::Qwen);
    }

    #[test]
    fn test_from_str_unknown_agent() {
        assert!(matches!(
            AgentKind::from_str("copilot"),
            Err(Error::UnknownAgent(_))
        ));
    }

    #[test]
    fn test_round_trip_names() {
        for kind in AgentKind::all() {
            assert_eq!(AgentKind::from_str(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_container_mounts() {
        let mounts = AgentKind::Claude.container_mounts(Path::new("/home/dev"));
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].0, PathBuf::from("/home/dev/.claude"));
        assert_eq!(mounts[0].1, PathBuf::from("/root/.claude"));
    }
}
