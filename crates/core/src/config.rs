//! Project configuration (`rover.json`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::{Error, Result};

fn default_agent() -> String {
    "claude".to_string()
}

fn default_image() -> String {
    "rover-runtime:latest".to_string()
}

/// An MCP server the agent should be configured with inside the container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    /// Remote server URL (http/sse transports)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Local command (stdio transport)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpServerConfig {
    /// The endpoint the agent connects to: URL for remote transports,
    /// command line for stdio.
    pub fn endpoint(&self) -> Option<&str> {
        self.url.as_deref().or(self.command.as_deref())
    }
}

/// Project-level configuration, read from `rover.json` at the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_agent")]
    pub agent: String,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default)]
    pub mcp_servers: Vec<McpServerConfig>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            agent: default_agent(),
            image: default_image(),
            mcp_servers: Vec::new(),
        }
    }
}

impl ProjectConfig {
    /// Load the configuration from `<root>/rover.json`.
    ///
    /// A missing file yields the defaults; a malformed file is an error.
    pub async fn load(root: &Path) -> Result<Self> {
        let path = root.join("rover.json");
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        serde_json::from_str(&content)
            .map_err(|e| Error::InvalidInput(format!("Failed to parse rover.json: {}", e)))
    }
}
