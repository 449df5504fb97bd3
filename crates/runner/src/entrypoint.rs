//! Container entrypoint generation
//!
//! The entrypoint is rendered from a fixed template with three
//! substitution points: the agent name, the MCP configuration commands,
//! and the rootless-daemon permission recovery block. Every interpolated
//! value goes through shell quoting; the MCP section is assembled as a
//! token list first and only then turned into shell text.

use rover_core::agent::AgentKind;
use rover_core::config::McpServerConfig;
use rover_core::Error;

use crate::error::{Result, RunnerError};

const ENTRYPOINT_TEMPLATE: &str = r#"#!/bin/sh
# Generated by rover. Do not edit.
set -eu

{{PERMISSION_RECOVERY}}
# Register MCP servers for the agent before the workflow starts.
{{MCP_SETUP}}

cd /workspace
rover-agent run --agent {{AGENT}} --inputs /output/inputs.json --output-dir /output
"#;

const PERMISSION_RECOVERY: &str = r#"restore_ownership() {
    chown -R root:root /workspace /output || true
}
trap restore_ownership EXIT
"#;

/// What to render into the entrypoint script
#[derive(Debug)]
pub struct EntrypointSpec<'a> {
    pub agent: AgentKind,
    pub mcp_servers: &'a [McpServerConfig],
    /// Daemon runs rootless: restore root ownership of the mounts on exit
    pub rootless: bool,
}

/// Render the entrypoint script text
pub fn render_entrypoint(spec: &EntrypointSpec<'_>) -> Result<String> {
    let mcp_setup = mcp_setup_commands(spec.mcp_servers)?.join("\n");
    let recovery = if spec.rootless { PERMISSION_RECOVERY } else { "" };

    Ok(ENTRYPOINT_TEMPLATE
        .replace("{{PERMISSION_RECOVERY}}", recovery)
        .replace("{{MCP_SETUP}}", &mcp_setup)
        .replace("{{AGENT}}", spec.agent.as_str()))
}

/// Build one `rover-agent config mcp` shell command per configured
/// server. With no servers a no-op echo keeps the script well-formed.
pub fn mcp_setup_commands(servers: &[McpServerConfig]) -> Result<Vec<String>> {
    if servers.is_empty() {
        return Ok(vec![quote_command(&[
            "echo",
            "No MCP servers configured",
        ])?]);
    }

    let mut commands = Vec::with_capacity(servers.len());
    for server in servers {
        let endpoint = server.endpoint().ok_or_else(|| {
            RunnerError::Core(Error::InvalidInput(format!(
                "MCP server '{}' has neither url nor command",
                server.name
            )))
        })?;

        let mut tokens: Vec<String> = vec![
            "rover-agent".into(),
            "config".into(),
            "mcp".into(),
            server.name.clone(),
            endpoint.to_string(),
        ];
        if let Some(transport) = &server.transport {
            tokens.push("--transport".into());
            tokens.push(transport.clone());
        }
        for (key, value) in &server.env {
            tokens.push("--env".into());
            tokens.push(format!("{}={}", key, value));
        }
        for (key, value) in &server.headers {
            tokens.push("--header".into());
            tokens.push(format!("{}: {}", key, value));
        }

        let token_refs: Vec<&str> = tokens.iter().map(String::as_str).collect();
        commands.push(quote_command(&token_refs)?);
    }
    Ok(commands)
}

fn quote_command(tokens: &[&str]) -> Result<String> {
    let mut quoted = Vec::with_capacity(tokens.len());
    for token in tokens {
        let q = shlex::try_quote(token).map_err(|_| {
            RunnerError::Core(Error::InvalidInput(format!(
                "Value contains a NUL byte and cannot be shell-quoted: {:?}",
                token
            )))
        })?;
        quoted.push(q.into_owned());
    }
    Ok(quoted.join(" "))
}
