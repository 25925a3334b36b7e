//! Embeddable MCP trait for in-process execution
//!
//! [`EmbeddableMcp`] lets a host (or a test) drive an MCP server directly,
//! without a stdio transport in between.
//!
//! ```rust,ignore
//! use mcp_common::EmbeddableMcp;
//! use identity_mcp::IdentityMcpServer;
//!
//! let server = IdentityMcpServer::with_transport(&config, transport)?;
//! let names = server.tool_names();
//! let result = server
//!     .call_tool("check_address", serde_json::json!({ "address": "0xabc..." }))
//!     .await?;
//! ```

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Error type for embeddable MCP operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    /// Tool was not found in the server's current catalog
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the tool's input schema
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    /// MCP protocol error
    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

/// Result type for embeddable MCP operations
pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// Trait for MCP servers that can be executed in-process
///
/// Implementations dispatch `call_tool` to the same handlers their
/// `#[tool]` methods use, so embedded and stdio calls behave identically.
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Returns the server name for identification
    fn server_name(&self) -> &str;

    /// Returns the tools currently in the catalog
    fn list_tools(&self) -> Vec<Tool>;

    /// Executes a tool by name with JSON arguments
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    /// Names of the tools currently in the catalog
    fn tool_names(&self) -> Vec<String> {
        self.list_tools()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect()
    }

    /// Returns an optional description of the server
    fn server_description(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyServer;

    #[async_trait]
    impl EmbeddableMcp for EmptyServer {
        fn server_name(&self) -> &str {
            "empty"
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![]
        }

        async fn call_tool(&self, name: &str, _params: Value) -> EmbeddableResult<CallToolResult> {
            Err(EmbeddableError::ToolNotFound(name.to_string()))
        }
    }

    #[test]
    fn test_tool_names_empty() {
        assert!(EmptyServer.tool_names().is_empty());
        assert_eq!(EmptyServer.server_name(), "empty");
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = EmptyServer.call_tool("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
    }
}
