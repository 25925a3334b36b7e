//! Handler implementations for identity MCP tools
//!
//! Organized by domain: lookup (single and batch), account (credits).
//! Handlers are shared by the `#[tool]` methods and the embedded dispatch,
//! so both paths produce identical results.

mod account;
mod lookup;

pub use account::*;
pub use lookup::*;

use mcp_common::{error_text, text_success, CallToolResult, McpError};
use tracing::warn;

use crate::error::IdentityResult;

/// Tool error boundary: failures become a single `Error: <message>` line
/// flagged as an error result, never a protocol error
pub fn respond(result: IdentityResult<String>) -> Result<CallToolResult, McpError> {
    Ok(match result {
        Ok(text) => text_success(text),
        Err(e) => {
            warn!(error = %e, "tool call failed");
            error_text(e.to_string())
        }
    })
}
