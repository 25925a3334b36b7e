//! Protocol-level error helpers
//!
//! These produce `rmcp::ErrorData` for requests the server cannot interpret
//! at all, such as an unknown resource URI. Failures of a well-formed tool
//! call are reported through [`crate::error_text`] instead.

use rmcp::ErrorData as McpError;

/// Create a resource-not-found error carrying the requested URI
pub fn resource_not_found(uri: &str) -> McpError {
    McpError::resource_not_found(
        format!("unknown resource: {}", uri),
        Some(serde_json::json!({ "uri": uri })),
    )
}
