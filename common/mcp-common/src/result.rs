//! Result helpers for MCP tool responses
//!
//! Tools report failures to the host as error-flagged results carrying one
//! line of text rather than as protocol errors, so a failing upstream call
//! never surfaces as a raw transport exception.

use rmcp::model::{CallToolResult, Content, RawContent};

/// Create a successful plain text response
pub fn text_success(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Create an error-flagged response with a single `Error: <message>` line
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::error_text;
///
/// match lookup().await {
///     Ok(text) => Ok(text_success(text)),
///     Err(e) => Ok(error_text(e.to_string())),
/// }
/// ```
pub fn error_text(message: impl AsRef<str>) -> CallToolResult {
    let line = message.as_ref().lines().next().unwrap_or_default().trim();
    CallToolResult::error(vec![Content::text(format!("Error: {}", line))])
}

/// Extract the concatenated text content of a tool result
///
/// Useful for hosts embedding a server in-process and for tests.
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_success() {
        let result = text_success("hello world");
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result), "hello world");
    }

    #[test]
    fn test_error_text_is_flagged_and_single_line() {
        let result = error_text("upstream failed\nwith details");
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result_text(&result), "Error: upstream failed");
    }
}
