//! MCP Common - Shared plumbing for MCP servers
//!
//! - **Initialization**: [`init_tracing`] and [`serve_stdio`]
//! - **Results**: `CallToolResult` builders, including the single-line
//!   `Error: <message>` result used as the tool error boundary
//! - **Errors**: protocol-level `ErrorData` helpers
//! - **Embeddable**: [`EmbeddableMcp`] for in-process execution

pub mod embeddable;
pub mod error;
pub mod init;
pub mod result;

// Re-export commonly used items at crate root
pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use error::resource_not_found;
pub use init::{init_tracing, serve_stdio};
pub use result::{error_text, result_text, text_success};

// Re-export rmcp types that are commonly needed
pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

// Re-export async_trait for implementing EmbeddableMcp
pub use async_trait::async_trait;
