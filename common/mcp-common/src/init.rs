//! Server initialization utilities
//!
//! Tracing setup and the stdio serving loop shared by MCP server binaries.

use rmcp::{ServerHandler, ServiceExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging for MCP servers
///
/// Logs go to stderr (stdout is reserved for MCP protocol) with:
/// - Environment-based filtering via RUST_LOG
/// - Default log level of `info` for the specified crate
///
/// Set `LOG_FORMAT=json` for structured JSON output.
/// Default is human-readable text output without ANSI colors.
///
/// # Example
///
/// ```rust,ignore
/// mcp_common::init_tracing("identity_mcp")?;
/// ```
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let directive = format!("{}=info", crate_name);
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let registry = tracing_subscriber::registry().with(filter);

    if json_logs_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}

fn json_logs_requested(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Serve an already-constructed MCP server over stdio until the host disconnects
///
/// Servers that need configuration before they can be built construct
/// themselves in `main` and hand the result over here.
///
/// # Example
///
/// ```rust,ignore
/// let server = IdentityMcpServer::new(&config)?;
/// mcp_common::serve_stdio(server, "identity_mcp").await
/// ```
pub async fn serve_stdio<S>(server: S, name: &str) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    let service = server.serve(rmcp::transport::stdio()).await?;

    tracing::info!(server = name, "Server running, waiting for requests...");

    service.waiting().await?;

    tracing::info!(server = name, "Server shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber itself can only be installed once per process,
    // so only the format switch is covered here.
    #[test]
    fn test_json_format_detection() {
        assert!(json_logs_requested(Some("json")));
        assert!(json_logs_requested(Some("JSON")));
        assert!(!json_logs_requested(Some("text")));
        assert!(!json_logs_requested(None));
    }
}
