//! Identity MCP Server
//!
//! Exposes identity lookups (crypto address <-> social handle) to MCP hosts
//! over stdio.
//!
//! # Access
//! - `IDENTITY_API_KEY`: credit-based access
//! - `IDENTITY_PRIVATE_KEY`: x402 pay-per-call from a Base USDC wallet

use clap::Parser;
use identity_mcp::{Cli, Config, IdentityMcpServer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mcp_common::init_tracing("identity_mcp")?;

    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    let server = IdentityMcpServer::new(&config)?;

    tracing::info!(
        api_url = %config.api.url,
        auth_mode = %server.auth_mode(),
        "Starting Identity MCP Server"
    );
    mcp_common::serve_stdio(server, "identity_mcp").await
}
