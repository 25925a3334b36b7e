//! Identity MCP Library
//!
//! MCP-compatible tools for looking up the social identities behind crypto
//! addresses, and the addresses behind Twitter handles.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use identity_mcp::{Config, IdentityMcpServer};
//! use mcp_common::EmbeddableMcp;
//!
//! let server = IdentityMcpServer::new(&Config::default())?;
//! let result = server
//!     .call_tool("check_twitter", serde_json::json!({ "handle": "@vitalikbuterin" }))
//!     .await?;
//! ```
//!
//! # Features
//! - Lookups: single and batch, by address or handle
//! - Access: API key with credit tracking and alerts, or x402 pay-per-call
//!   with a Base USDC wallet
//! - Resources: service info, pricing, session status
//! - Prompts: address and handle investigations, bulk lookups

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod credits;
pub mod error;
pub mod format;
pub mod handlers;
pub mod notify;
pub mod params;
pub mod payment;
pub mod prompts;
pub mod resources;
pub mod server;
pub mod subject;

// Re-export main server type
pub use config::{Cli, Config};
pub use error::{IdentityError, IdentityResult};
pub use server::IdentityMcpServer;

// Re-export parameter types for direct API usage
pub use params::*;
