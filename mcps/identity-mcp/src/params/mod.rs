//! Parameter types for identity MCP tools

mod account;
mod lookup;

pub use account::*;
pub use lookup::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Empty parameters for tools that take no arguments
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct EmptyParams {}
