//! Lookup parameter types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for single address lookups
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AddressParams {
    #[schemars(description = "Crypto address (0x followed by 40 hex digits)")]
    pub address: String,
}

/// Parameters for single Twitter handle lookups
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TwitterParams {
    #[schemars(description = "Twitter handle, with or without the leading @ (e.g., '@vitalikbuterin')")]
    pub handle: String,
}

/// Parameters for batch address lookups
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BatchAddressParams {
    #[schemars(description = "Addresses to look up. Any number; sent upstream in chunks of 50")]
    pub addresses: Vec<String>,
}

/// Parameters for batch Twitter handle lookups
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BatchTwitterParams {
    #[schemars(description = "Twitter handles to look up. Any number; sent upstream in chunks of 50")]
    pub handles: Vec<String>,
}
