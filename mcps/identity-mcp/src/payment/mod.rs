//! x402 payment challenge handling
//!
//! Wire types for the 402 challenge body and the `X-PAYMENT` header, plus
//! EIP-3009 authorization signing in [`authorization`].

pub mod authorization;

use serde::{Deserialize, Serialize};

pub use authorization::{build_payment_header, sign_authorization};

/// Header carrying the base64-encoded payment payload on retry
pub const PAYMENT_HEADER: &str = "X-PAYMENT";

/// One accepted payment option from a 402 response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: String,
    pub max_amount_required: String,
    pub pay_to: String,
    pub asset: String,
    #[serde(default = "default_timeout_seconds")]
    pub max_timeout_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    60
}

/// The 402 response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    #[serde(default = "default_x402_version")]
    pub x402_version: u32,
    #[serde(default)]
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_x402_version() -> u32 {
    1
}

/// The signed EIP-3009 fields, in wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationFields {
    pub from: String,
    pub to: String,
    pub value: String,
    pub valid_after: String,
    pub valid_before: String,
    pub nonce: String,
}

/// Signature plus the authorization it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactPayload {
    pub signature: String,
    pub authorization: AuthorizationFields,
}

/// Decoded form of the `X-PAYMENT` header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub x402_version: u32,
    pub scheme: String,
    pub network: String,
    pub payload: ExactPayload,
}
