//! Response types for the single-item and account endpoints

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /check` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub exists: bool,
    /// Identity sources holding the subject (e.g. "twitter", "farcaster")
    #[serde(default)]
    pub types: Vec<String>,
}

/// Profile metadata attached to an identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
}

/// One linked identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farcaster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IdentityMetadata>,
}

/// Group of addresses the service believes share an owner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub addresses: Vec<String>,
}

/// Exact-subject form of the `/data` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub identities: Vec<IdentityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<Cluster>,
    /// Source descriptors; strings or objects depending on the source
    #[serde(default)]
    pub sources: Vec<Value>,
}

/// Search form of the `/data` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    pub results: Vec<IdentityRecord>,
    #[serde(default)]
    pub total_matches: u64,
}

/// `GET /data` response, in either of its shapes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataResponse {
    // Search first: it is the only shape with a required field
    Search(SearchData),
    Profile(ProfileData),
}

/// `GET /api/me` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub credits: u64,
    #[serde(default)]
    pub points: u64,
}

/// `POST /api/credits/purchase` response after payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    #[serde(default)]
    pub credits_added: u64,
    #[serde(default)]
    pub new_credits: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

/// Render a source descriptor as a short label
pub fn source_label(source: &Value) -> String {
    match source {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| source.to_string()),
        other => other.to_string(),
    }
}
