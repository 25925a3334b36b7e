//! Typed wrappers over the identity API endpoints

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::executor::RequestExecutor;
use super::transport::{ApiRequest, Transport};
use super::types::{AccountInfo, CheckResponse, DataResponse, PurchaseReceipt};
use crate::auth::AuthContext;
use crate::credits::CreditTracker;
use crate::error::IdentityResult;
use crate::notify::Notifier;

/// Lookup subject kind, selecting the query parameter and batch body key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Address,
    Handle,
}

impl LookupKind {
    /// Query parameter for single lookups
    pub fn query_param(self) -> &'static str {
        match self {
            LookupKind::Address => "address",
            LookupKind::Handle => "identity",
        }
    }

    /// Body key for batch requests, and result group key in responses
    pub fn batch_key(self) -> &'static str {
        match self {
            LookupKind::Address => "addresses",
            LookupKind::Handle => "twitters",
        }
    }

    pub fn noun(self, count: usize) -> &'static str {
        match (self, count) {
            (LookupKind::Address, 1) => "address",
            (LookupKind::Address, _) => "addresses",
            (LookupKind::Handle, 1) => "handle",
            (LookupKind::Handle, _) => "handles",
        }
    }
}

/// Which batch endpoint a request targets; also selects the response shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchResultKind {
    Check,
    Data,
}

impl BatchResultKind {
    pub fn path(self) -> &'static str {
        match self {
            BatchResultKind::Check => "/batch/check",
            BatchResultKind::Data => "/batch/data",
        }
    }
}

/// Credit packages offered by the purchase endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CreditPackage {
    Starter,
    Growth,
    Scale,
}

impl CreditPackage {
    pub fn as_str(self) -> &'static str {
        match self {
            CreditPackage::Starter => "starter",
            CreditPackage::Growth => "growth",
            CreditPackage::Scale => "scale",
        }
    }
}

/// Endpoint-level client for the identity API
#[derive(Clone)]
pub struct IdentityApi {
    executor: RequestExecutor,
    base_url: String,
}

impl IdentityApi {
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<AuthContext>,
        credits: Arc<CreditTracker>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            executor: RequestExecutor::new(transport, auth, credits),
            base_url: base_url.into(),
        }
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    pub fn auth(&self) -> &AuthContext {
        self.executor.auth()
    }

    pub fn credits(&self) -> &CreditTracker {
        self.executor.credits()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        notifier: &Notifier,
    ) -> IdentityResult<T> {
        let body = self.executor.execute(&request, notifier).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// `GET /check`
    pub async fn check(
        &self,
        kind: LookupKind,
        subject: &str,
        notifier: &Notifier,
    ) -> IdentityResult<CheckResponse> {
        let request = ApiRequest::get("/check").query(kind.query_param(), subject);
        self.fetch(request, notifier).await
    }

    /// `GET /data`
    pub async fn data(
        &self,
        kind: LookupKind,
        subject: &str,
        notifier: &Notifier,
    ) -> IdentityResult<DataResponse> {
        let request = ApiRequest::get("/data").query(kind.query_param(), subject);
        self.fetch(request, notifier).await
    }

    /// `POST /batch/check` or `POST /batch/data` for one chunk; the raw body
    /// is returned for normalization
    pub async fn batch(
        &self,
        endpoint: BatchResultKind,
        kind: LookupKind,
        items: &[String],
        notifier: &Notifier,
    ) -> IdentityResult<Value> {
        let mut body = Map::new();
        body.insert(kind.batch_key().to_string(), json!(items));
        let request = ApiRequest::post(endpoint.path(), Value::Object(body));
        self.executor.execute(&request, notifier).await
    }

    /// `GET /api/me`; the reported balance also feeds the tracker
    pub async fn account(&self, notifier: &Notifier) -> IdentityResult<AccountInfo> {
        let info: AccountInfo = self.fetch(ApiRequest::get("/api/me"), notifier).await?;
        self.executor.observe_credits(Some(info.credits), notifier);
        Ok(info)
    }

    /// `POST /api/credits/purchase`, paid through the x402 handshake
    pub async fn purchase(
        &self,
        package: CreditPackage,
        address: &str,
        notifier: &Notifier,
    ) -> IdentityResult<PurchaseReceipt> {
        let request = ApiRequest::post("/api/credits/purchase", json!({ "address": address }))
            .query("package", package.as_str());
        self.fetch(request, notifier).await
    }
}
