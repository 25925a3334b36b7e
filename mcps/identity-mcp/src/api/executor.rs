//! Authenticated request execution
//!
//! One logical request, executed according to the session's [`AuthMode`]:
//!
//! - **ApiKey**: a single request carrying `X-API-Key`; the
//!   `X-Credits-Remaining` hint on success feeds the credit tracker.
//! - **Payment**: an unauthenticated attempt; on `402 Payment Required` the
//!   challenge is answered with a signed authorization and the request is
//!   retried exactly once with `X-PAYMENT`.
//! - **None**: rejected before any I/O.

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument, warn};

use super::transport::{ApiRequest, ApiResponse, Transport};
use crate::auth::{AuthContext, AuthMode};
use crate::credits::{parse_credit_hint, CreditTracker};
use crate::error::{IdentityError, IdentityResult};
use crate::notify::{HostEvent, Notifier};
use crate::payment::{build_payment_header, PaymentRequiredBody, PAYMENT_HEADER};

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Response header carrying the server's view of the remaining balance
pub const CREDITS_HEADER: &str = "X-Credits-Remaining";

const PAYMENT_REQUIRED: u16 = 402;

/// Executes requests against the upstream API under the active credential
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    auth: Arc<AuthContext>,
    credits: Arc<CreditTracker>,
}

impl RequestExecutor {
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<AuthContext>,
        credits: Arc<CreditTracker>,
    ) -> Self {
        Self {
            transport,
            auth,
            credits,
        }
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn credits(&self) -> &CreditTracker {
        &self.credits
    }

    /// Execute one logical request and return the decoded JSON body
    #[instrument(skip(self, request, notifier), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: &ApiRequest, notifier: &Notifier) -> IdentityResult<Value> {
        match self.auth.mode() {
            AuthMode::None => Err(IdentityError::no_credentials()),
            AuthMode::ApiKey => self.execute_with_key(request, notifier).await,
            AuthMode::Payment => self.execute_with_payment(request).await,
        }
    }

    async fn execute_with_key(
        &self,
        request: &ApiRequest,
        notifier: &Notifier,
    ) -> IdentityResult<Value> {
        let key = self.auth.api_key().ok_or_else(IdentityError::no_credentials)?;
        let response = self
            .transport
            .send(request, &[(API_KEY_HEADER, key.to_string())])
            .await?;

        let body = decode_success(&response)?;
        let balance = response.header(CREDITS_HEADER).and_then(parse_credit_hint);
        self.observe_credits(balance, notifier);
        Ok(body)
    }

    async fn execute_with_payment(&self, request: &ApiRequest) -> IdentityResult<Value> {
        let first = self.transport.send(request, &[]).await?;
        if first.status != PAYMENT_REQUIRED {
            return decode_success(&first);
        }

        let challenge: PaymentRequiredBody = serde_json::from_str(&first.body).map_err(|e| {
            IdentityError::Payment(format!("unreadable 402 payment requirement: {}", e))
        })?;
        let header = build_payment_header(&self.auth, &challenge)?;
        info!(
            amount = challenge
                .accepts
                .first()
                .map(|a| a.max_amount_required.as_str())
                .unwrap_or_default(),
            "payment required, retrying with signed authorization"
        );

        let second = self
            .transport
            .send(request, &[(PAYMENT_HEADER, header)])
            .await?;
        if second.status == PAYMENT_REQUIRED {
            warn!("payment authorization was rejected");
        }
        decode_success(&second)
    }

    /// Feed a server-reported balance to the tracker and forward any alert
    pub fn observe_credits(&self, balance: Option<u64>, notifier: &Notifier) {
        if let Some(alert) = self.credits.observe(balance) {
            warn!(
                credits = alert.credits,
                threshold = alert.threshold,
                level = ?alert.level,
                "credit threshold crossed"
            );
            notifier.send(HostEvent::CreditAlert(alert));
        }
    }
}

/// Turn a response into its JSON body, or an upstream error for non-2xx
fn decode_success(response: &ApiResponse) -> IdentityResult<Value> {
    if !response.is_success() {
        return Err(upstream_error(response));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body).map_err(|e| IdentityError::Upstream {
        status: response.status,
        message: format!("response was not valid JSON: {}", e),
    })
}

/// Prefer the server's `error`/`message` field, then the status text
fn upstream_error(response: &ApiResponse) -> IdentityError {
    let from_body = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| {
            ["error", "message"].iter().find_map(|field| {
                body.get(field)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        });

    let message = from_body
        .or_else(|| Some(response.status_text.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| format!("HTTP {}", response.status));

    IdentityError::Upstream {
        status: response.status,
        message,
    }
}
