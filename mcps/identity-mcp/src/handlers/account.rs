//! Credit and account handler implementations

use mcp_common::{CallToolResult, McpError};
use serde_json::json;
use tracing::info;

use crate::api::client::IdentityApi;
use crate::auth::AuthMode;
use crate::error::IdentityResult;
use crate::format;
use crate::notify::{HostEvent, Notifier};
use crate::params::{PurchaseCreditsParams, SetCreditAlertParams};

use super::respond;

async fn credits(api: &IdentityApi, notifier: &Notifier) -> IdentityResult<String> {
    api.auth().require_mode(AuthMode::ApiKey, "check_credits")?;
    let info = api.account(notifier).await?;
    Ok(format::account(&info, &api.credits().snapshot()))
}

fn set_alert(api: &IdentityApi, threshold: u64) -> IdentityResult<String> {
    api.auth().require_mode(AuthMode::ApiKey, "set_credit_alert")?;
    let previous = api.credits().set_threshold(threshold);
    info!(previous, threshold, "credit alert threshold changed");

    let balance = match api.credits().last_known() {
        Some(credits) => format!("Last known balance: {} credits.", credits),
        None => "No balance observed yet.".to_string(),
    };
    Ok(format!(
        "Low-credit alert threshold set to {} (was {}). {}",
        threshold, previous, balance
    ))
}

async fn purchase(
    api: &IdentityApi,
    params: PurchaseCreditsParams,
    notifier: &Notifier,
) -> IdentityResult<String> {
    api.auth().require_mode(AuthMode::Payment, "purchase_credits")?;
    let wallet = api.auth().require_wallet()?.address().to_checksum(None);

    let receipt = api.purchase(params.package, &wallet, notifier).await?;
    info!(
        package = params.package.as_str(),
        credits_added = receipt.credits_added,
        "credits purchased"
    );
    notifier.send(HostEvent::Info {
        message: format!("Purchased {} credits", receipt.credits_added),
        data: json!({ "type": "purchase", "receipt": receipt }),
    });
    Ok(format::purchase(params.package, &receipt, &wallet))
}

/// Current balance from `/api/me`
pub async fn check_credits(api: &IdentityApi, notifier: &Notifier) -> Result<CallToolResult, McpError> {
    respond(credits(api, notifier).await)
}

/// Change the low-credit alert threshold; no network call
pub async fn set_credit_alert(
    api: &IdentityApi,
    params: SetCreditAlertParams,
) -> Result<CallToolResult, McpError> {
    respond(set_alert(api, params.threshold))
}

/// Buy a credit package, paid from the configured wallet
pub async fn purchase_credits(
    api: &IdentityApi,
    params: PurchaseCreditsParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(purchase(api, params, notifier).await)
}
