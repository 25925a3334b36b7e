//! Lookup handler implementations

use mcp_common::{CallToolResult, McpError};

use crate::api::client::{BatchResultKind, IdentityApi, LookupKind};
use crate::batch::run_batch;
use crate::error::IdentityResult;
use crate::format;
use crate::notify::{HostEvent, Notifier};
use crate::params::{AddressParams, BatchAddressParams, BatchTwitterParams, TwitterParams};
use crate::subject::normalize_subject;

use super::respond;

async fn check(
    api: &IdentityApi,
    kind: LookupKind,
    raw: &str,
    notifier: &Notifier,
) -> IdentityResult<String> {
    api.auth().require_configured()?;
    let subject = normalize_subject(kind, raw)?;
    let response = api.check(kind, &subject, notifier).await?;
    Ok(format::check(&subject, &response))
}

async fn data(
    api: &IdentityApi,
    kind: LookupKind,
    raw: &str,
    notifier: &Notifier,
) -> IdentityResult<String> {
    api.auth().require_configured()?;
    let subject = normalize_subject(kind, raw)?;
    let response = api.data(kind, &subject, notifier).await?;
    Ok(format::data(&subject, &response))
}

async fn batch(
    api: &IdentityApi,
    items: &[String],
    lookup: LookupKind,
    kind: BatchResultKind,
    notifier: &Notifier,
) -> IdentityResult<String> {
    api.auth().require_configured()?;
    let records = run_batch(api, items, lookup, kind, notifier, |event| {
        notifier.send(HostEvent::Batch(event))
    })
    .await?;
    Ok(format::batch(lookup, kind, &records))
}

/// Check whether an address has a known identity
pub async fn check_address(
    api: &IdentityApi,
    params: AddressParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(check(api, LookupKind::Address, &params.address, notifier).await)
}

/// Check whether a Twitter handle has a known identity
pub async fn check_twitter(
    api: &IdentityApi,
    params: TwitterParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(check(api, LookupKind::Handle, &params.handle, notifier).await)
}

/// Full identity data for an address
pub async fn get_address_data(
    api: &IdentityApi,
    params: AddressParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(data(api, LookupKind::Address, &params.address, notifier).await)
}

/// Full identity data for a Twitter handle
pub async fn get_twitter_data(
    api: &IdentityApi,
    params: TwitterParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(data(api, LookupKind::Handle, &params.handle, notifier).await)
}

pub async fn batch_check_addresses(
    api: &IdentityApi,
    params: BatchAddressParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(
        batch(
            api,
            &params.addresses,
            LookupKind::Address,
            BatchResultKind::Check,
            notifier,
        )
        .await,
    )
}

pub async fn batch_check_twitters(
    api: &IdentityApi,
    params: BatchTwitterParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(
        batch(
            api,
            &params.handles,
            LookupKind::Handle,
            BatchResultKind::Check,
            notifier,
        )
        .await,
    )
}

pub async fn batch_get_address_data(
    api: &IdentityApi,
    params: BatchAddressParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(
        batch(
            api,
            &params.addresses,
            LookupKind::Address,
            BatchResultKind::Data,
            notifier,
        )
        .await,
    )
}

pub async fn batch_get_twitter_data(
    api: &IdentityApi,
    params: BatchTwitterParams,
    notifier: &Notifier,
) -> Result<CallToolResult, McpError> {
    respond(
        batch(
            api,
            &params.handles,
            LookupKind::Handle,
            BatchResultKind::Data,
            notifier,
        )
        .await,
    )
}
