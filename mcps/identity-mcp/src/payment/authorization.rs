//! EIP-3009 `TransferWithAuthorization` signing for x402 retries.
//!
//! Every challenge gets a fresh nonce and fresh validity window; nothing
//! here is cached or retried.

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, FixedBytes, B256, U256};
use alloy::signers::SignerSync;
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use base64::Engine;
use rand::RngCore;
use tracing::debug;

use super::{AuthorizationFields, ExactPayload, PaymentPayload, PaymentRequiredBody, PaymentRequirements};
use crate::auth::{AuthContext, PaymentWallet};
use crate::error::{IdentityError, IdentityResult};

/// Backdating applied to `validAfter` to tolerate clock skew
pub const CLOCK_SKEW_SECS: u64 = 600;

const USDC_DOMAIN_NAME: &str = "USD Coin";
const USDC_DOMAIN_VERSION: &str = "2";

sol! {
    #[derive(Debug)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
}

/// EIP-712 domain of the USDC contract at `asset`
pub fn usdc_domain(chain_id: u64, asset: Address) -> Eip712Domain {
    Eip712Domain {
        name: Some(Cow::Borrowed(USDC_DOMAIN_NAME)),
        version: Some(Cow::Borrowed(USDC_DOMAIN_VERSION)),
        chain_id: Some(U256::from(chain_id)),
        verifying_contract: Some(asset),
        salt: None,
    }
}

fn parse_address(field: &str, value: &str) -> IdentityResult<Address> {
    value
        .parse()
        .map_err(|_| IdentityError::Payment(format!("invalid {} address: {}", field, value)))
}

fn random_nonce() -> FixedBytes<32> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    FixedBytes::from(bytes)
}

fn unix_now() -> IdentityResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| IdentityError::Payment(format!("system clock error: {}", e)))
}

/// Sign a one-time authorization paying `accept` from the wallet
pub fn sign_authorization(
    wallet: &PaymentWallet,
    accept: &PaymentRequirements,
    now: u64,
) -> IdentityResult<ExactPayload> {
    let to = parse_address("payTo", &accept.pay_to)?;
    let asset = parse_address("asset", &accept.asset)?;
    let value: U256 = accept.max_amount_required.parse().map_err(|_| {
        IdentityError::Payment(format!("invalid amount: {}", accept.max_amount_required))
    })?;

    let valid_after = now.saturating_sub(CLOCK_SKEW_SECS);
    let valid_before = now
        .checked_add(accept.max_timeout_seconds)
        .ok_or_else(|| IdentityError::Payment("payment timeout out of range".to_string()))?;
    let nonce = random_nonce();

    let message = TransferWithAuthorization {
        from: wallet.address(),
        to,
        value,
        validAfter: U256::from(valid_after),
        validBefore: U256::from(valid_before),
        nonce,
    };

    let hash: B256 = message.eip712_signing_hash(&usdc_domain(wallet.chain_id(), asset));
    let signature = wallet
        .signer()
        .sign_hash_sync(&hash)
        .map_err(|e| IdentityError::Payment(format!("signing failed: {}", e)))?;

    debug!(
        to = %to,
        value = %value,
        valid_before,
        "signed transfer authorization"
    );

    Ok(ExactPayload {
        signature: alloy::hex::encode_prefixed(signature.as_bytes()),
        authorization: AuthorizationFields {
            from: wallet.address().to_checksum(None),
            to: to.to_checksum(None),
            value: value.to_string(),
            valid_after: valid_after.to_string(),
            valid_before: valid_before.to_string(),
            nonce: alloy::hex::encode_prefixed(nonce),
        },
    })
}

/// Answer a 402 challenge: sign for the first accepted option and encode
/// the result for the `X-PAYMENT` header.
pub fn build_payment_header(
    auth: &AuthContext,
    challenge: &PaymentRequiredBody,
) -> IdentityResult<String> {
    let wallet = auth.require_wallet()?;
    let accept = challenge.accepts.first().ok_or_else(|| {
        IdentityError::Payment("402 response did not offer any payment option".to_string())
    })?;

    let payload = PaymentPayload {
        x402_version: challenge.x402_version,
        scheme: accept.scheme.clone(),
        network: accept.network.clone(),
        payload: sign_authorization(wallet, accept, unix_now()?)?,
    };

    let json = serde_json::to_vec(&payload)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}
