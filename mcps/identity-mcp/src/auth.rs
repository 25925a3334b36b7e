//! Authentication mode selection
//!
//! Exactly one credential drives the process: an API key, or a signing key
//! used to pay per call over x402. The choice is made once at startup.

use std::fmt;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{IdentityError, IdentityResult};

/// Base mainnet chain id, the only network payments are signed for
pub const BASE_CHAIN_ID: u64 = 8453;

/// Public RPC endpoint the payment wallet is bound to
pub const BASE_RPC_URL: &str = "https://mainnet.base.org";

/// The active authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Static API key sent on every request
    ApiKey,
    /// x402 challenge/response, paid with a signed USDC authorization
    Payment,
    /// No credential configured; every tool call fails fast
    None,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthMode::ApiKey => "API key",
            AuthMode::Payment => "x402 pay-per-call",
            AuthMode::None => "not configured",
        };
        f.write_str(label)
    }
}

/// Signing identity derived from a private key, bound to Base mainnet
#[derive(Clone)]
pub struct PaymentWallet {
    signer: PrivateKeySigner,
    chain_id: u64,
    rpc_url: &'static str,
}

impl PaymentWallet {
    /// Parse a hex private key (with or without `0x`)
    pub fn from_private_key(key: &str) -> IdentityResult<Self> {
        let signer: PrivateKeySigner = key.trim().parse().map_err(|_| {
            IdentityError::Configuration(
                "IDENTITY_PRIVATE_KEY is not a valid 32-byte hex private key".to_string(),
            )
        })?;

        Ok(Self {
            signer,
            chain_id: BASE_CHAIN_ID,
            rpc_url: BASE_RPC_URL,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn rpc_url(&self) -> &str {
        self.rpc_url
    }
}

impl fmt::Debug for PaymentWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentWallet")
            .field("address", &self.address())
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// The single credential the process runs with
#[derive(Clone)]
pub enum Credential {
    ApiKey(String),
    SigningKey(PaymentWallet),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credential::SigningKey(wallet) => f.debug_tuple("SigningKey").field(wallet).finish(),
        }
    }
}

/// Resolved authentication state, immutable for the process lifetime
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    credential: Option<Credential>,
}

impl AuthContext {
    /// Pick the active credential. The API key wins when both are present;
    /// blank values count as absent.
    pub fn resolve(api_key: Option<&str>, private_key: Option<&str>) -> IdentityResult<Self> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        let private_key = private_key.map(str::trim).filter(|k| !k.is_empty());

        let credential = match (api_key, private_key) {
            (Some(key), signing) => {
                if signing.is_some() {
                    warn!("both API key and private key configured; using API key");
                }
                Some(Credential::ApiKey(key.to_string()))
            }
            (None, Some(key)) => {
                let wallet = PaymentWallet::from_private_key(key)?;
                info!(
                    address = %wallet.address(),
                    chain_id = wallet.chain_id(),
                    "x402 payment wallet ready"
                );
                Some(Credential::SigningKey(wallet))
            }
            (None, None) => None,
        };

        Ok(Self { credential })
    }

    /// Context with no credential, for hosts that only browse the catalog
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> AuthMode {
        match &self.credential {
            Some(Credential::ApiKey(_)) => AuthMode::ApiKey,
            Some(Credential::SigningKey(_)) => AuthMode::Payment,
            None => AuthMode::None,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match &self.credential {
            Some(Credential::ApiKey(key)) => Some(key),
            _ => None,
        }
    }

    pub fn wallet(&self) -> Option<&PaymentWallet> {
        match &self.credential {
            Some(Credential::SigningKey(wallet)) => Some(wallet),
            _ => None,
        }
    }

    /// The wallet, or a configuration error outside payment mode
    pub fn require_wallet(&self) -> IdentityResult<&PaymentWallet> {
        self.wallet().ok_or_else(|| {
            IdentityError::Configuration(
                "payment required but no signing key configured (set IDENTITY_PRIVATE_KEY)"
                    .to_string(),
            )
        })
    }

    /// Fail fast when no credential is configured
    pub fn require_configured(&self) -> IdentityResult<()> {
        match self.mode() {
            AuthMode::None => Err(IdentityError::no_credentials()),
            _ => Ok(()),
        }
    }

    /// Fail unless the session runs in `mode`
    pub fn require_mode(&self, mode: AuthMode, operation: &str) -> IdentityResult<()> {
        self.require_configured()?;
        if self.mode() == mode {
            return Ok(());
        }
        Err(IdentityError::Configuration(format!(
            "{} requires {} access, but this session uses {}",
            operation,
            mode,
            self.mode()
        )))
    }
}
