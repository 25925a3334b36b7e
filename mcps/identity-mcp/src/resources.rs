//! Read-only markdown resources

use std::fmt::Write;

use rmcp::model::{AnnotateAble, RawResource, Resource};

use crate::api::client::IdentityApi;
use crate::auth::AuthMode;
use crate::batch::BATCH_CHUNK_SIZE;

pub const INFO_URI: &str = "identity://info";
pub const PRICING_URI: &str = "identity://pricing";
pub const STATUS_URI: &str = "identity://status";

const MARKDOWN: &str = "text/markdown";

fn resource(uri: &str, name: &str, description: &str) -> Resource {
    let mut raw = RawResource::new(uri, name);
    raw.description = Some(description.to_string());
    raw.mime_type = Some(MARKDOWN.to_string());
    raw.no_annotation()
}

/// Every resource the server exposes
pub fn catalog() -> Vec<Resource> {
    vec![
        resource(
            INFO_URI,
            "info",
            "What the identity service covers and how lookups work",
        ),
        resource(
            PRICING_URI,
            "pricing",
            "Access modes, credit packages and how payment works",
        ),
        resource(
            STATUS_URI,
            "status",
            "Current authentication mode, wallet and credit balance",
        ),
    ]
}

/// Render a resource by URI; `None` for unknown URIs
pub fn render(uri: &str, api: &IdentityApi) -> Option<String> {
    match uri {
        INFO_URI => Some(info()),
        PRICING_URI => Some(pricing()),
        STATUS_URI => Some(status(api)),
        _ => None,
    }
}

fn info() -> String {
    format!(
        "# Identity Lookup\n\n\
         Maps crypto addresses to social identities (Twitter, Farcaster) and back.\n\n\
         ## Tools\n\n\
         - `check_address` / `check_twitter`: does the subject have a known identity?\n\
         - `get_address_data` / `get_twitter_data`: linked accounts, display names, clusters and sources\n\
         - `batch_check_addresses` / `batch_check_twitters`: existence checks for many subjects\n\
         - `batch_get_address_data` / `batch_get_twitter_data`: full data for many subjects\n\n\
         Batch tools accept any number of items and send them upstream in chunks of {}, \
         reporting progress after each chunk. A failing chunk fails the whole batch.\n\n\
         ## Input\n\n\
         - Addresses: `0x` followed by 40 hex digits\n\
         - Twitter handles: with or without the leading `@`\n",
        BATCH_CHUNK_SIZE
    )
}

fn pricing() -> String {
    "# Pricing\n\n\
     ## API key (credits)\n\n\
     Set `IDENTITY_API_KEY`. Every call draws on a prepaid credit balance; the server \
     reports the remaining balance on each response. Use `check_credits` to see the \
     balance and `set_credit_alert` to choose when to be warned. A critical alert \
     always fires at 100 credits.\n\n\
     ## x402 pay-per-call\n\n\
     Set `IDENTITY_PRIVATE_KEY`. Calls are paid individually in USDC on Base (chain 8453): \
     the service answers `402 Payment Required` with its price, the server signs a \
     one-time EIP-3009 transfer authorization and retries once. Amounts are quoted in \
     USDC base units (6 decimals).\n\n\
     ## Credit packages\n\n\
     `purchase_credits` buys a package with the configured wallet:\n\n\
     | Package | Use |\n\
     |---|---|\n\
     | `starter` | Trying the service |\n\
     | `growth` | Regular lookups |\n\
     | `scale` | Large batch workloads |\n\n\
     The price of each package is quoted by the service in the payment challenge.\n"
        .to_string()
}

fn status(api: &IdentityApi) -> String {
    let auth = api.auth();
    let snapshot = api.credits().snapshot();

    let mut out = String::from("# Status\n\n");
    let _ = writeln!(out, "- **Auth mode:** {}", auth.mode());
    let _ = writeln!(out, "- **API:** {}", api.base_url());

    match auth.mode() {
        AuthMode::ApiKey => {
            let balance = snapshot
                .last_known
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown (no call made yet)".to_string());
            let _ = writeln!(out, "- **Last known credits:** {}", balance);
            let _ = writeln!(out, "- **Alert threshold:** {}", snapshot.threshold);
            let _ = writeln!(
                out,
                "- **Critical threshold:** {}",
                snapshot.critical_threshold
            );
        }
        AuthMode::Payment => {
            if let Some(wallet) = auth.wallet() {
                let _ = writeln!(out, "- **Wallet:** {}", wallet.address());
                let _ = writeln!(
                    out,
                    "- **Network:** Base (chain {}, {})",
                    wallet.chain_id(),
                    wallet.rpc_url()
                );
            }
        }
        AuthMode::None => {
            out.push_str(
                "\nNo credentials configured. Set `IDENTITY_API_KEY` or \
                 `IDENTITY_PRIVATE_KEY` to enable lookups.\n",
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::api::mock::MockTransport;
    use crate::auth::AuthContext;
    use crate::credits::CreditTracker;

    fn api(auth: AuthContext) -> IdentityApi {
        let credits = Arc::new(CreditTracker::new(auth.mode(), 1000));
        IdentityApi::new(
            Arc::new(MockTransport::new()),
            Arc::new(auth),
            credits,
            "http://localhost:8787",
        )
    }

    #[test]
    fn test_catalog_uris() {
        let uris: Vec<String> = catalog().iter().map(|r| r.raw.uri.clone()).collect();
        assert_eq!(uris, vec![INFO_URI, PRICING_URI, STATUS_URI]);
    }

    #[test]
    fn test_unknown_uri() {
        assert!(render("identity://nope", &api(AuthContext::unconfigured())).is_none());
    }

    #[test]
    fn test_status_api_key_mode() {
        let api = api(AuthContext::resolve(Some("k"), None).unwrap());
        api.credits().observe(Some(2500));

        let text = render(STATUS_URI, &api).unwrap();
        assert!(text.contains("**Auth mode:** API key"));
        assert!(text.contains("**Last known credits:** 2500"));
        assert!(text.contains("**Alert threshold:** 1000"));
    }

    #[test]
    fn test_status_payment_mode_shows_wallet() {
        let key = "0x0000000000000000000000000000000000000000000000000000000000000001";
        let api = api(AuthContext::resolve(None, Some(key)).unwrap());

        let text = render(STATUS_URI, &api).unwrap();
        assert!(text.contains("0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"));
        assert!(text.contains("chain 8453"));
    }

    #[test]
    fn test_status_unconfigured() {
        let text = render(STATUS_URI, &api(AuthContext::unconfigured())).unwrap();
        assert!(text.contains("No credentials configured"));
    }
}
