//! Prompt templates guiding a host through common investigations

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::client::LookupKind;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InvestigateAddressArgs {
    #[schemars(description = "Crypto address to investigate")]
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InvestigateTwitterArgs {
    #[schemars(description = "Twitter handle to investigate")]
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BulkLookupArgs {
    #[schemars(description = "Addresses or handles, separated by commas, spaces or newlines")]
    pub items: String,

    #[schemars(description = "'address' or 'twitter'; inferred from the items when omitted")]
    pub kind: Option<String>,
}

pub fn investigate_address(address: &str) -> String {
    format!(
        "Investigate the on-chain identity behind {address}.\n\n\
         1. Call `check_address` to see whether any identity is known.\n\
         2. If one is, call `get_address_data` for linked accounts, display names, \
         the address cluster and the sources backing each link.\n\
         3. For every other address in the cluster, consider `batch_get_address_data` \
         to see whether they resolve to the same person.\n\n\
         Summarize who likely controls the address, how confident the evidence is, \
         and which sources support each claim."
    )
}

pub fn investigate_twitter(handle: &str) -> String {
    let handle = format!("@{}", handle.trim().trim_start_matches('@'));
    format!(
        "Investigate the crypto footprint of {handle}.\n\n\
         1. Call `check_twitter` to see whether the handle is linked to any address.\n\
         2. If it is, call `get_twitter_data` for the linked addresses, alternates and sources.\n\
         3. If several addresses come back, use `batch_check_addresses` to see which of them \
         link to other identities as well.\n\n\
         Summarize the addresses tied to the handle and how strong each link is."
    )
}

fn split_items(items: &str) -> Vec<String> {
    items
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Explicit kind wins; otherwise addresses only if every item looks like one
fn infer_kind(kind: Option<&str>, items: &[String]) -> LookupKind {
    match kind.map(|k| k.trim().to_ascii_lowercase()) {
        Some(k) if k.starts_with("addr") => LookupKind::Address,
        Some(k) if k == "twitter" || k.starts_with("handle") => LookupKind::Handle,
        _ if !items.is_empty() && items.iter().all(|i| i.starts_with("0x")) => LookupKind::Address,
        _ => LookupKind::Handle,
    }
}

pub fn bulk_lookup(items: &str, kind: Option<&str>) -> String {
    let list = split_items(items);
    let lookup = infer_kind(kind, &list);
    let (check_tool, data_tool, key) = match lookup {
        LookupKind::Address => ("batch_check_addresses", "batch_get_address_data", "addresses"),
        LookupKind::Handle => ("batch_check_twitters", "batch_get_twitter_data", "handles"),
    };
    let json_list = serde_json::to_string(&list).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Look up {count} {noun}.\n\n\
         1. Call `{check_tool}` with `{key}` = {json_list} to find which have known identities.\n\
         2. Call `{data_tool}` with only the ones that were found.\n\n\
         Large lists are processed in chunks automatically; progress is reported as it goes. \
         Present the results as a table of subject, linked account, display name and source, \
         followed by a count of subjects with no identity.",
        count = list.len(),
        noun = lookup.noun(list.len()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_items() {
        assert_eq!(
            split_items("@a, @b\n@c  ,,"),
            vec!["@a".to_string(), "@b".to_string(), "@c".to_string()]
        );
    }

    #[test]
    fn test_infer_kind() {
        let addrs = vec!["0x1".to_string(), "0x2".to_string()];
        let mixed = vec!["0x1".to_string(), "alice".to_string()];

        assert_eq!(infer_kind(None, &addrs), LookupKind::Address);
        assert_eq!(infer_kind(None, &mixed), LookupKind::Handle);
        assert_eq!(infer_kind(Some("twitter"), &addrs), LookupKind::Handle);
        assert_eq!(infer_kind(Some("Address"), &mixed), LookupKind::Address);
    }

    #[test]
    fn test_bulk_lookup_names_tools() {
        let text = bulk_lookup("0xaa 0xbb", None);
        assert!(text.starts_with("Look up 2 addresses."));
        assert!(text.contains("`batch_check_addresses` with `addresses` = [\"0xaa\",\"0xbb\"]"));
        assert!(text.contains("`batch_get_address_data`"));
    }

    #[test]
    fn test_investigate_twitter_normalizes_handle() {
        assert!(investigate_twitter("alice").starts_with("Investigate the crypto footprint of @alice."));
    }
}
