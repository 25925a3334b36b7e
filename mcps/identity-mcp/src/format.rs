//! Human-readable rendering of lookup results

use std::fmt::Write;

use crate::api::client::{BatchResultKind, CreditPackage, LookupKind};
use crate::api::types::{
    source_label, AccountInfo, CheckResponse, DataResponse, IdentityRecord, PurchaseReceipt,
};
use crate::batch::BatchRecord;
use crate::credits::CreditSnapshot;

pub fn check(subject: &str, response: &CheckResponse) -> String {
    if !response.exists {
        return format!("No identity found for {}.", subject);
    }
    if response.types.is_empty() {
        format!("{} has a known identity.", subject)
    } else {
        format!(
            "{} has a known identity (sources: {}).",
            subject,
            response.types.join(", ")
        )
    }
}

fn identity_line(record: &IdentityRecord) -> String {
    let mut parts = Vec::new();
    if let Some(ref twitter) = record.twitter {
        parts.push(format!("twitter {}", twitter));
    }
    if let Some(ref farcaster) = record.farcaster {
        parts.push(format!("farcaster {}", farcaster));
    }
    if let Some(ref address) = record.address {
        parts.push(format!("address {}", address));
    }
    if let Some(ref meta) = record.metadata {
        if let Some(ref name) = meta.display_name {
            parts.push(format!("name \"{}\"", name));
        }
        if let Some(ref source) = meta.source {
            parts.push(format!("via {}", source));
        }
    }
    if parts.is_empty() {
        "(no linked accounts)".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn data(subject: &str, response: &DataResponse) -> String {
    let mut out = String::new();
    match response {
        DataResponse::Profile(profile) => {
            if !profile.found {
                return format!("No identity data found for {}.", subject);
            }
            let _ = writeln!(out, "Identity data for {}:", subject);
            for identity in &profile.identities {
                let _ = writeln!(out, "- {}", identity_line(identity));
            }
            if let Some(ref cluster) = profile.cluster {
                let _ = writeln!(
                    out,
                    "Cluster{}: {} linked address(es)",
                    cluster
                        .id
                        .as_deref()
                        .map(|id| format!(" {}", id))
                        .unwrap_or_default(),
                    cluster.addresses.len()
                );
                for address in &cluster.addresses {
                    let _ = writeln!(out, "  - {}", address);
                }
            }
            if !profile.sources.is_empty() {
                let labels: Vec<String> = profile.sources.iter().map(source_label).collect();
                let _ = writeln!(out, "Sources: {}", labels.join(", "));
            }
        }
        DataResponse::Search(search) => {
            if search.results.is_empty() {
                return format!("No identity data found for {}.", subject);
            }
            let _ = writeln!(
                out,
                "{} match(es) for {} (showing {}):",
                search.total_matches.max(search.results.len() as u64),
                subject,
                search.results.len()
            );
            for identity in &search.results {
                let _ = writeln!(out, "- {}", identity_line(identity));
            }
        }
    }
    out.trim_end().to_string()
}

fn record_line(record: &BatchRecord) -> String {
    match record {
        BatchRecord::Check(r) => {
            let mut linked = Vec::new();
            if r.twitter {
                linked.push("twitter");
            }
            if r.farcaster {
                linked.push("farcaster");
            }
            if linked.is_empty() {
                r.id.clone()
            } else {
                format!("{} ({})", r.id, linked.join(", "))
            }
        }
        BatchRecord::Data(r) => {
            let mut parts = Vec::new();
            if let Some(ref twitter) = r.twitter {
                parts.push(twitter.clone());
            }
            if let Some(ref address) = r.address {
                if address != &r.id {
                    parts.push(address.clone());
                }
            }
            if let Some(ref name) = r.display_name {
                parts.push(format!("\"{}\"", name));
            }
            if let Some(ref source) = r.source {
                parts.push(format!("via {}", source));
            }
            if r.alternate_count > 0 {
                parts.push(format!("+{} alternate(s)", r.alternate_count));
            }
            if parts.is_empty() {
                r.id.clone()
            } else {
                format!("{} -> {}", r.id, parts.join(", "))
            }
        }
    }
}

pub fn batch(lookup: LookupKind, kind: BatchResultKind, records: &[BatchRecord]) -> String {
    let found: Vec<&BatchRecord> = records.iter().filter(|r| r.found()).collect();
    let missing = records.len() - found.len();
    let verb = match kind {
        BatchResultKind::Check => "Checked",
        BatchResultKind::Data => "Looked up",
    };

    let mut out = format!(
        "{} {} {}: {} found, {} not found.",
        verb,
        records.len(),
        lookup.noun(records.len()),
        found.len(),
        missing
    );
    if !found.is_empty() {
        out.push_str("\n\nFound:");
        for record in found {
            let _ = write!(out, "\n- {}", record_line(record));
        }
    }
    out
}

pub fn account(info: &AccountInfo, snapshot: &CreditSnapshot) -> String {
    format!(
        "Credits: {}\nPoints: {}\nLow-credit alert threshold: {}\nCritical threshold: {}",
        info.credits, info.points, snapshot.threshold, snapshot.critical_threshold
    )
}

pub fn purchase(package: CreditPackage, receipt: &PurchaseReceipt, wallet: &str) -> String {
    let mut out = format!(
        "Purchased the {} package from {}: {} credits added, new balance {}.",
        package.as_str(),
        wallet,
        receipt.credits_added,
        receipt.new_credits
    );
    if let Some(ref tx) = receipt.transaction_hash {
        let _ = write!(out, "\nTransaction: {}", tx);
    }
    out
}
