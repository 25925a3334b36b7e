//! Batch chunking and streaming
//!
//! Arbitrary-length subject lists are split into sequential chunks of
//! [`BATCH_CHUNK_SIZE`]. A progress event goes out before each chunk is
//! requested, and a result event for every found record once the chunk
//! returns. Any failure aborts the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::client::{BatchResultKind, IdentityApi, LookupKind};
use crate::api::types::IdentityRecord;
use crate::error::{IdentityError, IdentityResult};
use crate::notify::Notifier;
use crate::subject::normalize_subject;

/// Upstream batch size limit
pub const BATCH_CHUNK_SIZE: usize = 50;

/// Progress of a running batch, emitted before each chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Items covered once this chunk completes
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
    /// 1-based
    pub batch_number: usize,
    pub total_batches: usize,
}

impl BatchProgress {
    pub fn for_chunk(index: usize, total: usize) -> Self {
        let current = ((index + 1) * BATCH_CHUNK_SIZE).min(total);
        let percentage = if total == 0 {
            100
        } else {
            ((current as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            current,
            total,
            percentage,
            batch_number: index + 1,
            total_batches: total.div_ceil(BATCH_CHUNK_SIZE),
        }
    }
}

/// Normalized `/batch/check` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub id: String,
    pub found: bool,
    pub twitter: bool,
    pub farcaster: bool,
}

/// Normalized `/batch/data` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub id: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub alternate_count: usize,
}

/// One normalized batch result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Check(CheckRecord),
    Data(DataRecord),
}

impl BatchRecord {
    pub fn id(&self) -> &str {
        match self {
            BatchRecord::Check(r) => &r.id,
            BatchRecord::Data(r) => &r.id,
        }
    }

    pub fn found(&self) -> bool {
        match self {
            BatchRecord::Check(r) => r.found,
            BatchRecord::Data(r) => r.found,
        }
    }
}

/// Events streamed while a batch runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress(BatchProgress),
    Result(BatchRecord),
}

#[derive(Debug, Default, Deserialize)]
struct RawCheckEntry {
    #[serde(default)]
    exists: bool,
    #[serde(default)]
    twitter: Value,
    #[serde(default)]
    farcaster: Value,
}

#[derive(Debug, Default, Deserialize)]
struct RawDataEntry {
    #[serde(default)]
    found: bool,
    #[serde(default)]
    primary: Option<IdentityRecord>,
    #[serde(default)]
    alternates: Vec<Value>,
}

// Flags arrive as booleans or as the linked handle itself
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn decode_error(message: String) -> IdentityError {
    IdentityError::Decode(<serde_json::Error as serde::de::Error>::custom(message))
}

fn entry<T: serde::de::DeserializeOwned + Default>(value: &Value) -> IdentityResult<T> {
    let parsed: Option<T> = serde_json::from_value(value.clone())?;
    Ok(parsed.unwrap_or_default())
}

/// Flatten a keyed batch response into records, in the server's mapping
/// order. Pure: the same input always yields the same records.
pub fn normalize(
    kind: BatchResultKind,
    lookup: LookupKind,
    raw: &Value,
) -> IdentityResult<Vec<BatchRecord>> {
    let group = match raw.get("results").and_then(|r| r.get(lookup.batch_key())) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(group) => group,
    };
    let entries = group.as_object().ok_or_else(|| {
        decode_error(format!("results.{} is not an object", lookup.batch_key()))
    })?;

    entries
        .iter()
        .map(|(id, value)| {
            let record = match kind {
                BatchResultKind::Check => {
                    let e: RawCheckEntry = entry(value)?;
                    BatchRecord::Check(CheckRecord {
                        id: id.clone(),
                        found: e.exists,
                        twitter: truthy(&e.twitter),
                        farcaster: truthy(&e.farcaster),
                    })
                }
                BatchResultKind::Data => {
                    let e: RawDataEntry = entry(value)?;
                    let primary = e.primary.unwrap_or_default();
                    let metadata = primary.metadata.unwrap_or_default();
                    BatchRecord::Data(DataRecord {
                        id: id.clone(),
                        found: e.found,
                        twitter: primary.twitter,
                        address: primary.address,
                        display_name: metadata.display_name,
                        source: metadata.source,
                        alternate_count: e.alternates.len(),
                    })
                }
            };
            Ok(record)
        })
        .collect()
}

/// Run a batch lookup over `items`, streaming events to `on_event`
pub async fn run_batch<F>(
    api: &IdentityApi,
    items: &[String],
    lookup: LookupKind,
    kind: BatchResultKind,
    notifier: &Notifier,
    mut on_event: F,
) -> IdentityResult<Vec<BatchRecord>>
where
    F: FnMut(BatchEvent),
{
    if items.is_empty() {
        return Err(IdentityError::Validation(format!(
            "at least one {} is required",
            lookup.noun(1)
        )));
    }
    let items = items
        .iter()
        .map(|item| normalize_subject(lookup, item))
        .collect::<IdentityResult<Vec<_>>>()?;

    let total = items.len();
    let mut records = Vec::with_capacity(total);

    for (index, chunk) in items.chunks(BATCH_CHUNK_SIZE).enumerate() {
        let progress = BatchProgress::for_chunk(index, total);
        debug!(
            batch = progress.batch_number,
            of = progress.total_batches,
            size = chunk.len(),
            "requesting batch chunk"
        );
        on_event(BatchEvent::Progress(progress));

        let raw = api.batch(kind, lookup, chunk, notifier).await?;
        let chunk_records = normalize(kind, lookup, &raw)?;
        for record in chunk_records.iter().filter(|r| r.found()) {
            on_event(BatchEvent::Result(record.clone()));
        }
        records.extend(chunk_records);
    }

    info!(
        total,
        found = records.iter().filter(|r| r.found()).count(),
        "batch lookup complete"
    );
    Ok(records)
}
