//! Host notifications
//!
//! Batch progress, per-item results and credit alerts reach the host as MCP
//! logging notifications. Sending never blocks and never fails the caller:
//! events go onto an unbounded channel drained by a forwarding task, and
//! delivery errors are only logged. Events below the level the host asked
//! for with `logging/setLevel` are dropped before they are queued.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use rmcp::model::{LoggingLevel, LoggingMessageNotificationParam};
use rmcp::{Peer, RoleServer};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::batch::{BatchEvent, BatchRecord};
use crate::credits::{AlertLevel, CreditAlert};

const LOGGER: &str = "identity-mcp";

/// Something worth telling the host about
#[derive(Debug, Clone)]
pub enum HostEvent {
    Batch(BatchEvent),
    CreditAlert(CreditAlert),
    Info { message: String, data: Value },
}

impl HostEvent {
    pub fn level(&self) -> LoggingLevel {
        match self {
            HostEvent::CreditAlert(alert) => match alert.level {
                AlertLevel::Critical => LoggingLevel::Error,
                AlertLevel::Low => LoggingLevel::Warning,
            },
            HostEvent::Batch(_) | HostEvent::Info { .. } => LoggingLevel::Info,
        }
    }

    pub fn message(&self) -> String {
        match self {
            HostEvent::Batch(BatchEvent::Progress(p)) => format!(
                "Processing batch {}/{} ({}/{} items, {}%)",
                p.batch_number, p.total_batches, p.current, p.total, p.percentage
            ),
            HostEvent::Batch(BatchEvent::Result(record)) => match record {
                BatchRecord::Check(r) => format!("Found: {}", r.id),
                BatchRecord::Data(r) => match r.twitter.as_deref().or(r.address.as_deref()) {
                    Some(linked) => format!("Found: {} -> {}", r.id, linked),
                    None => format!("Found: {}", r.id),
                },
            },
            HostEvent::CreditAlert(alert) => alert.message(),
            HostEvent::Info { message, .. } => message.clone(),
        }
    }

    /// Structured payload accompanying the message
    pub fn data(&self) -> Value {
        match self {
            HostEvent::Batch(BatchEvent::Progress(p)) => json!({ "type": "progress", "progress": p }),
            HostEvent::Batch(BatchEvent::Result(r)) => json!({ "type": "result", "record": r }),
            HostEvent::CreditAlert(alert) => json!({
                "type": "credit_alert",
                "credits": alert.credits,
                "threshold": alert.threshold,
            }),
            HostEvent::Info { data, .. } => data.clone(),
        }
    }

    pub fn to_logging_param(&self) -> LoggingMessageNotificationParam {
        LoggingMessageNotificationParam {
            level: self.level(),
            logger: Some(LOGGER.to_string()),
            data: json!({ "message": self.message(), "data": self.data() }),
        }
    }
}

fn severity(level: &LoggingLevel) -> u8 {
    match level {
        LoggingLevel::Debug => 0,
        LoggingLevel::Info => 1,
        LoggingLevel::Notice => 2,
        LoggingLevel::Warning => 3,
        LoggingLevel::Error => 4,
        LoggingLevel::Critical => 5,
        LoggingLevel::Alert => 6,
        LoggingLevel::Emergency => 7,
    }
}

/// Minimum level the host wants to receive, shared by every notifier of a
/// server. Starts at `debug`, so nothing is dropped until the host asks.
#[derive(Debug, Clone, Default)]
pub struct LevelFilter {
    min: Arc<AtomicU8>,
}

impl LevelFilter {
    pub fn set(&self, level: &LoggingLevel) {
        self.min.store(severity(level), Ordering::Relaxed);
    }

    pub fn allows(&self, level: &LoggingLevel) -> bool {
        severity(level) >= self.min.load(Ordering::Relaxed)
    }
}

/// Non-blocking handle for emitting [`HostEvent`]s
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<HostEvent>>,
    filter: LevelFilter,
}

impl Notifier {
    /// Drops every event
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Notifier plus the receiving end, for in-process consumers
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Self {
            tx: Some(tx),
            filter: LevelFilter::default(),
        };
        (notifier, rx)
    }

    /// Drop events below the level held by `filter`
    pub fn with_filter(mut self, filter: LevelFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Forward events at or above `filter` to the connected client as
    /// logging notifications
    pub fn for_peer(peer: Peer<RoleServer>, filter: LevelFilter) -> Self {
        let (notifier, mut rx) = Self::channel();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = peer.notify_logging_message(event.to_logging_param()).await {
                    warn!(error = %e, "failed to deliver notification to host");
                }
            }
        });
        notifier.with_filter(filter)
    }

    pub fn send(&self, event: HostEvent) {
        if !self.filter.allows(&event.level()) {
            return;
        }
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                debug!("notification receiver closed, dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchProgress, CheckRecord};

    #[test]
    fn test_alert_levels() {
        let low = HostEvent::CreditAlert(CreditAlert {
            level: AlertLevel::Low,
            credits: 900,
            threshold: 1000,
        });
        let critical = HostEvent::CreditAlert(CreditAlert {
            level: AlertLevel::Critical,
            credits: 50,
            threshold: 100,
        });

        assert_eq!(low.level(), LoggingLevel::Warning);
        assert_eq!(critical.level(), LoggingLevel::Error);
        assert_eq!(low.data()["credits"], 900);
        assert_eq!(low.data()["threshold"], 1000);
    }

    #[test]
    fn test_progress_message() {
        let event = HostEvent::Batch(BatchEvent::Progress(BatchProgress::for_chunk(1, 120)));
        assert_eq!(event.message(), "Processing batch 2/3 (100/120 items, 83%)");

        let param = event.to_logging_param();
        assert_eq!(param.level, LoggingLevel::Info);
        assert_eq!(param.data["data"]["progress"]["batchNumber"], 2);
    }

    #[test]
    fn test_result_message() {
        let event = HostEvent::Batch(BatchEvent::Result(BatchRecord::Check(CheckRecord {
            id: "@a".to_string(),
            found: true,
            twitter: true,
            farcaster: false,
        })));
        assert_eq!(event.message(), "Found: @a");
        assert_eq!(event.data()["type"], "result");
    }

    #[test]
    fn test_send_never_fails() {
        Notifier::disabled().send(HostEvent::Info {
            message: "ignored".to_string(),
            data: Value::Null,
        });

        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.send(HostEvent::Info {
            message: "dropped".to_string(),
            data: Value::Null,
        });
    }

    #[tokio::test]
    async fn test_channel_delivers_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        for n in 0..3 {
            notifier.send(HostEvent::Info {
                message: format!("event {}", n),
                data: Value::Null,
            });
        }
        for n in 0..3 {
            assert_eq!(rx.recv().await.unwrap().message(), format!("event {}", n));
        }
    }

    #[test]
    fn test_level_filter_defaults_to_everything() {
        let filter = LevelFilter::default();
        assert!(filter.allows(&LoggingLevel::Debug));
        assert!(filter.allows(&LoggingLevel::Emergency));
    }

    #[tokio::test]
    async fn test_events_below_requested_level_are_dropped() {
        let filter = LevelFilter::default();
        let (notifier, mut rx) = Notifier::channel();
        let notifier = notifier.with_filter(filter.clone());

        filter.set(&LoggingLevel::Warning);
        notifier.send(HostEvent::Batch(BatchEvent::Progress(BatchProgress::for_chunk(0, 10))));
        notifier.send(HostEvent::CreditAlert(CreditAlert {
            level: AlertLevel::Low,
            credits: 900,
            threshold: 1000,
        }));
        drop(notifier);

        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.level(), LoggingLevel::Warning);
        assert!(rx.recv().await.is_none());
    }
}
