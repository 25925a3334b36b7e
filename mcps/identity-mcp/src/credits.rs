//! Credit balance tracking for API-key sessions.
//!
//! The balance is never computed locally: it is whatever the server last
//! reported, through the `X-Credits-Remaining` header or `/api/me`. Alerts
//! fire only when a report crosses a threshold downward, at most one per
//! report, with the critical threshold taking precedence.

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::debug;

use crate::auth::AuthMode;

/// Default low-balance alert threshold, in credits
pub const DEFAULT_ALERT_THRESHOLD: u64 = 1000;

/// Fixed critical threshold, in credits
pub const CRITICAL_THRESHOLD: u64 = 100;

/// Which threshold a report crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Low,
}

/// A downward threshold crossing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditAlert {
    pub level: AlertLevel,
    pub credits: u64,
    pub threshold: u64,
}

impl CreditAlert {
    pub fn message(&self) -> String {
        match self.level {
            AlertLevel::Critical => format!(
                "Critical: only {} credits remaining (at or below {}). Purchase more credits to avoid interruption.",
                self.credits, self.threshold
            ),
            AlertLevel::Low => format!(
                "Low credits: {} remaining (alert threshold {}).",
                self.credits, self.threshold
            ),
        }
    }
}

/// Point-in-time view of the tracker, for status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditSnapshot {
    pub tracking: bool,
    pub last_known: Option<u64>,
    pub threshold: u64,
    pub critical_threshold: u64,
}

#[derive(Debug)]
struct TrackerState {
    last_known: Option<u64>,
    threshold: u64,
}

/// Last known balance plus the mutable alert threshold
#[derive(Debug)]
pub struct CreditTracker {
    tracking: bool,
    state: Mutex<TrackerState>,
}

fn crossed(previous: u64, current: u64, threshold: u64) -> bool {
    previous > threshold && current <= threshold
}

impl CreditTracker {
    /// Only API-key sessions have a balance to track
    pub fn new(mode: AuthMode, threshold: u64) -> Self {
        Self {
            tracking: mode == AuthMode::ApiKey,
            state: Mutex::new(TrackerState {
                last_known: None,
                threshold,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a server-reported balance and return the alert it triggers,
    /// if any
    pub fn observe(&self, balance: Option<u64>) -> Option<CreditAlert> {
        let credits = balance?;
        if !self.tracking {
            return None;
        }

        let mut state = self.lock();
        let previous = state.last_known.replace(credits);
        debug!(?previous, credits, "credit balance observed");

        let previous = previous?;
        if crossed(previous, credits, CRITICAL_THRESHOLD) {
            Some(CreditAlert {
                level: AlertLevel::Critical,
                credits,
                threshold: CRITICAL_THRESHOLD,
            })
        } else if crossed(previous, credits, state.threshold) {
            Some(CreditAlert {
                level: AlertLevel::Low,
                credits,
                threshold: state.threshold,
            })
        } else {
            None
        }
    }

    /// Replace the low-balance threshold, returning the previous one.
    /// Past balances are not re-evaluated.
    pub fn set_threshold(&self, threshold: u64) -> u64 {
        std::mem::replace(&mut self.lock().threshold, threshold)
    }

    pub fn threshold(&self) -> u64 {
        self.lock().threshold
    }

    pub fn last_known(&self) -> Option<u64> {
        self.lock().last_known
    }

    pub fn snapshot(&self) -> CreditSnapshot {
        let state = self.lock();
        CreditSnapshot {
            tracking: self.tracking,
            last_known: state.last_known,
            threshold: state.threshold,
            critical_threshold: CRITICAL_THRESHOLD,
        }
    }
}

/// Parse the numeric credit hint header
pub fn parse_credit_hint(value: &str) -> Option<u64> {
    let value = value.trim();
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.floor() as u64)
    })
}
