//! Injected timestamp source.
//!
//! # Responsibility
//! - Provide the single clock used for all persisted timestamps.
//! - Keep progress aggregation and tests deterministic.
//!
//! # Invariants
//! - All persisted timestamps are Unix epoch milliseconds.
//! - Core code never reads ambient wall-clock time outside this module.

use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp source for persisted `createdAt`/`updatedAt`/`lastUpdated` fields.
pub trait Clock {
    /// Current time as Unix epoch milliseconds.
    fn now_epoch_ms(&self) -> i64;
}

/// Wall-clock implementation used by production callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        since_epoch.as_millis() as i64
    }
}

/// Fixed-instant clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    epoch_ms: i64,
}

impl FixedClock {
    pub fn new(epoch_ms: i64) -> Self {
        Self { epoch_ms }
    }
}

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.epoch_ms
    }
}
