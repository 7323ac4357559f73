//! Consecutive authentication failure tracking and timed blocks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::{deadline, Clock};

/// Default number of failures that triggers a block.
pub const DEFAULT_MAX_FAILED_ATTEMPTS: u32 = 5;

/// Default block length in seconds.
pub const DEFAULT_BLOCK_DURATION_SECS: u64 = 300;

/// Default idle time after which an unblocked failure record is forgotten.
pub const DEFAULT_FAILURE_RETENTION_SECS: u64 = 86_400;

/// Read-only view of block state, handed to the rate limiter.
pub trait BlockStatus: Send + Sync {
    /// Whether `identity` is currently serving a block.
    fn is_blocked(&self, identity: &str) -> bool;
}

/// Abuse tracker configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbuseConfig {
    /// Failures at which the identity becomes blocked.
    pub max_failed_attempts: u32,
    /// How long a block lasts.
    pub block_duration: Duration,
    /// Idle time before the sweeper drops an unblocked record.
    pub failure_retention: Duration,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
            block_duration: Duration::from_secs(DEFAULT_BLOCK_DURATION_SECS),
            failure_retention: Duration::from_secs(DEFAULT_FAILURE_RETENTION_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FailureRecord {
    count: u32,
    blocked_until: Option<Instant>,
    last_failure: Instant,
}

/// Per-identity failure counter with escalation to a timed block.
pub struct AbuseTracker {
    config: AbuseConfig,
    clock: Arc<dyn Clock>,
    records: Mutex<HashMap<String, FailureRecord>>,
}

impl AbuseTracker {
    pub fn new(config: AbuseConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AbuseConfig {
        &self.config
    }

    /// Record one failed authentication attempt for `identity`.
    ///
    /// An expired block is cleared (and the count restarted) before the new
    /// failure is counted. Reaching the threshold sets the block.
    pub fn record_failed_attempt(&self, identity: &str) {
        let now = self.clock.now();
        let mut records = self.records.lock();
        let record = records
            .entry(identity.to_string())
            .or_insert(FailureRecord {
                count: 0,
                blocked_until: None,
                last_failure: now,
            });

        if record.blocked_until.is_some_and(|until| until <= now) {
            record.count = 0;
            record.blocked_until = None;
        }

        record.count = record.count.saturating_add(1);
        record.last_failure = now;

        if record.count >= self.config.max_failed_attempts {
            let newly_blocked = record.blocked_until.is_none();
            record.blocked_until = Some(deadline(now, self.config.block_duration));
            if newly_blocked {
                tracing::warn!(
                    identity,
                    failures = record.count,
                    block_secs = self.config.block_duration.as_secs(),
                    "client blocked after repeated authentication failures"
                );
            }
        }
    }

    /// Failures counted for `identity` since the last reset.
    pub fn failure_count(&self, identity: &str) -> u32 {
        self.records.lock().get(identity).map_or(0, |r| r.count)
    }

    /// End of the current block, if one has been set (it may have expired).
    pub fn blocked_until(&self, identity: &str) -> Option<Instant> {
        self.records.lock().get(identity).and_then(|r| r.blocked_until)
    }

    /// Number of identities with a failure record.
    pub fn tracked(&self) -> usize {
        self.records.lock().len()
    }

    /// Drop records whose block has expired, and unblocked records idle for
    /// longer than the retention period. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let retention = self.config.failure_retention;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| match record.blocked_until {
            Some(until) => until > now,
            None => now.duration_since(record.last_failure) <= retention,
        });
        before - records.len()
    }
}

impl BlockStatus for AbuseTracker {
    fn is_blocked(&self, identity: &str) -> bool {
        let now = self.clock.now();
        self.records
            .lock()
            .get(identity)
            .and_then(|r| r.blocked_until)
            .is_some_and(|until| until > now)
    }
}
