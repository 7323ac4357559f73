//! Per-identity request budget over a resetting window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::abuse::BlockStatus;
use crate::clock::Clock;

/// Default window length in seconds (1 hour).
pub const DEFAULT_WINDOW_SECS: u64 = 3600;

/// Default request budget per window.
pub const DEFAULT_MAX_REQUESTS: u64 = 1000;

/// Rate limiter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per identity per window.
    pub max_requests: u64,
    /// Length of the window.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Request count and start of the current window for one identity.
#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u64,
    window_start: Instant,
}

/// In-memory per-identity rate limiter.
///
/// The window resets on the first request after it has expired; there is
/// no partial carry-over. Identities serving an abuse block are reported
/// as limited without consuming budget.
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    blocks: Arc<dyn BlockStatus>,
    records: Mutex<HashMap<String, WindowRecord>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>, blocks: Arc<dyn BlockStatus>) -> Self {
        Self {
            config,
            clock,
            blocks,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one request from `identity` and report whether it is over
    /// budget or blocked.
    ///
    /// This is not a pure query: every call that is not short-circuited by
    /// a block consumes one unit of budget, including calls that return
    /// `true`.
    pub fn is_rate_limited(&self, identity: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock();
        let record = records
            .entry(identity.to_string())
            .or_insert(WindowRecord {
                count: 0,
                window_start: now,
            });

        if now.duration_since(record.window_start) > self.config.window {
            record.count = 0;
            record.window_start = now;
        }

        // Lock order: limiter map, then the tracker's map inside is_blocked.
        if self.blocks.is_blocked(identity) {
            return true;
        }

        record.count = record.count.saturating_add(1);
        record.count > self.config.max_requests
    }

    /// Requests counted for `identity` in its current window.
    pub fn request_count(&self, identity: &str) -> u64 {
        self.records.lock().get(identity).map_or(0, |r| r.count)
    }

    /// Number of identities with a window record.
    pub fn tracked(&self) -> usize {
        self.records.lock().len()
    }

    /// Drop records whose window has expired. The next request from such an
    /// identity would reset the window anyway.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let window = self.config.window;
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| now.duration_since(record.window_start) <= window);
        before - records.len()
    }
}
