//! Per-request latency bookkeeping.
//!
//! One entry per network request id, created when the request headers go
//! out and finalized when the completion (or error) event arrives. Pure
//! in-memory state; no I/O.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Sentinel for "no timestamp recorded". Timestamps are epoch milliseconds
/// supplied by the interception layer; real values are always >= 0.
pub const NO_TIMESTAMP: f64 = -1.0;

/// Whether a tracked request was issued as a speculative prefetch.
/// `Unknown` means the request id was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefetchClass {
    Yes,
    No,
    Unknown,
}

#[derive(Debug, Clone, Copy)]
struct TimingEntry {
    request_ms: f64,
    complete_ms: f64,
    prefetch: bool,
}

/// Start/finish timestamps and prefetch classification keyed by request id.
///
/// Completion events can arrive in any order relative to other traffic, so
/// every operation keys on the request id rather than arrival position.
#[derive(Debug, Default)]
pub struct TimingTracker {
    entries: HashMap<String, TimingEntry>,
}

impl TimingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a request. Re-registering an id overwrites the
    /// previous entry.
    pub fn register_request(&mut self, request_id: &str, timestamp_ms: f64, is_prefetch: bool) {
        self.entries.insert(
            request_id.to_string(),
            TimingEntry {
                request_ms: timestamp_ms,
                complete_ms: NO_TIMESTAMP,
                prefetch: is_prefetch,
            },
        );
    }

    /// Finalize a request and return its elapsed milliseconds. Returns
    /// [`NO_TIMESTAMP`] and mutates nothing when the id was never registered.
    pub fn complete_request(&mut self, request_id: &str, timestamp_ms: f64) -> f64 {
        match self.entries.get_mut(request_id) {
            Some(entry) => {
                entry.complete_ms = timestamp_ms;
                timestamp_ms - entry.request_ms
            }
            None => NO_TIMESTAMP,
        }
    }

    pub fn prefetch_class(&self, request_id: &str) -> PrefetchClass {
        match self.entries.get(request_id) {
            Some(entry) if entry.prefetch => PrefetchClass::Yes,
            Some(_) => PrefetchClass::No,
            None => PrefetchClass::Unknown,
        }
    }

    /// Start timestamp for `request_id`, or [`NO_TIMESTAMP`] if unknown.
    pub fn request_time(&self, request_id: &str) -> f64 {
        self.entries
            .get(request_id)
            .map_or(NO_TIMESTAMP, |e| e.request_ms)
    }

    /// Completion timestamp for `request_id`, or [`NO_TIMESTAMP`] if unknown
    /// or still pending.
    pub fn complete_time(&self, request_id: &str) -> f64 {
        self.entries
            .get(request_id)
            .map_or(NO_TIMESTAMP, |e| e.complete_ms)
    }
}
