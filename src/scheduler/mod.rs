//! Admission-controlled prefetch scheduling.
//!
//! The scheduler ingests network lifecycle events, buckets server hints by
//! priority, and dispatches prefetch/preload directives in per-tier waves
//! while keeping at most [`OUTSTANDING_REQUESTS_ALLOWED`] requests in
//! flight.

pub mod admission;
pub mod engine;

pub use admission::AdmissionScheduler;
pub use engine::run_event_loop;

use serde::{Deserialize, Serialize};

use crate::headers::HeaderList;

/// Ceiling on concurrently dispatched (in-flight) prefetch requests.
pub const OUTSTANDING_REQUESTS_ALLOWED: usize = 7;

/// Highest tier index still eligible for the preload upgrade after
/// navigation; deeper tiers always dispatch as plain prefetch.
pub const MAX_MAIN_FRAME_PRIORITY: usize = 2;

/// Network lifecycle events delivered by the interception layer.
///
/// `request_id` is stable for the lifetime of one network request and
/// unique per request; completion events may arrive in any order relative
/// to other traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NetworkEvent {
    RequestHeadersSent {
        url: String,
        request_id: String,
        timestamp_ms: f64,
        #[serde(default)]
        headers: HeaderList,
    },
    ResponseHeadersReceived {
        url: String,
        #[serde(default)]
        headers: HeaderList,
    },
    RequestCompleted {
        url: String,
        request_id: String,
        timestamp_ms: f64,
    },
    RequestErrored {
        url: String,
        request_id: String,
        timestamp_ms: f64,
    },
    /// Fired once by the DOM-injection agent when it finishes its own
    /// initialization.
    AgentReady,
}
