//! PagePacer -- priority-bucketed, admission-controlled page prefetching.
//!
//! This crate provides the core scheduling library for server-hinted
//! resource prefetching: hint parsing into priority buckets, per-request
//! timing, and the admission-controlled scheduler that dispatches
//! prefetch/preload directives to a DOM-injection agent in per-tier waves.

pub mod agent;
pub mod headers;
pub mod hints;
pub mod replay;
pub mod scheduler;
pub mod timing;

pub use agent::{AgentMessage, AgentSink, Classification, DirectiveKind};
pub use headers::HeaderList;
pub use hints::{PrefetchResource, PriorityBuckets, HINT_DELIMITER, NUM_PRIORITIES};
pub use scheduler::{
    AdmissionScheduler, NetworkEvent, MAX_MAIN_FRAME_PRIORITY, OUTSTANDING_REQUESTS_ALLOWED,
};
pub use timing::{PrefetchClass, TimingTracker};
