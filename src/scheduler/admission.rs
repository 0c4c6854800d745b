//! The admission-controlled scheduler state machine.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, warn};

use crate::agent::{AgentMessage, AgentSink, Classification, DirectiveKind};
use crate::hints::{PrefetchResource, PriorityBuckets};
use crate::scheduler::{NetworkEvent, MAX_MAIN_FRAME_PRIORITY, OUTSTANDING_REQUESTS_ALLOWED};
use crate::timing::{PrefetchClass, TimingTracker, NO_TIMESTAMP};

/// Stateful prefetch scheduler.
///
/// Owns all scheduling state exclusively; the only way anything leaves is
/// through the [`AgentSink`] handed in at construction. Handlers run to
/// completion without suspension, so state is race-free as long as one
/// owner feeds events in arrival order (see [`super::run_event_loop`]).
pub struct AdmissionScheduler<S: AgentSink> {
    sink: S,
    timing: TimingTracker,
    buckets: PriorityBuckets,
    /// Resources selected for dispatch, all from `cur_fetch_priority`.
    /// Non-empty only between a refill and its full drain.
    queued: VecDeque<PrefetchResource>,
    /// URLs with an in-flight dispatched request.
    outstanding: HashSet<String>,
    /// URLs the browser already issued a real request for. Append-only.
    requested: HashSet<String>,
    landing_page_url: String,
    navigated: bool,
    /// Tier of the current wave; `None` until the first wave opens.
    cur_fetch_priority: Option<usize>,
    started: bool,
    agent_ready: bool,
}

impl<S: AgentSink> AdmissionScheduler<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            timing: TimingTracker::new(),
            buckets: PriorityBuckets::new(),
            queued: VecDeque::new(),
            outstanding: HashSet::new(),
            requested: HashSet::new(),
            landing_page_url: String::new(),
            navigated: false,
            cur_fetch_priority: None,
            started: false,
            agent_ready: false,
        }
    }

    /// Begin reacting to events. Idempotent; the second and later calls are
    /// no-ops. There is no stop: the scheduler lives for the session.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        info!("prefetch scheduler running");
    }

    /// Apply one network lifecycle event. Events delivered before
    /// [`start`](Self::start) are dropped.
    pub fn handle_event(&mut self, event: NetworkEvent) {
        if !self.started {
            debug!(?event, "event before start; ignoring");
            return;
        }
        match event {
            NetworkEvent::RequestHeadersSent {
                url,
                request_id,
                timestamp_ms,
                headers,
            } => {
                let is_prefetch = headers.has_value("purpose", "prefetch");
                self.on_request_headers_sent(&url, &request_id, timestamp_ms, is_prefetch);
            }
            NetworkEvent::ResponseHeadersReceived { url, headers } => {
                if let Some(value) = headers.get("x-prefetch") {
                    info!(%url, "hint header received");
                    self.buckets.parse_hints(value);
                }
                if let Some(value) = headers.get("x-lp-url") {
                    debug!(%url, landing_page = %value, "landing page set");
                    self.landing_page_url = value.to_string();
                }
            }
            NetworkEvent::RequestCompleted {
                url,
                request_id,
                timestamp_ms,
            }
            | NetworkEvent::RequestErrored {
                url,
                request_id,
                timestamp_ms,
            } => {
                self.on_request_finished(&url, &request_id, timestamp_ms);
            }
            NetworkEvent::AgentReady => {
                if !self.agent_ready {
                    self.agent_ready = true;
                    debug!("agent ready; seeding first wave");
                    self.refill();
                }
            }
        }
    }

    fn on_request_headers_sent(
        &mut self,
        url: &str,
        request_id: &str,
        timestamp_ms: f64,
        is_prefetch: bool,
    ) {
        self.timing
            .register_request(request_id, timestamp_ms, is_prefetch);

        if !self.navigated && !self.landing_page_url.is_empty() && url == self.landing_page_url {
            self.navigated = true;
            info!(%url, "navigated to destination");
            self.sink.send(AgentMessage::NavigatedToDestination {
                url: url.to_string(),
            });
        }

        // Any real request for a URL suppresses a later hinted dispatch of
        // the same URL.
        self.requested.insert(url.to_string());
    }

    /// Shared completion path for completed and errored requests.
    fn on_request_finished(&mut self, url: &str, request_id: &str, timestamp_ms: f64) {
        self.outstanding.remove(url);

        let elapsed_ms = self.timing.complete_request(request_id, timestamp_ms);
        let classification = match self.timing.prefetch_class(request_id) {
            PrefetchClass::Yes => Classification::Prefetch,
            PrefetchClass::No => Classification::Actual,
            PrefetchClass::Unknown => {
                warn!(%url, %request_id, "completion for unknown request id");
                Classification::Unknown
            }
        };

        self.sink.send(AgentMessage::TimingLog {
            url: url.to_string(),
            request_id: request_id.to_string(),
            elapsed_ms,
            request_ms: self.timing.request_time(request_id),
            complete_ms: self.timing.complete_time(request_id),
            classification,
        });

        self.refill();
    }

    /// Top up in-flight requests from the current wave, opening the next
    /// tier only once the previous wave has fully drained.
    fn refill(&mut self) {
        if self.outstanding.len() >= OUTSTANDING_REQUESTS_ALLOWED {
            return;
        }

        // Wave policy: a new tier opens only when nothing is in flight and
        // the previous batch is gone. Capacity alone is not enough.
        if self.outstanding.is_empty() && self.queued.is_empty() {
            if let Some(tier) = self.buckets.first_occupied() {
                self.queued = self.buckets.drain_tier(tier);
                self.cur_fetch_priority = Some(tier);
                info!(tier, batch = self.queued.len(), "opened prefetch wave");
            }
        }

        let Some(priority) = self.cur_fetch_priority else {
            return;
        };
        while self.outstanding.len() < OUTSTANDING_REQUESTS_ALLOWED {
            let Some(resource) = self.queued.pop_front() else {
                break;
            };
            self.dispatch(resource, priority);
        }
    }

    fn dispatch(&mut self, resource: PrefetchResource, priority: usize) {
        if self.requested.contains(&resource.url) {
            debug!(url = %resource.url, "browser already requested; suppressing");
            self.sink.send(AgentMessage::TimingLog {
                url: resource.url,
                request_id: String::new(),
                elapsed_ms: NO_TIMESTAMP,
                request_ms: NO_TIMESTAMP,
                complete_ms: NO_TIMESTAMP,
                classification: Classification::LatePrefetch,
            });
            return;
        }

        // Post-navigation the top tiers upgrade to preload; deeper tiers
        // stay prefetch regardless.
        let directive = if self.navigated && priority <= MAX_MAIN_FRAME_PRIORITY {
            DirectiveKind::Preload
        } else {
            DirectiveKind::Prefetch
        };

        debug!(
            url = %resource.url,
            ?directive,
            tier = priority,
            outstanding = self.outstanding.len(),
            "dispatching"
        );
        self.outstanding.insert(resource.url.clone());
        self.sink.send(AgentMessage::Inject {
            directive,
            url: resource.url,
            resource_type: resource.resource_type,
        });
    }

    /// Number of dispatched requests currently in flight.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    /// Hinted resources still waiting in the buckets.
    pub fn pending(&self) -> usize {
        self.buckets.pending()
    }

    pub fn navigated(&self) -> bool {
        self.navigated
    }

    pub fn landing_page_url(&self) -> &str {
        &self.landing_page_url
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Tear down and hand back the sink, e.g. to collect a
    /// [`RecordingSink`](crate::agent::RecordingSink)'s messages.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
