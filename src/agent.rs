//! Messages exchanged with the DOM-injection agent.
//!
//! The agent is the component that turns a scheduling decision into an
//! actual `<link rel="prefetch">`/`<link rel="preload">` in the page. The
//! scheduler only ever talks to it through [`AgentSink`]: fire-and-forget
//! sends, no acknowledgment, no blocking.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// How a dispatched resource should be injected into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveKind {
    /// Speculative fetch unrelated to the current navigation context.
    Prefetch,
    /// Speculative fetch flagged as relevant to the target page; used
    /// post-navigation for the top tiers.
    Preload,
}

/// How a finished (or suppressed) request is classified in the timing log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// A request the scheduler dispatched speculatively.
    Prefetch,
    /// A real browser request, not issued by the scheduler.
    Actual,
    /// A hinted resource the browser already requested for real before the
    /// scheduler could dispatch it.
    LatePrefetch,
    /// Completion for a request id that was never registered.
    Unknown,
}

/// Outbound traffic to the DOM-injection agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentMessage {
    /// Inject a prefetch/preload directive for `url` into the page.
    Inject {
        directive: DirectiveKind,
        url: String,
        resource_type: String,
    },
    /// The browser navigated to the landing page.
    NavigatedToDestination { url: String },
    /// Per-request latency record. Sentinel value `-1.0` marks timestamps
    /// that were never observed.
    TimingLog {
        url: String,
        request_id: String,
        elapsed_ms: f64,
        request_ms: f64,
        complete_ms: f64,
        classification: Classification,
    },
}

/// Capability handed to the scheduler at construction for reaching the
/// agent. Implementations must not block: the scheduler runs to completion
/// inside each event handler.
pub trait AgentSink {
    fn send(&mut self, message: AgentMessage);
}

/// Sink backed by a Tokio unbounded channel. If the agent side has gone
/// away the message is dropped; the scheduler never learns or cares.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AgentMessage>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<AgentMessage>) -> Self {
        Self { tx }
    }
}

impl AgentSink for ChannelSink {
    fn send(&mut self, message: AgentMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("agent channel closed; dropping message");
        }
    }
}

/// Sink that records every message in order. Used by the replay tool and
/// by tests asserting on dispatch behavior.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<AgentMessage>,
}

impl AgentSink for RecordingSink {
    fn send(&mut self, message: AgentMessage) {
        self.messages.push(message);
    }
}
