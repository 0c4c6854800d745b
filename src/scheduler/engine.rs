//! Async event pump between the interception layer and the scheduler.

use tokio::sync::mpsc;
use tracing::info;

use crate::agent::AgentSink;
use crate::scheduler::{AdmissionScheduler, NetworkEvent};

/// Drive a scheduler from a channel of network events.
///
/// Events are applied one at a time, to completion, in arrival order; the
/// channel boundary is the only suspension point, which is what makes the
/// scheduler's state race-free without any locking. Returns the scheduler
/// when the sending side closes so callers can inspect final state.
pub async fn run_event_loop<S: AgentSink>(
    mut events: mpsc::UnboundedReceiver<NetworkEvent>,
    mut scheduler: AdmissionScheduler<S>,
) -> AdmissionScheduler<S> {
    scheduler.start();
    while let Some(event) = events.recv().await {
        scheduler.handle_event(event);
    }
    info!("network event channel closed; scheduler loop exiting");
    scheduler
}
