//! Offline replay of recorded network-event traces.
//!
//! A trace is a JSONL file: one serialized [`NetworkEvent`] per line, in
//! the order the interception layer observed them. Replaying a trace runs
//! the full scheduling pipeline without a browser and yields the agent
//! traffic it would have produced.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::agent::{AgentMessage, RecordingSink};
use crate::scheduler::{AdmissionScheduler, NetworkEvent};

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Load a JSONL trace file. Blank lines are skipped.
pub fn load_trace(path: &Path) -> Result<Vec<NetworkEvent>, TraceError> {
    let contents = fs::read_to_string(path)?;
    let mut events = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event =
            serde_json::from_str(line).map_err(|source| TraceError::Parse {
                line: idx + 1,
                source,
            })?;
        events.push(event);
    }
    Ok(events)
}

/// Feed a trace through a fresh scheduler and return the agent messages it
/// emitted, in order.
pub fn run_trace(events: Vec<NetworkEvent>) -> Vec<AgentMessage> {
    let mut scheduler = AdmissionScheduler::new(RecordingSink::default());
    scheduler.start();
    let total = events.len();
    for event in events {
        scheduler.handle_event(event);
    }
    tracing::info!(
        events = total,
        outstanding = scheduler.outstanding(),
        pending = scheduler.pending(),
        "trace replay finished"
    );
    scheduler.into_sink().messages
}
