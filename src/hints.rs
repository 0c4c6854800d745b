//! Prefetch hint wire format and the priority bucket store.
//!
//! The server declares prefetchable resources in the `x-prefetch` response
//! header: entries of the form `<URL>; priority=<int>; type=<token>` joined
//! by [`HINT_DELIMITER`]. Parsed resources land in one of 100 priority
//! tiers (tier 0 = highest) in arrival order, waiting for the scheduler's
//! refill pass to drain them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Number of priority tiers. Hint priorities are clamped into
/// `[0, NUM_PRIORITIES - 1]`.
pub const NUM_PRIORITIES: usize = 100;

/// Entry separator in the `x-prefetch` header value. A character run that
/// does not occur in URLs or type tokens.
pub const HINT_DELIMITER: &str = "|$de|";

/// One server-hinted resource. Immutable once parsed; duplicates are kept
/// as-is (dedup happens at dispatch time, not parse time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefetchResource {
    pub url: String,
    /// Preload `as` token, e.g. `script`, `style`, `image`.
    pub resource_type: String,
    pub priority: usize,
}

/// Pending resources bucketed by priority tier, FIFO within a tier.
///
/// Mutated from exactly two places: the hint parser appends, the
/// scheduler's refill pass drains a whole tier.
#[derive(Debug)]
pub struct PriorityBuckets {
    tiers: Vec<VecDeque<PrefetchResource>>,
}

impl Default for PriorityBuckets {
    fn default() -> Self {
        Self {
            tiers: (0..NUM_PRIORITIES).map(|_| VecDeque::new()).collect(),
        }
    }
}

impl PriorityBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource to its tier, clamping out-of-range priorities to
    /// the lowest tier.
    pub fn push(&mut self, mut resource: PrefetchResource) {
        let tier = resource.priority.min(NUM_PRIORITIES - 1);
        resource.priority = tier;
        self.tiers[tier].push_back(resource);
    }

    /// Parse a raw `x-prefetch` header value into the buckets.
    ///
    /// Precondition: the value comes from a trusted hint source and is
    /// well-formed. Parsing stays total regardless (a missing `priority=`
    /// falls back to 0, a missing `type=` to an empty token), but no
    /// guarantees are made about what malformed text parses into.
    pub fn parse_hints(&mut self, raw: &str) {
        for entry in raw.split(HINT_DELIMITER) {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            self.push(parse_entry(entry));
        }
    }

    /// Index of the first (highest-priority) non-empty tier.
    pub fn first_occupied(&self) -> Option<usize> {
        self.tiers.iter().position(|t| !t.is_empty())
    }

    /// Remove and return every resource in `tier`, preserving arrival order.
    pub fn drain_tier(&mut self, tier: usize) -> VecDeque<PrefetchResource> {
        match self.tiers.get_mut(tier) {
            Some(slot) => std::mem::take(slot),
            None => VecDeque::new(),
        }
    }

    /// Total resources still waiting across all tiers.
    pub fn pending(&self) -> usize {
        self.tiers.iter().map(VecDeque::len).sum()
    }

    /// Non-empty tiers and their queued resources, highest priority first.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, &VecDeque<PrefetchResource>)> {
        self.tiers
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
    }
}

/// Parse one `<URL>; priority=<int>; type=<token>` entry.
fn parse_entry(entry: &str) -> PrefetchResource {
    let mut segments = entry.split(';').map(str::trim);

    let url = segments
        .next()
        .unwrap_or("")
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string();

    let mut priority = 0;
    let mut resource_type = String::new();
    for segment in segments {
        if let Some(value) = segment.strip_prefix("priority=") {
            priority = value.trim().parse().unwrap_or(0);
        } else if let Some(value) = segment.strip_prefix("type=") {
            resource_type = value.trim().to_string();
        }
    }

    PrefetchResource {
        url,
        resource_type,
        priority,
    }
}

/// Format resources as an `x-prefetch` header value, the exact inverse of
/// [`PriorityBuckets::parse_hints`]. This is what the hint server emits.
pub fn encode_hints(resources: &[PrefetchResource]) -> String {
    resources
        .iter()
        .map(|r| {
            format!(
                "<{}>; priority={}; type={}",
                r.url, r.priority, r.resource_type
            )
        })
        .collect::<Vec<_>>()
        .join(HINT_DELIMITER)
}
