//! End-to-end scheduling scenarios driven through the public API.

use pagepacer::agent::{AgentMessage, RecordingSink};
use pagepacer::{
    AdmissionScheduler, Classification, DirectiveKind, HeaderList, NetworkEvent,
    OUTSTANDING_REQUESTS_ALLOWED,
};

fn new_scheduler() -> AdmissionScheduler<RecordingSink> {
    let mut scheduler = AdmissionScheduler::new(RecordingSink::default());
    scheduler.start();
    scheduler
}

fn redirect_response(headers: &[(&str, &str)]) -> NetworkEvent {
    NetworkEvent::ResponseHeadersReceived {
        url: "http://server/redirect".to_string(),
        headers: HeaderList::from_pairs(headers),
    }
}

fn request_sent(url: &str, request_id: &str, ts: f64) -> NetworkEvent {
    NetworkEvent::RequestHeadersSent {
        url: url.to_string(),
        request_id: request_id.to_string(),
        timestamp_ms: ts,
        headers: HeaderList::new(),
    }
}

fn completed(url: &str, request_id: &str, ts: f64) -> NetworkEvent {
    NetworkEvent::RequestCompleted {
        url: url.to_string(),
        request_id: request_id.to_string(),
        timestamp_ms: ts,
    }
}

fn injects(sink: &RecordingSink) -> Vec<(DirectiveKind, String)> {
    sink.messages
        .iter()
        .filter_map(|m| match m {
            AgentMessage::Inject { directive, url, .. } => Some((*directive, url.clone())),
            _ => None,
        })
        .collect()
}

/// The spec'd two-tier scenario: tier 0 dispatches as one wave, the tier-5
/// resource waits until tier 0 fully completes.
#[test]
fn test_two_tier_wave_scenario() {
    let mut scheduler = new_scheduler();
    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://site/a>; priority=0; type=script|$de|\
         <http://site/b>; priority=0; type=style|$de|\
         <http://site/c>; priority=5; type=image",
    )]));
    scheduler.handle_event(NetworkEvent::AgentReady);

    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 2);
    assert_eq!(dispatched[0].1, "http://site/a");
    assert_eq!(dispatched[1].1, "http://site/b");
    assert_eq!(scheduler.pending(), 1);

    scheduler.handle_event(completed("http://site/a", "r-a", 100.0));
    assert_eq!(injects(scheduler.sink()).len(), 2, "c must wait for b");

    scheduler.handle_event(completed("http://site/b", "r-b", 120.0));
    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 3);
    assert_eq!(dispatched[2].1, "http://site/c");
}

/// Eight resources in tier 0: exactly seven go out, the eighth only after
/// a completion frees a slot. The ceiling is never exceeded.
#[test]
fn test_eight_in_tier_zero() {
    let mut scheduler = new_scheduler();
    let hints: Vec<String> = (0..8)
        .map(|i| format!("<http://site/{i}>; priority=0; type=script"))
        .collect();
    let value = hints.join("|$de|");
    scheduler.handle_event(redirect_response(&[("x-prefetch", value.as_str())]));
    scheduler.handle_event(NetworkEvent::AgentReady);

    assert_eq!(scheduler.outstanding(), 7);
    assert_eq!(injects(scheduler.sink()).len(), 7);
    assert_eq!(scheduler.outstanding(), OUTSTANDING_REQUESTS_ALLOWED);

    scheduler.handle_event(completed("http://site/3", "r-3", 50.0));
    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 8);
    assert_eq!(dispatched[7].1, "http://site/7");
    assert_eq!(scheduler.outstanding(), 7);
}

/// A URL the browser fetched for real is never dispatched speculatively;
/// it surfaces as LATE_PREFETCH in the timing log instead.
#[test]
fn test_dedup_against_real_requests() {
    let mut scheduler = new_scheduler();
    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://site/app.js>; priority=0; type=script|$de|\
         <http://site/app.css>; priority=0; type=style",
    )]));
    scheduler.handle_event(request_sent("http://site/app.js", "real-1", 10.0));
    scheduler.handle_event(NetworkEvent::AgentReady);

    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].1, "http://site/app.css");

    let late: Vec<_> = scheduler
        .sink()
        .messages
        .iter()
        .filter(|m| {
            matches!(
                m,
                AgentMessage::TimingLog {
                    url,
                    classification: Classification::LatePrefetch,
                    ..
                } if url == "http://site/app.js"
            )
        })
        .collect();
    assert_eq!(late.len(), 1);
}

/// Navigation gating across a whole session: plain prefetch before the
/// landing page is requested, preload for tiers 0-2 afterwards, prefetch
/// for deeper tiers always.
#[test]
fn test_navigation_gating() {
    let mut scheduler = new_scheduler();
    scheduler.handle_event(redirect_response(&[
        ("x-lp-url", "http://shop.example/"),
        (
            "x-prefetch",
            "<http://cdn/pre.js>; priority=1; type=script",
        ),
    ]));
    scheduler.handle_event(NetworkEvent::AgentReady);

    assert_eq!(
        injects(scheduler.sink()),
        vec![(DirectiveKind::Prefetch, "http://cdn/pre.js".to_string())]
    );

    scheduler.handle_event(request_sent("http://shop.example/", "nav", 20.0));
    assert!(scheduler.navigated());

    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://cdn/hero.css>; priority=2; type=style|$de|\
         <http://cdn/below.png>; priority=3; type=image",
    )]));
    scheduler.handle_event(completed("http://cdn/pre.js", "r-1", 30.0));
    scheduler.handle_event(completed("http://cdn/hero.css", "r-2", 40.0));

    let dispatched = injects(scheduler.sink());
    assert_eq!(
        dispatched[1],
        (DirectiveKind::Preload, "http://cdn/hero.css".to_string())
    );
    assert_eq!(
        dispatched[2],
        (DirectiveKind::Prefetch, "http://cdn/below.png".to_string())
    );
}

/// Out-of-order traffic: a completion for a request the scheduler never
/// saw the start of degrades to sentinels and scheduling continues.
#[test]
fn test_unknown_completion_degrades_gracefully() {
    let mut scheduler = new_scheduler();
    scheduler.handle_event(completed("http://site/mystery", "never-seen", 500.0));

    match &scheduler.sink().messages[..] {
        [AgentMessage::TimingLog {
            elapsed_ms,
            request_ms,
            complete_ms,
            classification,
            ..
        }] => {
            assert_eq!(*elapsed_ms, -1.0);
            assert_eq!(*request_ms, -1.0);
            assert_eq!(*complete_ms, -1.0);
            assert_eq!(*classification, Classification::Unknown);
        }
        other => panic!("expected one timing log, got {other:?}"),
    }

    // Scheduler still functional afterwards.
    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://site/next.js>; priority=0; type=script",
    )]));
    scheduler.handle_event(NetworkEvent::AgentReady);
    assert_eq!(scheduler.outstanding(), 1);
}

/// Priorities beyond the last tier clamp to tier 99 and still schedule.
#[test]
fn test_clamped_priority_schedules_last() {
    let mut scheduler = new_scheduler();
    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://site/overflow>; priority=150; type=script|$de|\
         <http://site/mid>; priority=50; type=script",
    )]));
    scheduler.handle_event(NetworkEvent::AgentReady);

    // Tier 50 wins the first wave; the clamped tier-99 resource waits.
    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].1, "http://site/mid");

    scheduler.handle_event(completed("http://site/mid", "r-1", 60.0));
    let dispatched = injects(scheduler.sink());
    assert_eq!(dispatched.len(), 2);
    assert_eq!(dispatched[1].1, "http://site/overflow");
}

/// An in-flight request whose completion never arrives holds its slot for
/// the rest of the session (documented behavior, no timeout).
#[test]
fn test_hung_request_pins_slot() {
    let mut scheduler = new_scheduler();
    let hints: Vec<String> = (0..7)
        .map(|i| format!("<http://site/{i}>; priority=0; type=script"))
        .collect();
    let value = hints.join("|$de|");
    scheduler.handle_event(redirect_response(&[("x-prefetch", value.as_str())]));
    scheduler.handle_event(NetworkEvent::AgentReady);
    assert_eq!(scheduler.outstanding(), 7);

    // Six of seven complete; resource 0 hangs forever.
    for i in 1..7 {
        scheduler.handle_event(completed(&format!("http://site/{i}"), &format!("r-{i}"), 100.0));
    }
    assert_eq!(scheduler.outstanding(), 1);

    // New hints arrive, but the wave never opens: outstanding is not empty.
    scheduler.handle_event(redirect_response(&[(
        "x-prefetch",
        "<http://site/blocked>; priority=0; type=script",
    )]));
    scheduler.handle_event(completed("http://site/unrelated", "u-1", 200.0));
    assert_eq!(injects(scheduler.sink()).len(), 7);
    assert_eq!(scheduler.pending(), 1);
}
