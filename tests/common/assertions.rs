//! Custom test assertions for integration tests

use std::time::Duration;
use tokio::sync::broadcast;
use vidfetch::{Event, Notification, Orchestrator, SessionTag};

/// Drive `orchestrator` until it settles, panicking after `timeout`
pub async fn settle_within(orchestrator: &mut Orchestrator, timeout: Duration) -> SessionTag {
    tokio::time::timeout(timeout, orchestrator.run_until_settled())
        .await
        .unwrap_or_else(|_| {
            panic!(
                "orchestrator still {} after {:?}",
                orchestrator.tag(),
                timeout
            )
        })
}

/// Every event already buffered for `events`
pub fn drain(events: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Notifications among `events`
pub fn notifications(events: &[Event]) -> Vec<Notification> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Notification(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}

/// Assert exactly one notification was raised, with this title and message
pub fn assert_single_notification(events: &[Event], title: &str, message: &str) {
    let notes = notifications(events);
    assert_eq!(notes.len(), 1, "expected one notification, got {:?}", notes);
    assert_eq!(notes[0].title, title);
    assert_eq!(notes[0].message, message);
}

/// Percentages of the progress events among `events`, in order
pub fn progress_percentages(events: &[Event]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Progress(p) => Some(p.percentage),
            _ => None,
        })
        .collect()
}
