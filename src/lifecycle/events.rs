//! Lifecycle event publication.
//!
//! Events are fire-and-forget: emission never blocks and never fails,
//! subscribers that fall behind miss events rather than slowing the
//! server down.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::Settings;

/// Structured record of one handled request, carried by [`Event::Log`].
#[derive(Clone, Debug, Serialize)]
pub struct RequestLog {
    /// Request body, up to a fixed limit; empty when absent or too
    /// large to buffer.
    pub body: String,
    /// Source IP, honouring `x-forwarded-for` when present.
    pub ip: String,
    pub method: String,
    /// Original URL including the query string.
    pub url: String,
    pub query: BTreeMap<String, String>,
    /// Path parameters bound by the matched route, if any.
    pub params: BTreeMap<String, String>,
}

/// A lifecycle notification.
#[derive(Clone, Debug)]
pub enum Event {
    /// The listener bound successfully; payload is the effective
    /// configuration.
    Start(Settings),
    /// The listener closed.
    End,
    /// One request passed through the logging tap.
    Log(RequestLog),
}

/// Broadcast publisher for lifecycle events.
///
/// Cheap to clone; all clones publish to the same subscribers.
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self { tx }
    }

    /// Subscribe to events emitted from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers. A send with no
    /// subscribers is not an error.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.emit(Event::End);

        match rx.recv().await {
            Ok(Event::End) => {}
            other => panic!("expected End, got {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.emit(Event::End);
    }

    #[tokio::test]
    async fn test_subscription_starts_at_subscribe_time() {
        let bus = EventBus::new();
        bus.emit(Event::End);

        let mut rx = bus.subscribe();
        bus.emit(Event::Start(Settings::default()));

        match rx.recv().await {
            Ok(Event::Start(_)) => {}
            other => panic!("expected Start, got {:?}", other),
        }
    }
}
