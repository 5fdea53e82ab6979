//! Progress and alert notifications
//!
//! Detection runs report what they are doing through an [`EventSink`].
//! Emission is fire-and-forget: sinks get a borrowed event, nothing is
//! returned, and a panicking sink is isolated by [`Notifier`] so it cannot
//! abort the run. [`ChannelSink`] hands events to another thread over a
//! bounded channel without ever blocking the producer.

use crate::detector::AlertSeverity;
use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// One baseline/current pair has been compared
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// 1-based position among the pairs being compared
    pub index: usize,
    pub total: usize,
    pub test_key: String,
}

/// Alerts raised at one severity tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    pub severity: AlertSeverity,
    pub count: usize,
    /// `suite.test:metric` for every alert in the tier
    pub alerts: Vec<String>,
}

/// Notification emitted during a detection run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    Progress(ProgressEvent),
    Alert(AlertEvent),
    HealthDegraded { health_score: f64 },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Progress(_) => "progress",
            Event::Alert(_) => "alert",
            Event::HealthDegraded { .. } => "health_degraded",
        }
    }
}

/// Receiver of detection events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Event);
}

impl<F> EventSink for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn emit(&self, event: &Event) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Event) {}
}

/// Forwards events over a bounded crossbeam channel
///
/// A full or disconnected channel drops the event instead of blocking.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: Sender<Event>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn bounded(capacity: usize) -> (Self, Receiver<Event>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &Event) {
        match self.sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::debug!("Event channel full, dropping {} event", dropped.kind());
            }
            Err(TrySendError::Disconnected(dropped)) => {
                tracing::debug!("Event channel closed, dropping {} event", dropped.kind());
            }
        }
    }
}

/// Shared, panic-isolating handle to an event sink
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn EventSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Notifier that drops everything
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn notify(&self, event: Event) {
        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink.emit(&event))).is_err() {
            tracing::warn!(
                "Event observer panicked while handling a {} event; continuing",
                event.kind()
            );
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
