//! Alert delivery.
//!
//! Alerts raised by state transitions go straight to the [`AlertSink`]
//! ([`Delivery::Immediate`]). Alerts raised outside a transition can be
//! handed to a bounded FIFO queue instead ([`Delivery::Deferred`]); the
//! [`NotificationRelay`] drains it one entry at a time. A full queue makes
//! the producer wait for a free slot, nothing is dropped.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use homeguard_core::constants::{MAX_NOTIFICATION_LEN, NOTIFICATION_QUEUE_CAPACITY};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::sink::AlertSink;

/// How an alert reaches the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Delivered synchronously by the caller.
    Immediate,
    /// Queued and delivered by the relay task.
    Deferred,
}

/// An alert waiting in the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNotification {
    pub id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl PendingNotification {
    /// Create a queued alert. Messages are cut to 95 characters.
    pub fn new(message: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: truncate(message, MAX_NOTIFICATION_LEN),
            created_at: Utc::now(),
        }
    }
}

fn truncate(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// Cloneable front end for raising alerts.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn AlertSink>,
    queue: mpsc::Sender<PendingNotification>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("queue_capacity", &self.queue.max_capacity())
            .finish_non_exhaustive()
    }
}

impl Notifier {
    /// Create a notifier and the relay that drains its queue.
    pub fn new(sink: Arc<dyn AlertSink>) -> (Self, NotificationRelay) {
        Self::with_capacity(sink, NOTIFICATION_QUEUE_CAPACITY)
    }

    pub fn with_capacity(sink: Arc<dyn AlertSink>, capacity: usize) -> (Self, NotificationRelay) {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let relay = NotificationRelay {
            rx,
            sink: Arc::clone(&sink),
        };
        (Self { sink, queue }, relay)
    }

    /// Report an alert.
    ///
    /// Deferred alerts wait for queue space when the queue is full. If the
    /// relay is gone the alert is delivered directly.
    pub async fn report(&self, message: &str, delivery: Delivery) {
        match delivery {
            Delivery::Immediate => deliver(self.sink.as_ref(), message),
            Delivery::Deferred => {
                let pending = PendingNotification::new(message);
                debug!(id = %pending.id, "Queueing notification");
                if let Err(mpsc::error::SendError(pending)) = self.queue.send(pending).await {
                    warn!(id = %pending.id, "Notification relay stopped, delivering directly");
                    deliver(self.sink.as_ref(), &pending.message);
                }
            }
        }
    }

    /// Free slots in the deferred queue.
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }
}

fn deliver(sink: &dyn AlertSink, message: &str) {
    warn!("ALERT: {}", message);
    sink.report(message);
}

/// Consumer side of the deferred queue.
pub struct NotificationRelay {
    rx: mpsc::Receiver<PendingNotification>,
    sink: Arc<dyn AlertSink>,
}

impl std::fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("queued", &self.rx.len())
            .finish_non_exhaustive()
    }
}

impl NotificationRelay {
    /// Deliver queued alerts in order until every [`Notifier`] is dropped.
    pub async fn run(mut self) {
        while let Some(pending) = self.rx.recv().await {
            self.deliver(&pending);
        }
        info!("Notification relay stopped");
    }

    /// Deliver whatever is queued right now without waiting.
    pub fn drain(&mut self) -> usize {
        let mut delivered = 0;
        while let Ok(pending) = self.rx.try_recv() {
            self.deliver(&pending);
            delivered += 1;
        }
        delivered
    }

    fn deliver(&self, pending: &PendingNotification) {
        debug!(
            id = %pending.id,
            queued_for_ms = (Utc::now() - pending.created_at).num_milliseconds(),
            "Relaying notification"
        );
        deliver(self.sink.as_ref(), &pending.message);
    }
}
