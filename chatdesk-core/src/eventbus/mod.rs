//! src/eventbus/mod.rs
//!
//! Provides an in-process event bus that supports guaranteed delivery
//! to multiple subscribers via bounded MPSC queues. This is the sole
//! write-notification channel exposed to the notification layer and
//! the REST read side.

use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

use chatdesk_common::models::{AccountStatus, Contact, Message, Ticket};

/// Domain events published by the session manager and the ingestion
/// pipeline. One typed variant per event kind; no stringly-typed names.
#[derive(Debug, Clone)]
pub enum DeskEvent {
    /// The network issued a pairing QR code for an account.
    QrCodeIssued {
        account_id: i32,
        payload: String,
    },

    /// A session changed connection state. `reason` is set on disconnects;
    /// `retries` carries the session's reconnect counter at publish time.
    ConnectionChanged {
        account_id: i32,
        status: AccountStatus,
        retries: u32,
        reason: Option<String>,
    },

    /// A message made it through the resolution pipeline.
    MessageIngested {
        ticket: Ticket,
        message: Message,
        contact: Contact,
    },

    TicketCreated(Ticket),
    TicketUpdated(Ticket),

    /// System-wide event for debugging or administration.
    SystemMessage(String),
}

impl DeskEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DeskEvent::QrCodeIssued { .. } => "qrcode-issued",
            DeskEvent::ConnectionChanged { .. } => "connection-changed",
            DeskEvent::MessageIngested { .. } => "message-ingested",
            DeskEvent::TicketCreated(_) => "ticket-created",
            DeskEvent::TicketUpdated(_) => "ticket-updated",
            DeskEvent::SystemMessage(_) => "system-message",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<DeskEvent>` for guaranteed
/// delivery.
///
/// - If the subscriber's channel buffer fills, `publish` will await
///   until there's space (backpressure).
/// - If the subscriber has dropped the `Receiver`, the channel is closed
///   and sending returns an error.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<DeskEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Default size for each subscriber's buffer. Adjust as needed.
const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    /// Create a new, empty event bus.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<DeskEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: DeskEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }

    /// Convenience method: publish a `ConnectionChanged` event.
    pub async fn publish_connection_changed(
        &self,
        account_id: i32,
        status: AccountStatus,
        retries: u32,
        reason: Option<&str>,
    ) {
        self.publish(DeskEvent::ConnectionChanged {
            account_id,
            status,
            retries,
            reason: reason.map(String::from),
        })
        .await;
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
    use tokio::time::{Duration, sleep, timeout};

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::new();

        let mut rx1 = bus.subscribe(Some(5)).await;
        let mut rx2 = bus.subscribe(Some(5)).await;

        bus.publish_connection_changed(1, AccountStatus::Connected, 0, None)
            .await;

        // Both subscribers should get it
        let evt1 = rx1.recv().await.expect("rx1 should get event");
        let evt2 = rx2.recv().await.expect("rx2 should get event");

        for evt in [evt1, evt2] {
            match evt {
                DeskEvent::ConnectionChanged {
                    account_id, status, ..
                } => {
                    assert_eq!(account_id, 1);
                    assert_eq!(status, AccountStatus::Connected);
                }
                other => panic!("wrong event type: {:?}", other.event_type()),
            }
        }
    }

    #[tokio::test]
    async fn test_backpressure_blocking() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Some(1)).await; // queue size = 1

        // Publish first message to fill the queue.
        bus.publish(DeskEvent::SystemMessage("msg1".into())).await;

        // Spawn a task that reads the two messages after a short delay.
        let handle = tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            let first = rx.recv().await.expect("expected first message");
            let second = rx.recv().await.expect("expected second message");
            (first, second)
        });

        // Publish the second message (this call will wait until there's space).
        let second_publish = bus.publish(DeskEvent::SystemMessage("msg2".into()));
        let result = timeout(Duration::from_millis(500), second_publish).await;
        assert!(result.is_ok(), "publish should eventually unblock");

        let (evt1, evt2) = handle.await.unwrap();
        if let DeskEvent::SystemMessage(txt) = evt1 {
            assert_eq!(txt, "msg1");
        } else {
            panic!("first message mismatch");
        }
        if let DeskEvent::SystemMessage(txt) = evt2 {
            assert_eq!(txt, "msg2");
        } else {
            panic!("second message mismatch");
        }
    }
}
