//! External-event intake merged with the periodic tick.
//!
//! Producers (Ctrl-C handler, operator console) hold cloned
//! [`EventSender`]s. The queue keeps one sender of its own, so the channel
//! never disconnects while the queue is alive.

use crate::event::Event;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use std::time::Duration;

/// Cloneable producer handle.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<Event>,
}

impl EventSender {
    /// Queue `event`. Returns false once the queue has been dropped.
    pub fn send(&self, event: Event) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// FIFO of pending external events.
#[derive(Debug)]
pub struct EventQueue {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> EventSender {
        EventSender {
            tx: self.tx.clone(),
        }
    }

    /// Next external event, or [`Event::Tick`] if none arrives within `budget`.
    pub fn next(&self, budget: Duration) -> Event {
        match self.rx.recv_timeout(budget) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => Event::Tick,
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}
