//! Bounded event queue between the poll loop and the dispatcher.
//!
//! Pushing waits while the queue is full, so a slow dispatcher stalls the
//! poll loop instead of losing events. Closing the receiving side stops new
//! pushes while everything already queued can still be drained.

use snapcdc_types::ChangeEvent;
use tokio::sync::mpsc;

use crate::error::{MonitorError, MonitorResult};

/// Create a queue holding at most `capacity` events (minimum one).
pub fn event_queue(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half, owned by the poll loop.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::Sender<ChangeEvent>,
}

impl EventSender {
    /// Enqueue an event, waiting for space if the queue is full.
    pub async fn push(&self, event: ChangeEvent) -> MonitorResult<()> {
        self.tx.send(event).await.map_err(|_| MonitorError::QueueClosed)
    }

    /// Returns `true` once the receiver has closed or been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Free slots at this instant.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer half, owned by the dispatcher.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl EventReceiver {
    /// Next event, waiting while the queue is empty. Returns `None` once the
    /// queue is closed and drained.
    pub async fn pop(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Reject further pushes. Queued events remain available to [`pop`].
    ///
    /// [`pop`]: EventReceiver::pop
    pub fn close(&mut self) {
        self.rx.close();
    }
}
