//! Dispatch loop: drains the event queue and fans events out to listeners.
//!
//! Every listener gets its own lane: a bounded channel drained by a worker
//! task that runs the callback on the blocking pool, one event at a time.
//! A slow or panicking listener only backs up its own lane, so other
//! listeners keep receiving events and at most one blocking thread per
//! listener is busy. A full lane drops the event for that listener alone and
//! counts it. The registry is read per event at dispatch time, not at
//! enqueue time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use snapcdc_types::ChangeEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::queue::EventReceiver;
use crate::registry::{Listener, ListenerRegistry};

/// Per-listener delivery channel and the callback it serves.
struct Lane {
    listener: Listener,
    tx: mpsc::Sender<ChangeEvent>,
}

impl Lane {
    fn spawn(name: &str, listener: Listener, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(capacity.max(1));
        let callback = Arc::clone(&listener);
        let name = name.to_string();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let callback = Arc::clone(&callback);
                if let Err(err) = tokio::task::spawn_blocking(move || callback(event)).await {
                    if err.is_panic() {
                        warn!(listener = %name, "listener panicked");
                    }
                }
            }
            debug!(listener = %name, "listener lane closed");
        });
        Self { listener, tx }
    }

    fn serves(&self, listener: &Listener) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.listener), Arc::as_ptr(listener))
    }
}

/// Single consumer of the event queue.
pub struct Dispatcher {
    registry: ListenerRegistry,
    receiver: EventReceiver,
    cancel: CancellationToken,
    lane_capacity: usize,
    lanes: HashMap<String, Lane>,
    dropped: Arc<AtomicU64>,
}

impl Dispatcher {
    pub fn new(
        registry: ListenerRegistry,
        receiver: EventReceiver,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            receiver,
            cancel,
            lane_capacity: DEFAULT_QUEUE_CAPACITY,
            lanes: HashMap::new(),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Events each listener may have waiting before new ones are dropped
    /// for it.
    pub fn with_lane_capacity(mut self, capacity: usize) -> Self {
        self.lane_capacity = capacity.max(1);
        self
    }

    /// Share `counter` for events dropped on full lanes.
    pub fn with_drop_counter(mut self, counter: Arc<AtomicU64>) -> Self {
        self.dropped = counter;
        self
    }

    /// Run until the queue is closed and drained. Cancellation closes the
    /// queue; events already queued are still handed to listener lanes.
    ///
    /// Returns the number of events dispatched.
    pub async fn run(mut self) -> u64 {
        let mut dispatched = 0u64;
        let mut closing = false;
        loop {
            tokio::select! {
                next = self.receiver.pop() => match next {
                    Some(event) => {
                        self.fan_out(event);
                        dispatched += 1;
                    }
                    None => break,
                },
                _ = self.cancel.cancelled(), if !closing => {
                    closing = true;
                    self.receiver.close();
                }
            }
        }
        debug!(dispatched, "dispatch loop stopped");
        dispatched
    }

    /// Hand `event` to the lane of every listener registered right now.
    /// Returns the number of lanes that accepted it.
    fn fan_out(&mut self, event: ChangeEvent) -> usize {
        let current = self.registry.current();
        self.lanes.retain(|name, _| current.iter().any(|(registered, _)| registered == name));

        let mut accepted = 0;
        for (name, listener) in current {
            let replaced = self.lanes.get(&name).map_or(true, |lane| !lane.serves(&listener));
            if replaced {
                let lane = Lane::spawn(&name, listener, self.lane_capacity);
                self.lanes.insert(name.clone(), lane);
            }
            let Some(lane) = self.lanes.get(&name) else {
                continue;
            };
            match lane.tx.try_send(event.clone()) {
                Ok(()) => accepted += 1,
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(listener = %name, "listener lane full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    self.lanes.remove(&name);
                }
            }
        }
        accepted
    }
}
