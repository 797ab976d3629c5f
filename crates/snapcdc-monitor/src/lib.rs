//! Monitor controller for snapcdc.
//!
//! A [`Monitor`] periodically fetches a full snapshot from a
//! [`SnapshotFetcher`](snapcdc_source::SnapshotFetcher), diffs it against the
//! previous one and pushes the resulting change events through a bounded
//! queue to a dispatcher, which hands each event to every registered
//! listener through that listener's own bounded lane.
//!
//! # Key Types
//!
//! - [`Monitor`] -- Lifecycle owner: `start`, `close`, listener management
//! - [`MonitorConfig`] -- Refresh period, ignore set, diagnostics, queue size
//! - [`ListenerRegistry`] -- Concurrent name to callback map
//! - [`Dispatcher`] -- Single consumer of the event queue

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod monitor;
mod poller;
pub mod queue;
pub mod registry;

#[cfg(test)]
mod testing;

pub use config::{MonitorConfig, DEFAULT_QUEUE_CAPACITY, DEFAULT_REFRESH_PERIOD};
pub use dispatcher::Dispatcher;
pub use error::{MonitorError, MonitorResult};
pub use monitor::{Monitor, MonitorState};
pub use queue::{event_queue, EventReceiver, EventSender};
pub use registry::{Listener, ListenerRegistry};
