//! The monitor controller: owns the lifecycle and wires the poll loop, the
//! event queue and the dispatcher together.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use snapcdc_source::SnapshotFetcher;
use snapcdc_types::ChangeEvent;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::MonitorConfig;
use crate::dispatcher::Dispatcher;
use crate::error::MonitorResult;
use crate::poller::Poller;
use crate::queue::event_queue;
use crate::registry::ListenerRegistry;

/// Lifecycle of a [`Monitor`]. `Closed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Created,
    Running,
    Closed,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

struct Lifecycle {
    state: MonitorState,
    tasks: Vec<JoinHandle<()>>,
}

/// Polls a snapshot source and delivers field-level changes to listeners.
///
/// The monitor owns its listener registry; listeners can be registered
/// before or after [`start`](Monitor::start) and are looked up for every
/// event at dispatch time.
pub struct Monitor {
    config: MonitorConfig,
    fetcher: Arc<dyn SnapshotFetcher>,
    registry: ListenerRegistry,
    cancel: CancellationToken,
    dropped: Arc<AtomicU64>,
    lifecycle: Mutex<Lifecycle>,
}

impl Monitor {
    pub fn new(config: MonitorConfig, fetcher: Arc<dyn SnapshotFetcher>) -> Self {
        Self {
            config,
            fetcher,
            registry: ListenerRegistry::new(),
            cancel: CancellationToken::new(),
            dropped: Arc::new(AtomicU64::new(0)),
            lifecycle: Mutex::new(Lifecycle {
                state: MonitorState::Created,
                tasks: Vec::new(),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> MonitorState {
        self.lifecycle.lock().expect("lock poisoned").state
    }

    /// Spawn the poll loop and the dispatcher on the current tokio runtime.
    ///
    /// Returns `false` without doing anything if the monitor was already
    /// started or has been closed.
    pub fn start(&self) -> bool {
        let mut lifecycle = self.lifecycle.lock().expect("lock poisoned");
        if lifecycle.state != MonitorState::Created {
            return false;
        }

        let (sender, receiver) = event_queue(self.config.effective_queue_capacity());
        let poller = Poller::new(
            &self.config,
            Arc::clone(&self.fetcher),
            sender,
            self.cancel.child_token(),
        );
        let dispatcher = Dispatcher::new(self.registry.clone(), receiver, self.cancel.child_token())
            .with_lane_capacity(self.config.effective_queue_capacity())
            .with_drop_counter(Arc::clone(&self.dropped));

        lifecycle.tasks.push(tokio::spawn(poller.run()));
        lifecycle.tasks.push(tokio::spawn(async move {
            dispatcher.run().await;
        }));
        lifecycle.state = MonitorState::Running;

        if self.config.diagnostics {
            info!(
                refresh_secs = self.config.effective_refresh_period().as_secs_f64(),
                ignored = self.config.ignore_fields.len(),
                listeners = self.registry.len(),
                "monitor started"
            );
        }
        true
    }

    /// Stop polling, release the source connection and wait for queued
    /// events to be handed to listeners. Safe to call more than once.
    pub async fn close(&self) {
        let tasks = {
            let mut lifecycle = self.lifecycle.lock().expect("lock poisoned");
            if lifecycle.state == MonitorState::Closed {
                return;
            }
            lifecycle.state = MonitorState::Closed;
            std::mem::take(&mut lifecycle.tasks)
        };

        self.cancel.cancel();
        self.fetcher.close().await;
        for task in tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "monitor task ended abnormally");
            }
        }

        if self.config.diagnostics {
            info!("monitor closed");
        }
    }

    /// Register `callback` under `name`, replacing any existing listener of
    /// that name.
    pub fn register_listener<F>(&self, name: &str, callback: F) -> MonitorResult<()>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.registry.register(name, callback)
    }

    /// Returns whether a listener was registered under `name`.
    pub fn unregister_listener(&self, name: &str) -> MonitorResult<bool> {
        self.registry.unregister(name)
    }

    /// Names of the registered listeners, sorted.
    pub fn listeners(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Events dropped because a listener's lane was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
