//! Named listener callbacks, shared between callers and the dispatcher.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use snapcdc_types::ChangeEvent;
use tracing::debug;

use crate::error::{MonitorError, MonitorResult};

/// A change listener. Invoked once per event, in queue order and never
/// concurrently with itself. Different listeners run concurrently.
pub type Listener = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Concurrent map from listener name to callback.
///
/// Cloning yields another handle to the same registry. Registration and
/// removal may interleave freely with an in-flight fan-out; a listener added
/// mid-fan-out may or may not see that event.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    entries: Arc<DashMap<String, Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`, replacing any listener already
    /// registered with that name.
    pub fn register<F>(&self, name: &str, callback: F) -> MonitorResult<()>
    where
        F: Fn(ChangeEvent) + Send + Sync + 'static,
    {
        self.register_shared(name, Arc::new(callback))
    }

    /// Register an already shared callback.
    pub fn register_shared(&self, name: &str, listener: Listener) -> MonitorResult<()> {
        if name.is_empty() {
            return Err(MonitorError::EmptyListenerName);
        }
        if self.entries.insert(name.to_string(), listener).is_some() {
            debug!(listener = name, "listener replaced");
        } else {
            debug!(listener = name, "listener registered");
        }
        Ok(())
    }

    /// Remove the listener registered under `name`. Returns whether one was
    /// registered.
    pub fn unregister(&self, name: &str) -> MonitorResult<bool> {
        if name.is_empty() {
            return Err(MonitorError::EmptyListenerName);
        }
        let removed = self.entries.remove(name).is_some();
        debug!(listener = name, removed, "listener unregistered");
        Ok(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// The listeners registered right now. No map lock is held once this
    /// returns, so callbacks can be invoked without blocking registration.
    pub fn current(&self) -> Vec<(String, Listener)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(_: ChangeEvent) {}

    #[test]
    fn register_and_unregister() {
        let reg = ListenerRegistry::new();
        reg.register("audit", noop).unwrap();
        assert!(reg.contains("audit"));
        assert_eq!(reg.len(), 1);

        assert!(reg.unregister("audit").unwrap());
        assert!(!reg.unregister("audit").unwrap());
        assert!(reg.is_empty());
    }

    #[test]
    fn empty_name_rejected_without_change() {
        let reg = ListenerRegistry::new();
        assert_eq!(reg.register("", noop), Err(MonitorError::EmptyListenerName));
        assert!(reg.is_empty());
        assert_eq!(reg.unregister(""), Err(MonitorError::EmptyListenerName));
    }

    #[test]
    fn same_name_overwrites() {
        let reg = ListenerRegistry::new();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        reg.register("sink", move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        let s = Arc::clone(&second);
        reg.register("sink", move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(reg.len(), 1);
        for (_, listener) in reg.current() {
            listener(ChangeEvent::created("bob", "title", "eng"));
        }
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_entries() {
        let reg = ListenerRegistry::new();
        let handle = reg.clone();
        handle.register("b", noop).unwrap();
        handle.register("a", noop).unwrap();
        assert_eq!(reg.names(), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_registration() {
        let reg = ListenerRegistry::new();
        let threads: Vec<_> = (0..8)
            .map(|t| {
                let reg = reg.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("l-{t}-{i}");
                        reg.register(&name, noop).unwrap();
                        let _ = reg.current();
                        if i % 2 == 0 {
                            reg.unregister(&name).unwrap();
                        }
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(reg.len(), 8 * 25);
    }
}
