//! Poll loop: fetch, diff against the retained snapshot, enqueue.
//!
//! The poller is the only owner of the previous snapshot. A failed fetch
//! leaves it untouched, so the next successful cycle diffs against the last
//! snapshot that was actually observed.

use std::sync::Arc;
use std::time::Duration;

use snapcdc_diff::diff_snapshots;
use snapcdc_source::SnapshotFetcher;
use snapcdc_types::{IgnoreSet, Snapshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::queue::EventSender;

/// What a single poll cycle did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    /// No usable previous snapshot; the fetched one became the baseline.
    Baseline { entities: usize },
    /// Diffed against the previous snapshot and enqueued `events` changes.
    Diffed { events: usize },
    /// The fetch failed; the previous snapshot is retained.
    FetchFailed,
    /// Cancelled, or the queue closed, before the cycle completed.
    Stopped,
}

pub(crate) struct Poller {
    fetcher: Arc<dyn SnapshotFetcher>,
    sender: EventSender,
    ignore: IgnoreSet,
    refresh: Duration,
    diagnostics: bool,
    cancel: CancellationToken,
    before: Option<Snapshot>,
    cycle: u64,
}

impl Poller {
    pub(crate) fn new(
        config: &MonitorConfig,
        fetcher: Arc<dyn SnapshotFetcher>,
        sender: EventSender,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            sender,
            ignore: config.ignore_fields.clone(),
            refresh: config.effective_refresh_period(),
            diagnostics: config.diagnostics,
            cancel,
            before: None,
            cycle: 0,
        }
    }

    /// Poll until cancelled, pausing the refresh period after every cycle.
    pub(crate) async fn run(mut self) {
        while !self.cancel.is_cancelled() {
            if self.cycle().await == CycleOutcome::Stopped {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.refresh) => {}
                _ = self.cancel.cancelled() => break,
            }
        }
        debug!(cycles = self.cycle, "poll loop stopped");
    }

    /// Run one fetch / diff / enqueue cycle.
    pub(crate) async fn cycle(&mut self) -> CycleOutcome {
        self.cycle += 1;
        let cycle = self.cycle;
        if self.diagnostics {
            info!(cycle, "poll cycle started");
        }
        let outcome = self.poll_once(cycle).await;
        if self.diagnostics {
            info!(cycle, ?outcome, "poll cycle finished");
        }
        outcome
    }

    async fn poll_once(&mut self, cycle: u64) -> CycleOutcome {
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return CycleOutcome::Stopped,
            result = self.fetcher.fetch_snapshot() => result,
        };
        let after = match fetched {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(cycle, error = %err, "snapshot fetch failed, keeping previous snapshot");
                return CycleOutcome::FetchFailed;
            }
        };

        // An empty previous snapshot is treated as no baseline at all.
        let diff = match self.before.as_ref().filter(|before| !before.is_empty()) {
            Some(before) => diff_snapshots(before, &after, &self.ignore),
            None => {
                let entities = after.len();
                self.before = Some(after);
                if self.diagnostics {
                    info!(cycle, entities, "baseline captured");
                }
                return CycleOutcome::Baseline { entities };
            }
        };

        let events = diff.len();
        for event in diff {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return CycleOutcome::Stopped,
                pushed = self.sender.push(event) => {
                    if pushed.is_err() {
                        return CycleOutcome::Stopped;
                    }
                }
            }
        }
        self.before = Some(after);
        debug!(cycle, events, "changes enqueued");
        CycleOutcome::Diffed { events }
    }
}
