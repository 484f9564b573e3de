//! Background refresh of the element store
//!
//! A single worker thread wakes every `poll_interval`. When no refresh has
//! ever completed, or the last one is at least `refresh_interval` old, it
//! probes the feed host and, if reachable, fetches and stores the configured
//! group before sleeping again. The fetch runs inside the loop body, so there
//! is never more than one in flight.
//!
//! Failures are retried at the next wake with no backoff. Against a host that
//! stays unreachable that is one probe per poll interval, indefinitely.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nearsat::data::CelestrakFeed;
//! use nearsat::scheduler::{RefreshConfig, RefreshScheduler};
//! use nearsat::store::ElementStore;
//!
//! let store = Arc::new(ElementStore::open("database/tles.db")?);
//! let feed = Arc::new(CelestrakFeed::new()?);
//! let mut scheduler = RefreshScheduler::new(feed, store, RefreshConfig::default());
//! scheduler.start();
//! // ...
//! scheduler.stop();
//! ```

pub mod cancel;
pub mod config;

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::data::{fetch_and_store, ElementFeed};
use crate::store::{ElementStore, UpsertReport};
use crate::Result;

pub use self::cancel::CancelToken;
pub use self::config::RefreshConfig;

/// What the worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Fetching,
}

/// Result of one wake of the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// The last refresh is still fresh
    NotDue,
    /// The feed host did not answer the probe
    Offline,
    /// The group was fetched and stored
    Refreshed(UpsertReport),
    /// The fetch or store step failed; retried when next due
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
struct Completion {
    at: Instant,
    utc: DateTime<Utc>,
}

struct Shared {
    feed: Arc<dyn ElementFeed>,
    store: Arc<ElementStore>,
    config: RefreshConfig,
    last_fetch: Mutex<Option<Completion>>,
    state: Mutex<SchedulerState>,
    // Held for a whole refresh so worker and caller fetches never overlap
    fetch_lock: Mutex<()>,
}

impl Shared {
    fn is_due(&self) -> bool {
        match *self.last_fetch.lock() {
            None => true,
            Some(done) => done.at.elapsed() >= self.config.refresh_interval,
        }
    }

    fn refresh(&self) -> Result<UpsertReport> {
        let _in_flight = self.fetch_lock.lock();
        *self.state.lock() = SchedulerState::Fetching;
        let result = fetch_and_store(
            self.feed.as_ref(),
            &self.store,
            &self.config.group,
            self.config.fetch_timeout,
        );
        *self.state.lock() = SchedulerState::Idle;

        if result.is_ok() {
            *self.last_fetch.lock() = Some(Completion {
                at: Instant::now(),
                utc: Utc::now(),
            });
        }
        result
    }

    fn run_cycle(&self) -> CycleOutcome {
        if !self.is_due() {
            return CycleOutcome::NotDue;
        }

        if let Err(e) = self.feed.probe(self.config.probe_timeout) {
            warn!(error = %e, "element feed unreachable, will retry");
            return CycleOutcome::Offline;
        }

        match self.refresh() {
            Ok(report) => CycleOutcome::Refreshed(report),
            Err(e) => {
                error!(group = %self.config.group, error = %e, "element refresh failed");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }
}

struct Worker {
    token: CancelToken,
    handle: JoinHandle<()>,
}

/// Owns the background refresh worker.
pub struct RefreshScheduler {
    shared: Arc<Shared>,
    worker: Option<Worker>,
}

impl RefreshScheduler {
    pub fn new(
        feed: Arc<dyn ElementFeed>,
        store: Arc<ElementStore>,
        config: RefreshConfig,
    ) -> Self {
        RefreshScheduler {
            shared: Arc::new(Shared {
                feed,
                store,
                config,
                last_fetch: Mutex::new(None),
                state: Mutex::new(SchedulerState::Idle),
                fetch_lock: Mutex::new(()),
            }),
            worker: None,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.shared.config
    }

    pub fn state(&self) -> SchedulerState {
        *self.shared.state.lock()
    }

    /// When the last successful refresh completed.
    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.shared.last_fetch.lock().map(|c| c.utc)
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .map_or(false, |w| !w.handle.is_finished())
    }

    /// Spawn the worker. Does nothing if it is already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        // Reap a worker that died without being stopped
        if let Some(stale) = self.worker.take() {
            let _ = stale.handle.join();
        }

        let token = CancelToken::new();
        let shared = Arc::clone(&self.shared);
        let worker_token = token.clone();
        let handle = thread::Builder::new()
            .name("nearsat-refresh".into())
            .spawn(move || run_worker(shared, worker_token));

        match handle {
            Ok(handle) => {
                info!(
                    group = %self.shared.config.group,
                    interval = ?self.shared.config.refresh_interval,
                    "refresh scheduler started"
                );
                self.worker = Some(Worker { token, handle });
            }
            Err(e) => error!(error = %e, "failed to spawn refresh worker"),
        }
    }

    /// Cancel the worker and wait for it to exit.
    ///
    /// Once this returns the scheduler performs no further writes.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.token.cancel();
        if worker.handle.join().is_err() {
            error!("refresh worker panicked");
        }
        info!("refresh scheduler stopped");
    }

    /// Refresh on the calling thread, ignoring the interval and the probe.
    ///
    /// Blocks until any fetch the worker has in flight completes.
    pub fn refresh_now(&self) -> Result<UpsertReport> {
        self.shared.refresh()
    }

    /// Run one wake of the worker loop on the calling thread.
    pub fn run_cycle(&self) -> CycleOutcome {
        self.shared.run_cycle()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(shared: Arc<Shared>, token: CancelToken) {
    while !token.is_cancelled() {
        shared.run_cycle();
        if token.wait_timeout(shared.config.poll_interval) {
            break;
        }
    }
}
