//! Background value log reclamation
//!
//! This module provides a maintenance task that runs in a background thread
//! and periodically asks the store to reclaim space held by superseded
//! versions.
//!
//! # Design Notes
//!
//! - Goes through `Store::reclaim`, which only holds the commit lock while it
//!   rewrites one segment; readers are never blocked
//! - Each tick retries while the store reports more work, bounded by
//!   `max_rounds`
//! - The wait between ticks is a condition variable with a timeout, so
//!   shutdown wakes the thread immediately
//! - Failures are logged and retried on the next tick

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};
use vectext_core::{Error, Result, StoreError};
use vectext_storage::Store;

/// Name of the maintenance thread
pub const THREAD_NAME: &str = "vectext-maintenance";

/// Maintenance task configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceConfig {
    /// Time between reclamation cycles (default: 5 minutes)
    pub interval: Duration,
    /// Minimum fraction of garbage a segment needs to be rewritten (default: 0.7)
    pub discard_ratio: f64,
    /// Reclamation rounds per cycle at most (default: 16)
    pub max_rounds: usize,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        MaintenanceConfig {
            interval: Duration::from_secs(300),
            discard_ratio: 0.7,
            max_rounds: 16,
        }
    }
}

impl MaintenanceConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(Error::config("maintenance interval must be positive"));
        }
        if !(self.discard_ratio > 0.0 && self.discard_ratio < 1.0) {
            return Err(Error::config(format!(
                "discard_ratio must be in (0, 1), got {}",
                self.discard_ratio
            )));
        }
        if self.max_rounds == 0 {
            return Err(Error::config("max_rounds must be at least 1"));
        }
        Ok(())
    }
}

/// Result of one reclamation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReclaimOutcome {
    /// Number of times the store was asked to reclaim
    pub rounds: usize,
    /// Segments rewritten and deleted
    pub segments_reclaimed: usize,
    /// True if the cycle stopped at `max_rounds` before the store reported
    /// that nothing was left to reclaim
    pub exhausted: bool,
}

/// Run one reclamation cycle.
///
/// Asks the store to reclaim until it reports no more work, at most
/// `max_rounds` times. On a store with nothing to reclaim this is exactly
/// one round. The first store failure ends the cycle and is returned.
pub fn run_reclaim_cycle(
    store: &Store,
    discard_ratio: f64,
    max_rounds: usize,
) -> Result<ReclaimOutcome> {
    let mut outcome = ReclaimOutcome::default();
    for _ in 0..max_rounds {
        outcome.rounds += 1;
        if !store.reclaim(discard_ratio)? {
            return Ok(outcome);
        }
        outcome.segments_reclaimed += 1;
    }
    outcome.exhausted = true;
    Ok(outcome)
}

struct Shared {
    shutdown: Mutex<bool>,
    wake: Condvar,
    cycles: AtomicU64,
}

/// Background reclamation task
///
/// # Example
///
/// ```ignore
/// let handle = MaintenanceTask::start(Arc::clone(&store), MaintenanceConfig::default())?;
///
/// // ... use the store ...
///
/// // Wakes the thread and joins it
/// handle.shutdown();
/// ```
pub struct MaintenanceTask;

impl MaintenanceTask {
    /// Spawn the maintenance thread.
    ///
    /// The first cycle runs one `interval` after start, not immediately.
    pub fn start(store: Arc<Store>, config: MaintenanceConfig) -> Result<MaintenanceHandle> {
        config.validate()?;
        let shared = Arc::new(Shared {
            shutdown: Mutex::new(false),
            wake: Condvar::new(),
            cycles: AtomicU64::new(0),
        });

        let thread = {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name(THREAD_NAME.to_string())
                .spawn(move || run(store, config, shared))
                .map_err(StoreError::from)?
        };

        Ok(MaintenanceHandle {
            shared,
            thread: Some(thread),
        })
    }
}

fn run(store: Arc<Store>, config: MaintenanceConfig, shared: Arc<Shared>) {
    info!(
        target: "vectext::maintenance",
        interval_secs = config.interval.as_secs_f64(),
        discard_ratio = config.discard_ratio,
        max_rounds = config.max_rounds,
        "Maintenance task started"
    );

    loop {
        {
            let deadline = Instant::now() + config.interval;
            let mut stop = shared.shutdown.lock();
            while !*stop {
                if shared.wake.wait_until(&mut stop, deadline).timed_out() {
                    break;
                }
            }
            if *stop {
                break;
            }
        }

        if store.is_closed() {
            debug!(target: "vectext::maintenance", "Store closed, stopping");
            break;
        }

        match run_reclaim_cycle(&store, config.discard_ratio, config.max_rounds) {
            Ok(outcome) if outcome.segments_reclaimed > 0 => info!(
                target: "vectext::maintenance",
                rounds = outcome.rounds,
                segments = outcome.segments_reclaimed,
                exhausted = outcome.exhausted,
                "Reclaimed value log space"
            ),
            Ok(_) => debug!(target: "vectext::maintenance", "Nothing to reclaim"),
            Err(e) => warn!(
                target: "vectext::maintenance",
                error = %e,
                "Value log reclamation failed"
            ),
        }
        shared.cycles.fetch_add(1, Ordering::Relaxed);
    }

    info!(target: "vectext::maintenance", "Maintenance task stopped");
}

/// Handle to a running maintenance task
///
/// Dropping the handle shuts the task down.
pub struct MaintenanceHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Signal the task to stop and wait for its thread to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    /// Number of completed reclamation cycles
    pub fn cycles_completed(&self) -> u64 {
        self.shared.cycles.load(Ordering::Relaxed)
    }

    /// True while the thread has not exited
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().map_or(false, |t| !t.is_finished())
    }

    fn stop_and_join(&mut self) {
        *self.shared.shutdown.lock() = true;
        self.shared.wake.notify_all();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(target: "vectext::maintenance", "Maintenance thread panicked");
            }
        }
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for MaintenanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceHandle")
            .field("cycles_completed", &self.cycles_completed())
            .field("running", &self.is_running())
            .finish()
    }
}
