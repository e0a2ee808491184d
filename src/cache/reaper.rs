//! Idle reaper lifecycle
//!
//! The reaper is a repeating task that sweeps the cache for clients idle
//! beyond the configured threshold. Its bookkeeping lives inside the cache
//! lock, so starting, stopping and rescheduling are serialized with sweeps.
//!
//! Every schedule gets a generation number. A sweep only evicts when its
//! generation is still current, which is checked under the lock: once
//! [`cleanup`](BroadcasterCache::cleanup) returns, no sweep of the cancelled
//! schedule can run, even one whose tick already fired.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{CacheError, Result};

use super::config::{first_sweep_at, validate_idle_time, validate_sweep_interval};
use super::store::{BroadcasterCache, CacheState};

/// State of the background reaper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaperState {
    /// No sweep is scheduled
    Stopped,
    /// Sweeps run periodically
    Running,
}

/// Schedule bookkeeping kept under the cache lock
#[derive(Debug, Default)]
pub(super) struct ReaperSlot {
    /// Handle of the running sweep loop
    task: Option<JoinHandle<()>>,

    /// Bumped on every cancel; stale loops compare against it
    generation: u64,

    /// Runtime sweeps are spawned on, instead of the caller's
    executor: Option<Handle>,
}

impl ReaperSlot {
    /// Invalidate the current schedule
    ///
    /// Returns true if a loop was running.
    fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl<T: Clone + Send + 'static> BroadcasterCache<T> {
    /// Start the periodic idle sweep
    ///
    /// A schedule that is already running is cancelled first, so there is
    /// never more than one sweep loop. The first sweep fires after
    /// `initial_delay`.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let mut state = self.state.lock().await;
        self.schedule(&mut state)
    }

    /// Cancel the periodic sweep
    ///
    /// No sweep runs after this returns. Does nothing when already stopped.
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        if state.reaper.cancel() {
            tracing::info!("Cache reaper stopped");
        }
    }

    /// Cancel the periodic sweep and release any executor set through
    /// [`set_executor`](Self::set_executor)
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let was_running = state.reaper.cancel();
        state.reaper.executor = None;
        if was_running {
            tracing::info!("Cache reaper stopped");
        }
    }

    /// Current reaper state
    pub async fn reaper_state(&self) -> ReaperState {
        if self.state.lock().await.reaper.is_running() {
            ReaperState::Running
        } else {
            ReaperState::Stopped
        }
    }

    /// Change the idle threshold
    ///
    /// Applies from the next sweep on.
    pub async fn set_idle_threshold(&self, idle: Duration) -> Result<()> {
        validate_idle_time(idle)?;
        self.state.lock().await.config.client_idle_time = idle;
        tracing::debug!(idle_ms = idle.as_millis() as u64, "Client idle time updated");
        Ok(())
    }

    /// Change the sweep interval
    ///
    /// A running reaper is rescheduled with the new interval; a stopped one
    /// picks it up on the next [`start`](Self::start).
    pub async fn set_sweep_interval(self: &Arc<Self>, interval: Duration) -> Result<()> {
        validate_sweep_interval(interval)?;

        let mut state = self.state.lock().await;
        state.config.sweep_interval = interval;

        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "Sweep interval updated"
        );

        if state.reaper.is_running() {
            self.schedule(&mut state)?;
        }
        Ok(())
    }

    /// Run future sweeps on `executor` instead of the caller's runtime
    ///
    /// Stops the current schedule; call [`start`](Self::start) again to
    /// resume on the new executor.
    pub async fn set_executor(&self, executor: Handle) {
        let mut state = self.state.lock().await;
        if state.reaper.cancel() {
            tracing::info!("Cache reaper stopped for executor change");
        }
        state.reaper.executor = Some(executor);
    }

    /// Cancel the current schedule and spawn a new one
    ///
    /// Runs with the cache lock held. An invalid configuration is reported
    /// here and leaves the current schedule untouched.
    fn schedule(self: &Arc<Self>, state: &mut CacheState<T>) -> Result<()> {
        let executor = match &state.reaper.executor {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| CacheError::NoRuntime)?,
        };

        // Reject the config before touching a running schedule
        state.config.validate()?;
        let interval = state.config.sweep_interval;
        let start = first_sweep_at(state.config.initial_delay)?;

        state.reaper.cancel();
        let generation = state.reaper.generation;

        let weak = Arc::downgrade(self);
        let task = executor.spawn(sweep_loop(weak, generation, start, interval));
        state.reaper.task = Some(task);

        tracing::info!(
            interval_ms = interval.as_millis() as u64,
            idle_ms = state.config.client_idle_time.as_millis() as u64,
            "Cache reaper started"
        );

        Ok(())
    }

    /// One scheduled sweep; returns false once the schedule is stale
    async fn sweep_scheduled(&self, generation: u64) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if state.reaper.generation != generation {
            return false;
        }

        let evicted = state.evict_idle(now);
        if evicted > 0 {
            tracing::debug!(evicted = evicted, "Idle sweep finished");
        }
        true
    }
}

async fn sweep_loop<T: Clone + Send + 'static>(
    weak: Weak<BroadcasterCache<T>>,
    generation: u64,
    start: Instant,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(cache) = weak.upgrade() else {
            break;
        };
        if !cache.sweep_scheduled(generation).await {
            break;
        }
    }
}

impl<T> Drop for BroadcasterCache<T> {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().reaper.task.take() {
            task.abort();
        }
    }
}
