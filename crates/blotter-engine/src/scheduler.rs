//! Periodic market updates.
//!
//! [`UpdateScheduler`] drives [`MarketEngine::tick`] on a fixed period until
//! stopped. Cancellation is a `watch` flag checked before every tick; once
//! it is observed no further snapshot is published by the loop.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use blotter_core::PortfolioSnapshot;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::MarketEngine;
use crate::error::EngineError;

/// Whether the update loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    /// Ticking on the configured period
    Running,
    /// Not ticking; snapshots change only through reset
    Stopped,
}

struct RunningTask {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Drives the market engine on a fixed period.
pub struct UpdateScheduler {
    engine: Arc<MarketEngine>,
    period: Duration,
    task: Mutex<Option<RunningTask>>,
}

impl UpdateScheduler {
    /// Creates a stopped scheduler using the engine's configured period.
    pub fn new(engine: Arc<MarketEngine>) -> Self {
        let period = engine.config().tick_interval();
        Self::with_period(engine, period)
    }

    /// Creates a stopped scheduler with an explicit period.
    pub fn with_period(engine: Arc<MarketEngine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            task: Mutex::new(None),
        }
    }

    /// Tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        match self.task.lock().as_ref() {
            Some(task) if !task.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Starts the update loop. Returns `false` if it was already running.
    ///
    /// Must be called from within a tokio runtime. The first tick happens one
    /// period after start.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if matches!(task.as_ref(), Some(t) if !t.handle.is_finished()) {
            debug!("Update scheduler already running");
            return false;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(Arc::clone(&self.engine), self.period, cancel_rx));
        *task = Some(RunningTask { cancel_tx, handle });

        info!("Update scheduler started, period {:?}", self.period);
        true
    }

    /// Stops the update loop and waits for it to finish.
    ///
    /// Returns `false` if it was not running. No tick publishes after this
    /// returns.
    pub async fn stop(&self) -> bool {
        let task = self.task.lock().take();
        let Some(task) = task else {
            return false;
        };

        let _ = task.cancel_tx.send(true);
        if let Err(e) = task.handle.await {
            warn!("Update loop ended abnormally: {}", e);
        }

        info!("Update scheduler stopped");
        true
    }
}

impl Drop for UpdateScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            let _ = task.cancel_tx.send(true);
            task.handle.abort();
        }
    }
}

async fn run_loop(engine: Arc<MarketEngine>, period: Duration, mut cancel_rx: watch::Receiver<bool>) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if *cancel_rx.borrow() {
                    break;
                }
                run_tick(&engine);
            }
        }
    }

    debug!("Update loop exited");
}

/// Runs one tick, containing any error or panic and recording the outcome
/// in the engine's health.
pub fn run_tick(engine: &MarketEngine) -> Option<Arc<PortfolioSnapshot>> {
    match catch_unwind(AssertUnwindSafe(|| engine.tick())) {
        Ok(Ok(snapshot)) => {
            engine.record_tick_success();
            Some(snapshot)
        }
        Ok(Err(e)) => {
            engine.record_tick_failure(&e);
            None
        }
        Err(payload) => {
            engine.record_tick_failure(&EngineError::TickPanicked(panic_message(&*payload)));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
