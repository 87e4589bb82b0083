//! 1 Hz countdown driver.
//!
//! A timer owns at most one background task. Starting it again aborts the
//! previous task first, and dropping the timer aborts whatever is running.

use std::time::Duration;

use chrono::Local;
use mihrab_types::CountdownState;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::PrayerScheduleEngine;

const TICK: Duration = Duration::from_secs(1);

/// Sink for values produced on every tick.
pub trait DisplayTarget<T>: Send + 'static {
    fn show(&mut self, value: T);
}

impl<T, F> DisplayTarget<T> for F
where
    F: FnMut(T) + Send + 'static,
{
    fn show(&mut self, value: T) {
        self(value)
    }
}

/// Handle to a periodic recompute-and-display task.
#[derive(Debug, Default)]
pub struct CountdownTimer {
    handle: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls `recompute` once per second and pushes the result to `display`.
    ///
    /// The first tick fires immediately. Any task started earlier by this
    /// timer is aborted.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn start<T, R, D>(&mut self, mut recompute: R, mut display: D)
    where
        T: Send + 'static,
        R: FnMut() -> T + Send + 'static,
        D: DisplayTarget<T>,
    {
        self.stop();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                display.show(recompute());
            }
        });
        self.handle = Some(handle);
        debug!("countdown timer started");
    }

    /// Drives `engine` against the local wall clock.
    pub fn start_countdown<D>(&mut self, mut engine: PrayerScheduleEngine, display: D)
    where
        D: DisplayTarget<CountdownState>,
    {
        self.start(move || engine.tick(Local::now().naive_local()), display);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("countdown timer stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
