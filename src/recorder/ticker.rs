//! Periodic tick task
//!
//! Drives the elapsed/position counters. The task ends as soon as the
//! callback reports the session is gone, and is aborted when the `Ticker`
//! is dropped.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

/// Interval between counter updates
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running tick task
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn a task calling `on_tick` every `period`, first after one period.
    ///
    /// `on_tick` returns `false` once its session is no longer active.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if !on_tick() {
                    break;
                }
            }
        });

        Self { handle }
    }

    /// Whether the task has exited on its own
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        let _ticker = Ticker::spawn(TICK_INTERVAL, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            true
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(count.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_callback_declines() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        let ticker = Ticker::spawn(TICK_INTERVAL, move || counter.fetch_add(1, Ordering::Relaxed) < 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::Relaxed), 2);
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_task() {
        let count = Arc::new(AtomicU64::new(0));
        let counter = count.clone();
        let ticker = Ticker::spawn(TICK_INTERVAL, move || {
            counter.fetch_add(1, Ordering::Relaxed);
            true
        });

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }
}
