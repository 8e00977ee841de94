//! Supervised background refresh loop

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// When the loop fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// Delay before the one-off warmup tick
    pub warmup: Duration,
    /// Repeat period, measured from spawn
    pub interval: Duration,
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(2),
            interval: Duration::from_secs(crate::config::DEFAULT_REFRESH_SECS),
        }
    }
}

impl RefreshSchedule {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_secs(1)),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Warmup,
    Interval(u64),
}

/// Periodic task that survives failing ticks.
///
/// Each tick runs as its own task; an error or panic goes to `on_error` and
/// the next tick fires on schedule. The loop ends only through [`stop`].
///
/// [`stop`]: RefreshLoop::stop
pub struct RefreshLoop {
    handle: Option<JoinHandle<()>>,
}

impl RefreshLoop {
    pub fn spawn<F, Fut, E>(schedule: RefreshSchedule, mut tick: F, on_error: E) -> Self
    where
        F: FnMut(Tick) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        E: Fn(Tick, anyhow::Error) + Send + Sync + 'static,
    {
        let handle = tokio::spawn(async move {
            let start = Instant::now();
            time::sleep(schedule.warmup).await;
            run_supervised(Tick::Warmup, &mut tick, &on_error).await;

            let mut interval = time::interval_at(start + schedule.interval, schedule.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut n = 0u64;
            loop {
                interval.tick().await;
                n += 1;
                run_supervised(Tick::Interval(n), &mut tick, &on_error).await;
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Cancel the loop. Returns false if it was already stopped.
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                tracing::debug!("refresh loop stopped");
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_supervised<F, Fut, E>(tick: Tick, f: &mut F, on_error: &E)
where
    F: FnMut(Tick) -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    E: Fn(Tick, anyhow::Error) + Sync,
{
    match tokio::spawn(f(tick)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => on_error(tick, err),
        Err(join) => on_error(tick, anyhow::anyhow!("refresh tick panicked: {join}")),
    }
}

/// Default error hook for the refresh loop
pub fn log_tick_error(tick: Tick, err: anyhow::Error) {
    tracing::warn!(?tick, error = %format!("{err:#}"), "refresh tick failed");
}
