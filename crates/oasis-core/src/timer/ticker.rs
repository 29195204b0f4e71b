//! One-second tick source for the focus timer.
//!
//! At most one interval task exists per scheduler. `arm` is a no-op while a
//! task is already running, and `disarm` (or dropping the scheduler) aborts
//! it and discards any tick that was already queued.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

struct Armed {
    task: JoinHandle<()>,
    ticks: mpsc::Receiver<()>,
}

pub struct TickScheduler {
    period: Duration,
    armed: Option<Armed>,
    arm_count: u64,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            armed: None,
            arm_count: 0,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// How many interval tasks have been spawned over the scheduler's life.
    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    /// Spawn the interval task. Returns `false` without spawning if one is
    /// already armed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn arm(&mut self) -> bool {
        if self.armed.is_some() {
            return false;
        }

        let (tx, ticks) = mpsc::channel(1);
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(()).await.is_err() {
                    break;
                }
            }
        });

        self.armed = Some(Armed { task, ticks });
        self.arm_count += 1;
        tracing::trace!(period_ms = period.as_millis() as u64, "tick scheduler armed");
        true
    }

    /// Abort the interval task. Returns `false` if nothing was armed.
    pub fn disarm(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                armed.task.abort();
                tracing::trace!("tick scheduler disarmed");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn task_handle(&self) -> Option<tokio::task::AbortHandle> {
        self.armed.as_ref().map(|armed| armed.task.abort_handle())
    }

    /// Wait for the next tick. Never resolves while disarmed, so it can sit
    /// in a `select!` next to user input.
    pub async fn next_tick(&mut self) {
        match self.armed.as_mut() {
            Some(armed) => {
                if armed.ticks.recv().await.is_none() {
                    // Task ended on its own; behave as disarmed.
                    self.armed = None;
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD)
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}
