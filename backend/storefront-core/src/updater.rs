//! Periodic background updates tied to a handle's lifetime.
//!
//! [`IntervalUpdater::start`] runs an async callback on a fixed period until
//! the returned handle is stopped or dropped. The first run happens one
//! period after start; [`IntervalUpdater::force_update`] runs it on demand.
//! Periods shorter than [`Intervals::MINIMUM`] are raised to it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

/// Common update periods.
pub struct Intervals;

impl Intervals {
    pub const MINIMUM: Duration = Duration::from_secs(1);
    pub const TEN_SECONDS: Duration = Duration::from_secs(10);
    pub const ONE_MINUTE: Duration = Duration::from_secs(60);
    pub const TWO_MINUTES: Duration = Duration::from_secs(2 * 60);
    pub const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);
}

type UpdateFn = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Handle to a running periodic update. Dropping it stops the updates.
pub struct IntervalUpdater {
    update: UpdateFn,
    period: Duration,
    task: JoinHandle<()>,
}

impl IntervalUpdater {
    /// Spawn the periodic task. Must be called inside a tokio runtime.
    pub fn start<F, Fut>(period: Duration, update: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period < Intervals::MINIMUM {
            warn!(
                "Update period {period:?} is too short, using {:?}",
                Intervals::MINIMUM
            );
            Intervals::MINIMUM
        } else {
            period
        };

        let update: UpdateFn = Arc::new(move || update().boxed());
        let task_update = Arc::clone(&update);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task_update().await;
            }
        });

        debug!("Interval updater started (every {period:?})");
        Self {
            update,
            period,
            task,
        }
    }

    /// Run the update once now, independent of the schedule.
    pub async fn force_update(&self) {
        (self.update)().await;
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for IntervalUpdater {
    fn drop(&mut self) {
        self.task.abort();
        debug!("Interval updater stopped");
    }
}
