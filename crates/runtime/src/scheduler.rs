use std::time::Duration;

use foundation::ids::Epoch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    Inactive,
    Active { epoch: Epoch, period: Duration },
}

struct ActiveTimer {
    epoch: Epoch,
    period: Duration,
    task: JoinHandle<()>,
}

/// Periodic refresh timer tied to the lifetime of one resolved view.
///
/// At most one timer task exists at any time: activating again always aborts
/// the previous task first. The first tick fires one full period after
/// activation and every tick carries the epoch it was scheduled for.
///
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub struct RefreshScheduler {
    active: Option<ActiveTimer>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking every `period`, replacing any running timer.
    ///
    /// `on_tick` returns `false` once nobody is listening; the timer then
    /// stops on its own.
    pub fn activate<F>(&mut self, epoch: Epoch, period: Duration, on_tick: F)
    where
        F: Fn(Epoch) -> bool + Send + 'static,
    {
        self.cancel();
        let period = period.max(Duration::from_millis(1));
        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !on_tick(epoch) {
                    debug!(epoch = %epoch, "refresh listener gone; timer stopping");
                    break;
                }
            }
        });
        self.active = Some(ActiveTimer {
            epoch,
            period,
            task,
        });
        info!(epoch = %epoch, period_ms = period.as_millis() as u64, "refresh scheduler active");
    }

    /// Cancels the timer, if any.
    pub fn deactivate(&mut self) {
        if self.cancel() {
            info!("refresh scheduler inactive");
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.active {
            Some(t) => SchedulerState::Active {
                epoch: t.epoch,
                period: t.period,
            },
            None => SchedulerState::Inactive,
        }
    }

    /// Number of live timer tasks; never more than one.
    pub fn active_timers(&self) -> usize {
        self.active
            .iter()
            .filter(|t| !t.task.is_finished())
            .count()
    }

    fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(t) => {
                t.task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::{RefreshScheduler, SchedulerState};
    use foundation::ids::Epoch;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, impl Fn(Epoch) -> bool + Send + 'static) {
        let n = Arc::new(AtomicUsize::new(0));
        let c = n.clone();
        (n, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_after_one_period() {
        let (n, f) = counter();
        let mut s = RefreshScheduler::new();
        s.activate(Epoch(1), Duration::from_secs(5), f);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(n.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(n.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(n.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_leaves_exactly_one_timer() {
        let (n, f) = counter();
        let (m, g) = counter();
        let mut s = RefreshScheduler::new();
        s.activate(Epoch(1), Duration::from_secs(5), f);
        s.activate(Epoch(2), Duration::from_secs(5), g);
        assert_eq!(s.active_timers(), 1);
        assert!(matches!(s.state(), SchedulerState::Active { epoch: Epoch(2), .. }));

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(n.load(Ordering::SeqCst), 0);
        assert_eq!(m.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_stops_ticks() {
        let (n, f) = counter();
        let mut s = RefreshScheduler::new();
        s.activate(Epoch(3), Duration::from_secs(1), f);
        assert_eq!(
            s.state(),
            SchedulerState::Active {
                epoch: Epoch(3),
                period: Duration::from_secs(1)
            }
        );
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        s.deactivate();
        assert_eq!(s.state(), SchedulerState::Inactive);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(n.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_stops_when_listener_is_gone() {
        let mut s = RefreshScheduler::new();
        s.activate(Epoch(1), Duration::from_secs(1), |_| false);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(matches!(s.state(), SchedulerState::Active { .. }));
        assert_eq!(s.active_timers(), 0);
    }
}
