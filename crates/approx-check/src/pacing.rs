use std::time::Duration;

use tokio::time::{self, Interval, MissedTickBehavior};

use crate::config::Speed;

/// Wake-up schedule for the tick producer, kept apart from what is emitted.
///
/// The first [`Pacer::wait`] returns immediately. Late wake-ups are skipped
/// rather than replayed in a burst. Without an interval the pacer only yields
/// to the scheduler and never sleeps.
pub struct Pacer {
    interval: Option<Interval>,
}

impl Pacer {
    /// Must be called from within a tokio runtime.
    pub fn new(period: Option<Duration>) -> Self {
        let interval = period.filter(|p| !p.is_zero()).map(|p| {
            let mut interval = time::interval(p);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        Self { interval }
    }

    pub fn for_speed(speed: Speed) -> Self {
        Self::new(speed.interval())
    }

    pub fn period(&self) -> Option<Duration> {
        self.interval.as_ref().map(Interval::period)
    }

    pub async fn wait(&mut self) {
        match &mut self.interval {
            Some(interval) => {
                interval.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
    }
}
