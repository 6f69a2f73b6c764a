//! Practice session timer.
//!
//! `Idle -> Running` on [`SessionTimer::start`], back to `Idle` on
//! [`SessionTimer::stop`]. While running, a tick task republishes the
//! session's elapsed time every `tick` period. Time is measured with
//! `tokio::time::Instant`.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::subscription::{Observable, Subscription};

enum TimerState {
    Idle,
    Running {
        started: Instant,
        baseline: u64,
        ticker: JoinHandle<()>,
    },
}

pub struct SessionTimer {
    tick: Duration,
    elapsed: Observable<u64>,
    state: Mutex<TimerState>,
}

impl SessionTimer {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            elapsed: Observable::new(0),
            state: Mutex::new(TimerState::Idle),
        }
    }

    /// Begin a session on top of `baseline` milliseconds already studied
    /// today. Returns `false` if a session is already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, baseline: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if matches!(*state, TimerState::Running { .. }) {
            return false;
        }

        let started = Instant::now();
        self.elapsed.publish(0);

        let elapsed = self.elapsed.clone();
        let period = self.tick;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(started + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                elapsed.publish(millis(started.elapsed()));
            }
        });

        *state = TimerState::Running {
            started,
            baseline,
            ticker,
        };
        debug!(baseline, "session started");
        true
    }

    /// End the session and return the new daily total, or `None` if no
    /// session was running.
    pub fn stop(&self) -> Option<u64> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match std::mem::replace(&mut *state, TimerState::Idle) {
            TimerState::Idle => None,
            TimerState::Running {
                started,
                baseline,
                ticker,
            } => {
                ticker.abort();
                let session = millis(started.elapsed());
                self.elapsed.publish(0);
                debug!(baseline, session, "session stopped");
                Some(baseline.saturating_add(session))
            }
        }
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        matches!(*state, TimerState::Running { .. })
    }

    /// Milliseconds shown for the running session, as of the last tick.
    pub fn displayed_elapsed(&self) -> u64 {
        self.elapsed.get()
    }

    /// Baseline plus time elapsed right now, `None` when idle.
    pub fn live_total(&self) -> Option<u64> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match &*state {
            TimerState::Idle => None,
            TimerState::Running {
                started, baseline, ..
            } => Some(baseline.saturating_add(millis(started.elapsed()))),
        }
    }

    pub fn subscribe(&self) -> Subscription<u64> {
        self.elapsed.subscribe()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|p| p.into_inner());
        if let TimerState::Running { ticker, .. } = state {
            ticker.abort();
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stop_adds_session_to_baseline() {
        let timer = SessionTimer::new(Duration::from_secs(1));
        assert!(timer.start(10_000));
        tokio::time::sleep(Duration::from_millis(3_000)).await;

        let total = timer.stop().unwrap();
        assert!((13_000..13_100).contains(&total), "total = {total}");
        assert_eq!(timer.displayed_elapsed(), 0);
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_publish_elapsed_time() {
        let timer = SessionTimer::new(Duration::from_secs(1));
        let mut sub = timer.subscribe();
        timer.start(0);

        // First value after start is the reset to zero.
        let first = sub.changed().await.unwrap();
        let first = if first == 0 { sub.changed().await.unwrap() } else { first };
        assert!((1_000..1_100).contains(&first), "first tick = {first}");

        let second = sub.changed().await.unwrap();
        assert!((2_000..2_100).contains(&second), "second tick = {second}");
        timer.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_transitions_are_no_ops() {
        let timer = SessionTimer::new(Duration::from_secs(1));
        assert_eq!(timer.stop(), None);

        assert!(timer.start(0));
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!timer.start(99_999));

        let total = timer.stop().unwrap();
        assert!(total < 99_999);
        assert_eq!(timer.stop(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_the_tick_task() {
        let timer = SessionTimer::new(Duration::from_secs(1));
        let elapsed = timer.elapsed.clone();
        timer.start(0);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        drop(timer);

        let frozen = elapsed.get();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(elapsed.get(), frozen);
    }
}
