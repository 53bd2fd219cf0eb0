//! Clock background task driving the once-per-second tick

use std::{sync::Arc, time::Duration};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::state::TimerEngine;

/// Period between two ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Handle to a running clock
#[derive(Debug)]
pub struct ClockHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ClockHandle {
    /// Stop ticking and wait for the task to finish.
    ///
    /// A tick already in progress completes before the task exits.
    pub async fn stop(self) {
        // The task may already be gone; there is nothing left to signal then
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.join.await {
            error!("Clock task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Start the clock for `engine`
pub fn spawn_clock(engine: Arc<TimerEngine>) -> ClockHandle {
    let (stop_tx, stop_rx) = watch::channel(false);
    let join = tokio::spawn(clock_task(engine, stop_rx));
    ClockHandle { stop_tx, join }
}

/// Background task that ticks the engine every second until stopped
pub async fn clock_task(engine: Arc<TimerEngine>, mut stop_rx: watch::Receiver<bool>) {
    info!("Starting clock");

    // First tick lands one full period after start
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    // Missed ticks are dropped, never replayed
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match engine.tick() {
                    Ok(0) => {}
                    Ok(completed) => debug!("Tick completed {} timers", completed),
                    Err(e) => error!("Tick failed: {}", e),
                }
            }

            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }

    info!("Clock stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::TimerStatus;

    #[tokio::test(start_paused = true)]
    async fn clock_ticks_once_per_second() {
        let engine = Arc::new(TimerEngine::in_memory());
        let timer = engine.add_timer("Focus", 5, "Work").unwrap();
        engine.start_timer(timer.id).unwrap();

        let clock = spawn_clock(Arc::clone(&engine));
        tokio::time::sleep(Duration::from_millis(3500)).await;

        let state = engine.runtime_state(timer.id).unwrap().unwrap();
        assert_eq!(state.time_left_seconds, 2);
        assert_eq!(state.status, TimerStatus::Running);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let state = engine.runtime_state(timer.id).unwrap().unwrap();
        assert_eq!(state.status, TimerStatus::Completed);
        assert_eq!(engine.history().unwrap().len(), 1);

        clock.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_clock_does_not_replay_missed_ticks() {
        let engine = Arc::new(TimerEngine::in_memory());
        let timer = engine.add_timer("Focus", 60, "Work").unwrap();
        engine.start_timer(timer.id).unwrap();

        let clock = spawn_clock(Arc::clone(&engine));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        clock.stop().await;
        assert_eq!(engine.runtime_state(timer.id).unwrap().unwrap().time_left_seconds, 58);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(engine.runtime_state(timer.id).unwrap().unwrap().time_left_seconds, 58);

        let clock = spawn_clock(Arc::clone(&engine));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.runtime_state(timer.id).unwrap().unwrap().time_left_seconds, 57);
        clock.stop().await;
    }
}
