//! Passcode Countdown
//!
//! One-second ticker tied to the lifetime of the passcode stage. The ticking
//! task is aborted when the `Countdown` is dropped, so every way out of the
//! stage (success, navigation, expiry, resend) stops it.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const TICK: Duration = Duration::from_secs(1);

pub struct Countdown {
    total_secs: u64,
    remaining: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Start ticking on the current tokio runtime
    pub fn start(duration: Duration) -> Self {
        let total_secs = duration.as_secs();
        let (tx, rx) = watch::channel(total_secs);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            let mut remaining = total_secs;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                if tx.send(remaining).is_err() {
                    break;
                }
            }
        });

        Self {
            total_secs,
            remaining: rx,
            task,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        *self.remaining.borrow()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_secs() == 0
    }

    /// Remaining time as `m:ss`
    pub fn display(&self) -> String {
        format_remaining(self.remaining_secs())
    }

    /// Receiver for views that redraw on every tick
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining.clone()
    }

    /// Resolves when the countdown reaches zero
    pub async fn expired(&mut self) {
        while *self.remaining.borrow_and_update() > 0 {
            if self.remaining.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Countdown")
            .field("total_secs", &self.total_secs)
            .field("remaining_secs", &self.remaining_secs())
            .finish()
    }
}

pub fn format_remaining(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
