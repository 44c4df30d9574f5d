use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, TimeZone};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    notification::{notify, Delivery, Notification, NotificationService},
    utils::{clock::Clock, time::delay_until_today_at},
};

pub const REMINDER_HOUR: u32 = 7;
pub const REMINDER_MINUTE: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderState {
    /// Waiting for the deadline, `delay` after the scheduler was created.
    Armed { delay: Duration },
    /// Fired, cancelled or never armed. Nothing will happen anymore.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderOutcome {
    /// The reminder time had already passed when the session started.
    Skipped,
    /// The session ended before the deadline.
    Cancelled,
    Fired(Delivery),
}

/// Delay from `now` until today's reminder. [None] once the reminder time has been reached.
pub fn reminder_delay<Tz: TimeZone>(now: &DateTime<Tz>) -> Option<Duration> {
    delay_until_today_at(now, REMINDER_HOUR, REMINDER_MINUTE)
        .and_then(|delay| delay.to_std().ok())
        .filter(|delay| !delay.is_zero())
}

/// One-shot reminder for a single session. It never re-arms, a session that outlives the
/// deadline or starts after it stays idle.
pub struct ReminderScheduler<N: NotificationService> {
    state: ReminderState,
    notifications: N,
    clock: Box<dyn Clock>,
    shutdown: CancellationToken,
}

impl<N: NotificationService> ReminderScheduler<N> {
    pub fn new(notifications: N, clock: Box<dyn Clock>, shutdown: CancellationToken) -> Self {
        let now = clock.time();
        let state = match reminder_delay(&now) {
            Some(delay) => {
                info!(
                    "Reminder armed for {REMINDER_HOUR}:{REMINDER_MINUTE:02} (in {} seconds)",
                    delay.as_secs()
                );
                ReminderState::Armed { delay }
            }
            None => {
                info!(
                    "It's {} already, no reminder this session",
                    now.format("%H:%M")
                );
                ReminderState::Idle
            }
        };
        Self {
            state,
            notifications,
            clock,
            shutdown,
        }
    }

    pub fn state(&self) -> ReminderState {
        self.state
    }

    /// Waits for the deadline or for the shutdown token, whichever comes first.
    pub async fn run(&mut self) -> Result<ReminderOutcome> {
        let ReminderState::Armed { delay } = self.state else {
            return Ok(ReminderOutcome::Skipped);
        };

        let reached = tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = self.clock.sleep(delay) => true,
        };
        self.state = ReminderState::Idle;

        if !reached {
            info!("Session ended before the reminder, cancelling it");
            return Ok(ReminderOutcome::Cancelled);
        }

        let delivery = notify(&mut self.notifications, &Notification::reminder())
            .inspect_err(|e| warn!("Failed to send the reminder {e:?}"))?;
        info!("Reminder fired: {delivery:?}");
        Ok(ReminderOutcome::Fired(delivery))
    }
}
