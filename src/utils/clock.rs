use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// Represents an entity responsible for providing the wall clock across the application. Calendar
/// days and the reminder deadline are both local, so the clock hands out local time. Swapping it
/// out lets tests move between days and warp through timers.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;

    async fn sleep(&self, duration: Duration);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
pub use test_clock::{local, ManualClock};

#[cfg(test)]
mod test_clock {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, TimeZone};

    use super::Clock;

    /// Clock whose wall time only moves when told to. Sleeping goes through tokio, so paused
    /// tests still advance through timers.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Local>>>,
    }

    impl ManualClock {
        pub fn new(now: DateTime<Local>) -> Self {
            Self {
                now: Arc::new(Mutex::new(now)),
            }
        }

        pub fn at(date: NaiveDate, hour: u32, minute: u32) -> Self {
            Self::new(local(date, hour, minute))
        }

        pub fn set(&self, now: DateTime<Local>) {
            *self.now.lock().unwrap() = now;
        }
    }

    pub fn local(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&date.and_hms_opt(hour, minute, 0).unwrap())
            .earliest()
            .unwrap()
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Local> {
            *self.now.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }
    }
}
