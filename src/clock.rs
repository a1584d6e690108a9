/// Source of wall-clock time for timestamps and the last-update marker.
pub trait Clock: Send + Sync {
    fn now(&self) -> chrono::DateTime<chrono::Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc::now()
    }
}

#[cfg(test)]
pub use self::manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::sync;

    /// A clock that only moves when told to.
    #[derive(Debug)]
    pub struct ManualClock {
        now: sync::Mutex<chrono::DateTime<chrono::Utc>>,
    }

    impl ManualClock {
        pub fn new(now: chrono::DateTime<chrono::Utc>) -> Self {
            ManualClock {
                now: sync::Mutex::new(now),
            }
        }

        pub fn advance(&self, by: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now = *now + by;
        }
    }

    impl super::Clock for ManualClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            *self.now.lock().unwrap()
        }
    }
}
