use std::thread;
use std::time::Duration;

/// Fixed-interval, fixed-count polling. No backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Total number of checks, including the immediate first one
    pub attempts: u32,
    /// Sleep between two consecutive checks
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        // t = 0, 1, ..., 10 seconds
        Self {
            attempts: 11,
            interval: Duration::from_secs(1),
        }
    }
}

impl PollPolicy {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Call `check` until it yields a value or the attempts run out.
    ///
    /// `check` receives the zero-based attempt number. There is no sleep
    /// before the first check nor after the last one.
    pub fn poll_until<T, F>(&self, mut check: F) -> Option<T>
    where
        F: FnMut(u32) -> Option<T>,
    {
        for attempt in 0..self.attempts {
            if let Some(value) = check(attempt) {
                return Some(value);
            }

            if attempt + 1 < self.attempts && !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }

        None
    }
}
