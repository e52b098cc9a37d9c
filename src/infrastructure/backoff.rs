//! Reconnect delays for long-lived background connections.

use std::time::Duration;

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(60);

/// Doubling delay between reconnect attempts, capped at one minute.
///
/// Call [`Backoff::reset`] once a connection is established so the next
/// outage starts again from the initial delay.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            current: INITIAL_DELAY,
        }
    }

    /// Delay to sleep before the next attempt; doubles the one after it.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(MAX_DELAY);
        delay
    }

    pub fn reset(&mut self) {
        self.current = INITIAL_DELAY;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
