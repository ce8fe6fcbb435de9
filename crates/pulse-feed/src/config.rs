//! Feed timing configuration
//!
//! One knob per timer the session owns. The three poll cadences are
//! deliberately independent: the questions have different cost/urgency
//! tradeoffs, and coupling them to one timer would let a slow sweep
//! throttle a fast poll.

use std::time::Duration;

/// Timing knobs for a feed session.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Cadence of the "new notifications since T" poll
    pub poll_interval: Duration,
    /// Cadence of the overdue-task sweep
    pub overdue_sweep_interval: Duration,
    /// Cadence of the unread-message sweep
    pub message_sweep_interval: Duration,
    /// Cadence of the store's background refetch
    pub refresh_interval: Duration,
    /// A refetch younger than this coalesces follow-up invalidations
    pub staleness_window: Duration,
    /// Delay before a stream reconnect attempt
    pub reconnect_delay: Duration,
    /// Auto-dismiss duration for non-sticky toasts
    pub toast_duration: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            overdue_sweep_interval: Duration::from_secs(5 * 60),
            message_sweep_interval: Duration::from_secs(30),
            refresh_interval: Duration::from_secs(30),
            staleness_window: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(5),
            toast_duration: Duration::from_secs(5),
        }
    }
}

impl FeedConfig {
    /// Create the default configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With notification poll cadence
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// With overdue-sweep cadence
    #[inline]
    #[must_use]
    pub fn with_overdue_sweep_interval(mut self, interval: Duration) -> Self {
        self.overdue_sweep_interval = interval;
        self
    }

    /// With message-sweep cadence
    #[inline]
    #[must_use]
    pub fn with_message_sweep_interval(mut self, interval: Duration) -> Self {
        self.message_sweep_interval = interval;
        self
    }

    /// With store refetch cadence
    #[inline]
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// With refetch coalescing window
    #[inline]
    #[must_use]
    pub fn with_staleness_window(mut self, window: Duration) -> Self {
        self.staleness_window = window;
        self
    }

    /// With stream reconnect delay
    #[inline]
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// With toast auto-dismiss duration
    #[inline]
    #[must_use]
    pub fn with_toast_duration(mut self, duration: Duration) -> Self {
        self.toast_duration = duration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = FeedConfig::new()
            .with_poll_interval(Duration::from_millis(50))
            .with_reconnect_delay(Duration::from_millis(10));

        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.reconnect_delay, Duration::from_millis(10));
        // Untouched knobs keep their defaults
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
    }
}
