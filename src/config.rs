use std::time::Duration;

/// Booking policy knobs. Embedders construct one directly or read overrides
/// from the environment with [`BookingPolicy::from_env`].
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// How long a PENDING reservation may await its payment outcome before
    /// the sweeper reclaims the room. Fixes each order's decision deadline
    /// at creation time.
    pub reservation_window: Duration,
    /// Period of the expiry sweeper.
    pub sweep_interval: Duration,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            reservation_window: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl BookingPolicy {
    /// Defaults overridden by `INNKEEP_RESERVATION_WINDOW_SECS` and
    /// `INNKEEP_SWEEP_INTERVAL_SECS` where set and parseable.
    pub fn from_env() -> Self {
        let mut policy = Self::default();
        if let Some(window) = env_secs("INNKEEP_RESERVATION_WINDOW_SECS") {
            policy.reservation_window = window;
        }
        if let Some(interval) = env_secs("INNKEEP_SWEEP_INTERVAL_SECS") {
            policy.sweep_interval = interval;
        }
        policy
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_a_day() {
        let policy = BookingPolicy::default();
        assert_eq!(policy.reservation_window, Duration::from_secs(86_400));
        assert_eq!(policy.sweep_interval, Duration::from_secs(86_400));
    }
}
