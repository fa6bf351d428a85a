//! Capped exponential backoff for failed lock acquisitions

use std::time::Duration;

use contracts::BackoffConfig;

/// Capped exponential backoff
///
/// Each `next_delay` returns the current delay and advances it by the
/// configured multiplier, up to the ceiling. `reset` is called after a
/// successful acquisition so the next contention starts small again.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    current_ms: u64,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            current_ms: config.initial_ms,
            config,
        }
    }

    /// Current delay; advances the internal state
    pub fn next_delay(&mut self) -> Duration {
        let delay = Duration::from_millis(self.current_ms);
        let grown = (self.current_ms as f64 * self.config.multiplier).round() as u64;
        // max wins over initial when the config is inverted
        self.current_ms = grown.max(self.config.initial_ms).min(self.config.max_ms);
        delay
    }

    /// Restart from the initial delay
    pub fn reset(&mut self) {
        self.current_ms = self.config.initial_ms;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial_ms: 200,
            max_ms: 5_000,
            multiplier: 2.0,
        });

        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_millis(1_600));
        assert_eq!(backoff.next_delay(), Duration::from_millis(3_200));
        // Capped at the ceiling from here on
        assert_eq!(backoff.next_delay(), Duration::from_millis(5_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_backoff_reset() {
        let mut backoff = Backoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
    }

    #[test]
    fn test_inverted_config_never_panics() {
        // max_ms below initial_ms can reach Backoff unvalidated; the
        // ceiling wins and delays stay finite
        let mut backoff = Backoff::new(BackoffConfig {
            initial_ms: 1_000,
            max_ms: 100,
            multiplier: 2.0,
        });
        assert_eq!(backoff.next_delay(), Duration::from_millis(1_000));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_multiplier_one_stays_flat() {
        let mut backoff = Backoff::new(BackoffConfig {
            initial_ms: 100,
            max_ms: 1_000,
            multiplier: 1.0,
        });
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
