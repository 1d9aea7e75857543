//! Exponential retry backoff.

use chrono::Duration;

/// Delay before the next retry, given the attempt number just completed
/// (1-based).
///
/// Doubles per attempt: `base`, `2*base`, `4*base`, ... The exact base is
/// tuning; monotonic growth is the invariant.
pub fn retry_backoff(base_seconds: u64, attempt: u32) -> Duration {
    let factor = 1u64 << attempt.saturating_sub(1).min(16);
    Duration::seconds((base_seconds.saturating_mul(factor)) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_per_attempt() {
        assert_eq!(retry_backoff(300, 1), Duration::seconds(300));
        assert_eq!(retry_backoff(300, 2), Duration::seconds(600));
        assert_eq!(retry_backoff(300, 3), Duration::seconds(1200));
    }

    #[test]
    fn test_monotonically_increasing() {
        let mut last = Duration::zero();
        for attempt in 1..=10 {
            let next = retry_backoff(60, attempt);
            assert!(next > last);
            last = next;
        }
    }
}
