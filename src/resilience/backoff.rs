//! Poller interval backoff.

use std::time::Duration;

use crate::config::BackoffPolicy;

/// Next poll interval after `failures` consecutive failures.
///
/// `Compounding` multiplies the *previous* interval by `2^failures`, so the
/// interval grows faster than exponentially across a failure streak.
/// `Standard` recomputes `base * 2^failures`. Both are capped at `max`.
pub fn next_interval(
    policy: BackoffPolicy,
    current: Duration,
    base: Duration,
    failures: u32,
    max: Duration,
) -> Duration {
    let factor = 2u32.saturating_pow(failures);
    let grown = match policy {
        BackoffPolicy::Compounding => current.saturating_mul(factor),
        BackoffPolicy::Standard => base.saturating_mul(factor),
    };
    grown.min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Duration = Duration::from_millis(1000);
    const MAX: Duration = Duration::from_millis(300_000);

    #[test]
    fn test_compounding_against_previous_interval() {
        let first = next_interval(BackoffPolicy::Compounding, BASE, BASE, 1, MAX);
        assert_eq!(first, Duration::from_millis(2000));

        let second = next_interval(BackoffPolicy::Compounding, first, BASE, 2, MAX);
        assert_eq!(second, Duration::from_millis(8000));

        let third = next_interval(BackoffPolicy::Compounding, second, BASE, 3, MAX);
        assert_eq!(third, Duration::from_millis(64_000));

        let fourth = next_interval(BackoffPolicy::Compounding, third, BASE, 4, MAX);
        assert_eq!(fourth, MAX);
    }

    #[test]
    fn test_standard_recomputes_from_base() {
        let intervals: Vec<_> = (1..=4)
            .map(|n| next_interval(BackoffPolicy::Standard, MAX, BASE, n, MAX))
            .collect();
        assert_eq!(
            intervals,
            vec![
                Duration::from_millis(2000),
                Duration::from_millis(4000),
                Duration::from_millis(8000),
                Duration::from_millis(16_000),
            ]
        );
    }

    #[test]
    fn test_huge_failure_counts_saturate_to_max() {
        assert_eq!(next_interval(BackoffPolicy::Compounding, BASE, BASE, 64, MAX), MAX);
        assert_eq!(next_interval(BackoffPolicy::Standard, BASE, BASE, 64, MAX), MAX);
    }
}
