//! Backoff policy for retried load attempts.
//!
//! Capped exponential backoff: `base^(n+1)` seconds, capped at 300s, where
//! `n` is the retry count *before* this attempt (so the first retry waits
//! `base` seconds).

use std::time::Duration;

const CAP_SECS: u64 = 300;

/// Delay before the `(retry_count + 1)`-th attempt.
pub fn backoff_delay(retry_count: u32, base_secs: u64) -> Duration {
    let exponent = retry_count.saturating_add(1);
    let delay = base_secs.saturating_pow(exponent).min(CAP_SECS);
    Duration::from_secs(delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_exponentially_then_caps() {
        assert_eq!(backoff_delay(0, 2).as_secs(), 2);
        assert_eq!(backoff_delay(1, 2).as_secs(), 4);
        assert_eq!(backoff_delay(2, 2).as_secs(), 8);
        assert_eq!(backoff_delay(10, 2).as_secs(), CAP_SECS);
    }

    #[test]
    fn never_exceeds_cap_even_with_large_base() {
        assert_eq!(backoff_delay(5, 10).as_secs(), CAP_SECS);
    }
}
