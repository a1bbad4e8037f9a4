use std::hash::Hash;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

const LOGIN_WINDOW_SECS: u64 = 15 * 60;
const LOGIN_MAX_FAILURES: u32 = 5;

const CONFIRM_WINDOW_SECS: u64 = 15 * 60;
const CONFIRM_MAX_FAILURES: u32 = 10;

/// Failure counter per key over a fixed window.
struct FailureWindow<K> {
    /// key -> (failed_count, window_start)
    entries: DashMap<K, (u32, Instant)>,
    max_failures: u32,
    window_secs: u64,
}

impl<K: Eq + Hash> FailureWindow<K> {
    fn new(max_failures: u32, window_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            max_failures,
            window_secs,
        }
    }

    /// Returns Err with retry-after seconds once the key is over its limit.
    fn check(&self, key: &K) -> Result<(), u64> {
        let window = Duration::from_secs(self.window_secs);
        let now = Instant::now();

        let Some(entry) = self.entries.get(key) else {
            return Ok(());
        };
        let (count, start) = entry.value();

        if now.duration_since(*start) > window {
            return Ok(());
        }

        if *count >= self.max_failures {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window_secs.saturating_sub(elapsed));
        }

        Ok(())
    }

    fn record_failure(&self, key: K) {
        let window = Duration::from_secs(self.window_secs);
        let now = Instant::now();

        let mut entry = self.entries.entry(key).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    fn reset(&self, key: &K) {
        self.entries.remove(key);
    }

    fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    inner: FailureWindow<String>,
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            inner: FailureWindow::new(LOGIN_MAX_FAILURES, LOGIN_WINDOW_SECS),
        }
    }

    /// Check if login attempt is allowed. 5 failures per 15 minutes.
    /// Does NOT increment the counter; call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        self.inner.check(&email.to_lowercase())
    }

    pub fn record_failure(&self, email: &str) {
        self.inner.record_failure(email.to_lowercase());
    }

    /// Forget the failures for an email after a successful login.
    pub fn reset(&self, email: &str) {
        self.inner.reset(&email.to_lowercase());
    }

    pub fn cleanup(&self, max_age: Duration) {
        self.inner.cleanup(max_age);
    }
}

/// Per-IP limiter for reset confirmations that present unknown or expired
/// tokens. 10 failures per 15 minutes.
pub struct ResetConfirmRateLimiter {
    inner: FailureWindow<IpAddr>,
}

impl Default for ResetConfirmRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResetConfirmRateLimiter {
    pub fn new() -> Self {
        Self {
            inner: FailureWindow::new(CONFIRM_MAX_FAILURES, CONFIRM_WINDOW_SECS),
        }
    }

    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        self.inner.check(&ip)
    }

    pub fn record_failure(&self, ip: IpAddr) {
        self.inner.record_failure(ip);
    }

    pub fn cleanup(&self, max_age: Duration) {
        self.inner.cleanup(max_age);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_after_five_failures() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..LOGIN_MAX_FAILURES {
            assert!(limiter.check("Alice@Example.com").is_ok());
            limiter.record_failure("alice@example.com");
        }
        let retry_after = limiter.check("ALICE@example.com").unwrap_err();
        assert!(retry_after > 0 && retry_after <= LOGIN_WINDOW_SECS);

        limiter.reset("alice@example.com");
        assert!(limiter.check("alice@example.com").is_ok());
    }

    #[test]
    fn cleanup_drops_old_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("a@example.com");
        limiter.cleanup(Duration::ZERO);
        assert!(limiter.inner.entries.is_empty());
    }

    #[test]
    fn confirm_limiter_is_per_address() {
        let limiter = ResetConfirmRateLimiter::new();
        let attacker: IpAddr = "203.0.113.7".parse().unwrap();
        let bystander: IpAddr = "198.51.100.2".parse().unwrap();

        for _ in 0..CONFIRM_MAX_FAILURES {
            assert!(limiter.check(attacker).is_ok());
            limiter.record_failure(attacker);
        }
        assert!(limiter.check(attacker).is_err());
        assert!(limiter.check(bystander).is_ok());
    }
}
