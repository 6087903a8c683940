//! Per-address datagram rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allow,
    /// Over the limit; the address stays blocked until the window ends.
    Drop,
    /// The datagram that crossed the limit. Reported once per window.
    Exceeded,
}

struct Counter {
    window_start: Instant,
    count: u32,
    blocked: bool,
}

pub struct RateLimiter {
    base_limit: u32,
    window: Duration,
    counters: HashMap<IpAddr, Counter>,
}

impl RateLimiter {
    pub fn new(base_limit: u32, window: Duration) -> Self {
        Self {
            base_limit,
            window,
            counters: HashMap::new(),
        }
    }

    /// The allowed datagrams per window for an address with the given multiplier.
    pub fn effective_limit(&self, multiplier: u32) -> u32 {
        self.base_limit.saturating_mul(multiplier.max(1))
    }

    pub fn check(&mut self, ip: IpAddr, multiplier: u32, now: Instant) -> RateDecision {
        let limit = self.effective_limit(multiplier);
        let window = self.window;
        let counter = self.counters.entry(ip).or_insert(Counter {
            window_start: now,
            count: 0,
            blocked: false,
        });
        if now.duration_since(counter.window_start) >= window {
            counter.window_start = now;
            counter.count = 0;
            counter.blocked = false;
        }
        if counter.blocked {
            return RateDecision::Drop;
        }
        counter.count += 1;
        if counter.count > limit {
            counter.blocked = true;
            return RateDecision::Exceeded;
        }
        RateDecision::Allow
    }

    /// Forget addresses whose window has long passed.
    pub fn sweep(&mut self, now: Instant) {
        let keep = self.window * 2;
        self.counters
            .retain(|_, c| now.duration_since(c.window_start) < keep);
    }

    pub fn tracked(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed_before_limit(limiter: &mut RateLimiter, ip: IpAddr, multiplier: u32) -> u32 {
        let now = Instant::now();
        let mut allowed = 0;
        loop {
            match limiter.check(ip, multiplier, now) {
                RateDecision::Allow => allowed += 1,
                _ => return allowed,
            }
        }
    }

    #[test]
    fn threshold_scales_with_multiplier() {
        let base = 40;
        for multiplier in [1, 2, 3, 7] {
            let mut limiter = RateLimiter::new(base, Duration::from_secs(1));
            let ip: IpAddr = "10.0.0.1".parse().unwrap();
            assert_eq!(limiter.effective_limit(multiplier), base * multiplier);
            assert_eq!(allowed_before_limit(&mut limiter, ip, multiplier), base * multiplier);
        }
    }

    #[test]
    fn exceeded_reported_once_then_dropped() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
        let ip: IpAddr = "10.0.0.2".parse().unwrap();
        let now = Instant::now();
        assert_eq!(limiter.check(ip, 1, now), RateDecision::Allow);
        assert_eq!(limiter.check(ip, 1, now), RateDecision::Allow);
        assert_eq!(limiter.check(ip, 1, now), RateDecision::Exceeded);
        assert_eq!(limiter.check(ip, 1, now), RateDecision::Drop);
        let later = now + Duration::from_secs(1);
        assert_eq!(limiter.check(ip, 1, later), RateDecision::Allow);
    }

    #[test]
    fn addresses_are_counted_separately() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(1));
        let now = Instant::now();
        let a: IpAddr = "10.0.0.3".parse().unwrap();
        let b: IpAddr = "10.0.0.4".parse().unwrap();
        assert_eq!(limiter.check(a, 1, now), RateDecision::Allow);
        assert_eq!(limiter.check(b, 1, now), RateDecision::Allow);
        assert_eq!(limiter.check(a, 1, now), RateDecision::Exceeded);
    }

    #[test]
    fn sweep_forgets_idle_addresses() {
        let mut limiter = RateLimiter::new(5, Duration::from_millis(10));
        let now = Instant::now();
        limiter.check("10.0.0.5".parse().unwrap(), 1, now);
        limiter.sweep(now + Duration::from_secs(1));
        assert_eq!(limiter.tracked(), 0);
    }
}
