//! Process-wide token-bucket rate limiter.
//!
//! The bucket is the only process-wide mutable state in the pipeline. It
//! blocks callers instead of dropping requests, so delivery stays ordered
//! under pressure.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct Bucket {
    tokens_available: f64,
    last_refill: Instant,
}

/// Token bucket refilled at a fixed requests-per-second rate.
pub struct RateLimiter {
    state: Mutex<Bucket>,
    refill_per_sec: f64,
    capacity: f64,
}

impl RateLimiter {
    /// `rps` requests per second, with a burst capacity of one second's
    /// worth of tokens (at least 1). Rates at or below zero are clamped to
    /// a slow trickle instead of stalling forever.
    pub fn new(rps: f64) -> Self {
        let capacity = rps.max(1.0);
        Self {
            state: Mutex::new(Bucket {
                tokens_available: capacity,
                last_refill: Instant::now(),
            }),
            refill_per_sec: rps.max(0.01),
            capacity,
        }
    }

    /// Take one token, sleeping until the bucket can provide it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.state.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
                bucket.tokens_available =
                    (bucket.tokens_available + elapsed * self.refill_per_sec).min(self.capacity);
                bucket.last_refill = now;
                if bucket.tokens_available >= 1.0 {
                    bucket.tokens_available -= 1.0;
                    return;
                }
                let deficit = 1.0 - bucket.tokens_available;
                Duration::from_secs_f64(deficit / self.refill_per_sec)
            };
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_block() {
        tokio::time::pause();
        let limiter = RateLimiter::new(2.0);
        // burst capacity: two immediate acquisitions
        limiter.acquire().await;
        limiter.acquire().await;
        // the third must wait for a refill; with time paused, sleep is
        // auto-advanced, so this still completes promptly
        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_single_rps_floor() {
        let limiter = RateLimiter::new(0.0);
        // even a zero rate keeps a capacity of one, so the first call
        // never deadlocks
        limiter.acquire().await;
    }
}
