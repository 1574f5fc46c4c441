//! Periodic eviction of expired rate-limit windows.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{RateLimiter, Timestamp};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Evicts windows that ended more than `interval` ago, every `interval`.
///
/// The task runs until aborted.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = limiter.evict_expired(Timestamp::now(), interval);
            if evicted > 0 {
                tracing::debug!(evicted, remaining = limiter.len(), "rate-limit sweep");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use pipeline::OperationType;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_long_expired_windows() {
        let limiter = Arc::new(RateLimiter::default());
        let then = Timestamp::from_utc(chrono::Utc::now() - chrono::Duration::hours(3));
        limiter.check_at("caller", OperationType::General, then);
        assert_eq!(limiter.len(), 1);

        let handle = spawn_sweeper(Arc::clone(&limiter), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_secs(61)).await;
        tokio::task::yield_now().await;

        assert!(limiter.is_empty());
        handle.abort();
    }
}
