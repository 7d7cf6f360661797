use std::sync::Arc;
use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Spaces outbound provider requests.
///
/// Alpha Vantage's free tier allows 5 requests per minute; concurrent symbol
/// fetches share one throttle so a batch stays within that quota.
pub struct RequestThrottle {
    semaphore: Arc<Semaphore>,
    last_request: Mutex<Option<Instant>>,
    min_delay: Duration,
}

impl RequestThrottle {
    pub fn new(max_concurrent: usize, requests_per_minute: u32) -> Self {
        let min_delay_ms = 60_000 / u64::from(requests_per_minute.max(1));
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            last_request: Mutex::new(None),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// No spacing and no concurrency bound beyond `max_concurrent`.
    pub fn unthrottled(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            last_request: Mutex::new(None),
            min_delay: Duration::ZERO,
        }
    }

    /// Waits for a slot, then for the minimum spacing since the previous request.
    pub async fn acquire(&self) -> ThrottlePermit {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("throttle semaphore is never closed");

        // Reserve the next send time while holding the lock so concurrent
        // callers queue up behind each other.
        let wait = {
            let mut last = self.last_request.lock();
            let now = Instant::now();
            let next = match *last {
                Some(prev) if prev + self.min_delay > now => prev + self.min_delay,
                _ => now,
            };
            *last = Some(next);
            next.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            debug!("throttling provider request for {}ms", wait.as_millis());
            sleep(wait).await;
        }

        ThrottlePermit { _permit: permit }
    }
}

/// Released when dropped.
pub struct ThrottlePermit {
    _permit: OwnedSemaphorePermit,
}
