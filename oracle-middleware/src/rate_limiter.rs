//! A per-provider token bucket a `Provider` implementation can embed to
//! self-throttle against an upstream's request budget.
//!
//! Per the rate-limiting design note, the fanout engine is ignorant of this:
//! a provider under rate pressure self-throttles up to its own deadline,
//! after which it reports `FailureKind::RateLimited` and is counted as a
//! failure like any other.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Tracks calls made within a sliding window and rejects calls past `limit`.
pub struct RateLimiter {
    limit: u64,
    window: Duration,
    state: Mutex<State>,
}

struct State {
    calls_in_window: u64,
    window_start: Instant,
}

impl RateLimiter {
    /// Allow up to `limit` calls per `window`.
    #[must_use]
    pub fn new(limit: u64, window: Duration) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new(State {
                calls_in_window: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Attempt to consume one unit of budget. Returns `Ok(())` if allowed, or
    /// `Err(remaining_in_window)` (milliseconds until reset) if the caller
    /// should back off.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let mut state = self.state.lock().expect("mutex poisoned");
        let now = Instant::now();

        if now.duration_since(state.window_start) >= self.window {
            state.calls_in_window = 0;
            state.window_start = now;
        }

        if state.calls_in_window < self.limit {
            state.calls_in_window += 1;
            return Ok(());
        }

        let elapsed = now.duration_since(state.window_start);
        Err(self.window.saturating_sub(elapsed))
    }
}
