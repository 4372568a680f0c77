//! Per-provider counters (C3): totals, successes, failures, EMA-smoothed
//! latency, running reliability.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// EMA smoothing factor applied to each newly observed latency sample.
const EMA_ALPHA: f64 = 0.1;

/// Mutable, per-provider runtime health counters. Owned by exactly one
/// provider's tasks — the fanout engine never shares a `ProviderMetrics`
/// instance across providers.
#[derive(Debug, Default)]
pub struct ProviderMetrics {
    total: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    ema_latency_ms: Mutex<Option<f64>>,
    last_health: Mutex<Option<bool>>,
}

/// A point-in-time snapshot of a provider's counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Total fetch attempts observed.
    pub total: u64,
    /// Successful fetch attempts.
    pub successes: u64,
    /// Failed or timed-out fetch attempts.
    pub failures: u64,
    /// Exponentially-smoothed latency in milliseconds, or `None` before the first observation.
    pub ema_latency_ms: Option<f64>,
    /// `successes / total`, or `0.0` if `total == 0`.
    pub observed_reliability: f64,
    /// Result of the most recent health probe, if any has run.
    pub last_health: Option<bool>,
}

impl ProviderMetrics {
    /// A fresh, zeroed counter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a concluded fetch: bumps `total` and exactly one of
    /// `successes`/`failures`, and folds `latency_ms` into the EMA — seeding
    /// it on the first observation rather than averaging against zero.
    pub fn record(&self, success: bool, latency_ms: u64) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut ema = self.ema_latency_ms.lock().expect("mutex poisoned");
        let observed = latency_ms as f64;
        *ema = Some(match *ema {
            Some(prev) => EMA_ALPHA.mul_add(observed, (1.0 - EMA_ALPHA) * prev),
            None => observed,
        });
    }

    /// Record the result of a health probe.
    pub fn record_health(&self, healthy: bool) {
        *self.last_health.lock().expect("mutex poisoned") = Some(healthy);
    }

    /// A consistent snapshot of all counters. Not atomic across fields (the
    /// individual atomics/mutex are read independently), which is acceptable
    /// for an informational health view.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total.load(Ordering::Relaxed);
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let observed_reliability = if total == 0 {
            0.0
        } else {
            successes as f64 / total as f64
        };
        MetricsSnapshot {
            total,
            successes,
            failures,
            ema_latency_ms: *self.ema_latency_ms.lock().expect("mutex poisoned"),
            observed_reliability,
            last_health: *self.last_health.lock().expect("mutex poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successes_plus_failures_equals_total() {
        let m = ProviderMetrics::new();
        m.record(true, 10);
        m.record(false, 20);
        m.record(true, 30);
        let snap = m.snapshot();
        assert_eq!(snap.successes + snap.failures, snap.total);
        assert_eq!(snap.total, 3);
    }

    #[test]
    fn first_observation_seeds_ema_instead_of_averaging_against_zero() {
        let m = ProviderMetrics::new();
        m.record(true, 100);
        assert_eq!(m.snapshot().ema_latency_ms, Some(100.0));
    }

    #[test]
    fn reliability_is_zero_for_fresh_counter() {
        let m = ProviderMetrics::new();
        assert_eq!(m.snapshot().observed_reliability, 0.0);
    }
}
