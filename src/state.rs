use crate::config::AppConfig;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub requests_served: AtomicU64,
    pub requests_rejected: AtomicU64,
    pub chains_computed: AtomicU64,
    pub grid_points_priced: AtomicU64,
    pub errors: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            requests_served: AtomicU64::new(0),
            requests_rejected: AtomicU64::new(0),
            chains_computed: AtomicU64::new(0),
            grid_points_priced: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        use portable_atomic::Ordering::Relaxed;
        CounterSnapshot {
            requests_served: self.requests_served.load(Relaxed),
            requests_rejected: self.requests_rejected.load(Relaxed),
            chains_computed: self.chains_computed.load(Relaxed),
            grid_points_priced: self.grid_points_priced.load(Relaxed),
            errors: self.errors.load(Relaxed),
        }
    }
}

impl Default for PerfCounters {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CounterSnapshot {
    pub requests_served: u64,
    pub requests_rejected: u64,
    pub chains_computed: u64,
    pub grid_points_priced: u64,
    pub errors: u64,
}

// ── Application shared state ──
// Pricing engines are never shared: each request builds its own.

pub struct AppState {
    pub config: AppConfig,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            counters: PerfCounters::new(),
        })
    }

    #[inline]
    pub fn record_served(&self, grid_points: usize) {
        self.counters.requests_served.fetch_add(1, Ordering::Relaxed);
        self.counters.chains_computed.fetch_add(1, Ordering::Relaxed);
        self.counters
            .grid_points_priced
            .fetch_add(grid_points as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self) {
        self.counters.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.counters.errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let state = AppState::new(AppConfig::default());
        state.record_served(12);
        state.record_served(30);
        state.record_rejected();
        state.record_error();

        let snap = state.counters.snapshot();
        assert_eq!(snap.requests_served, 2);
        assert_eq!(snap.chains_computed, 2);
        assert_eq!(snap.grid_points_priced, 42);
        assert_eq!(snap.requests_rejected, 1);
        assert_eq!(snap.errors, 1);
    }
}
