use super::report::MetricsReport;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters updated by the registry on every operation.
pub struct RegistryMetrics {
    issued: AtomicU64,
    code_collisions: AtomicU64,
    issuance_failures: AtomicU64,
    validations: AtomicU64,
    validation_misses: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    started: Instant,
}

impl Default for RegistryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryMetrics {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            code_collisions: AtomicU64::new(0),
            issuance_failures: AtomicU64::new(0),
            validations: AtomicU64::new(0),
            validation_misses: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_issued(&self) {
        self.issued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_collision(&self) {
        self.code_collisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_issuance_failure(&self) {
        self.issuance_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_validation(&self, found: bool) {
        self.validations.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.validation_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_cache(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsReport {
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        let lookups = cache_hits + cache_misses;

        MetricsReport {
            timestamp: Utc::now().to_rfc3339(),
            issued: self.issued.load(Ordering::Relaxed),
            code_collisions: self.code_collisions.load(Ordering::Relaxed),
            issuance_failures: self.issuance_failures.load(Ordering::Relaxed),
            validations: self.validations.load(Ordering::Relaxed),
            validation_misses: self.validation_misses.load(Ordering::Relaxed),
            cache_hits,
            cache_misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                (cache_hits as f64 / lookups as f64) * 100.0
            },
            issuance_rate: 0.0,
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let metrics = RegistryMetrics::new();
        metrics.record_issued();
        metrics.record_issued();
        metrics.record_collision();
        metrics.record_validation(true);
        metrics.record_validation(false);
        metrics.record_cache(true);
        metrics.record_cache(false);
        metrics.record_cache(false);
        metrics.record_cache(true);

        let report = metrics.snapshot();
        assert_eq!(report.issued, 2);
        assert_eq!(report.code_collisions, 1);
        assert_eq!(report.issuance_failures, 0);
        assert_eq!(report.validations, 2);
        assert_eq!(report.validation_misses, 1);
        assert!((report.cache_hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        assert_eq!(RegistryMetrics::new().snapshot().cache_hit_rate, 0.0);
    }
}
