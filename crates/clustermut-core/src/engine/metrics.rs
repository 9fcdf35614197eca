use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by every mutation call that receives a reference to them.
///
/// All counters use relaxed atomics, so one instance may be shared across
/// workers running mutations in parallel.
#[derive(Debug, Default)]
pub struct MutationMetrics {
    energy_evaluations: AtomicU64,
    local_optimizations: AtomicU64,
    collision_checks: AtomicU64,
    candidates_generated: AtomicU64,
    candidates_rejected: AtomicU64,
    commits: AtomicU64,
    fallbacks: AtomicU64,
    discards: AtomicU64,
}

/// Point-in-time copy of [`MutationMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub energy_evaluations: u64,
    pub local_optimizations: u64,
    pub collision_checks: u64,
    pub candidates_generated: u64,
    pub candidates_rejected: u64,
    pub commits: u64,
    pub fallbacks: u64,
    pub discards: u64,
}

impl MutationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_energy_evaluation(&self) {
        self.energy_evaluations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_local_optimization(&self) {
        self.local_optimizations.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_collision_check(&self) {
        self.collision_checks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_candidate(&self, accepted: bool) {
        self.candidates_generated.fetch_add(1, Ordering::Relaxed);
        if !accepted {
            self.candidates_rejected.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discard(&self) {
        self.discards.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            energy_evaluations: self.energy_evaluations.load(Ordering::Relaxed),
            local_optimizations: self.local_optimizations.load(Ordering::Relaxed),
            collision_checks: self.collision_checks.load(Ordering::Relaxed),
            candidates_generated: self.candidates_generated.load(Ordering::Relaxed),
            candidates_rejected: self.candidates_rejected.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn candidates_count_rejections_separately() {
        let metrics = MutationMetrics::new();
        metrics.record_candidate(true);
        metrics.record_candidate(false);
        metrics.record_candidate(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.candidates_generated, 3);
        assert_eq!(snapshot.candidates_rejected, 2);
    }

    #[test]
    fn counters_are_shared_across_threads() {
        let metrics = MutationMetrics::new();
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..100 {
                        metrics.record_energy_evaluation();
                    }
                });
            }
        });
        assert_eq!(metrics.snapshot().energy_evaluations, 400);
    }
}
