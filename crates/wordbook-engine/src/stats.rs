use std::time::Duration;

/// Process-lifetime lookup counters, owned by the orchestrator
#[derive(Debug, Default)]
pub struct EngineStats {
    hits: u64,
    misses: u64,
    avg_ms: f64,
}

/// Point-in-time view handed to callers
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Percentage of lookups that found an entry
    pub hit_rate: f64,
    pub avg_lookup_ms: f64,
    pub cache_size: usize,
    pub cache_loaded: bool,
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self, elapsed: Duration) {
        self.hits += 1;
        self.update_avg(elapsed);
    }

    pub fn record_miss(&mut self, elapsed: Duration) {
        self.misses += 1;
        self.update_avg(elapsed);
    }

    /// Incremental mean over every lookup, hit or miss; n is the
    /// post-increment call count
    fn update_avg(&mut self, elapsed: Duration) {
        let n = (self.hits + self.misses) as f64;
        let sample = elapsed.as_secs_f64() * 1000.0;
        self.avg_ms = (self.avg_ms * (n - 1.0) + sample) / n;
    }

    pub fn snapshot(&self, cache_size: usize, cache_loaded: bool) -> StatsSnapshot {
        let total = self.hits + self.misses;
        let hit_rate = if total > 0 {
            self.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            avg_lookup_ms: self.avg_ms,
            cache_size,
            cache_loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_tracks_the_arithmetic_mean() {
        let mut stats = EngineStats::new();
        let samples = [3.0f64, 1.0, 5.0, 0.25];
        for (i, ms) in samples.iter().enumerate() {
            let elapsed = Duration::from_secs_f64(ms / 1000.0);
            if i % 2 == 0 {
                stats.record_hit(elapsed);
            } else {
                stats.record_miss(elapsed);
            }
        }

        let mean: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        let snap = stats.snapshot(0, false);
        assert!((snap.avg_lookup_ms - mean).abs() < 1e-9);
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 2);
        assert!((snap.hit_rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_stats_report_zero() {
        let snap = EngineStats::new().snapshot(0, false);
        assert_eq!(snap.hits, 0);
        assert_eq!(snap.misses, 0);
        assert_eq!(snap.hit_rate, 0.0);
        assert_eq!(snap.avg_lookup_ms, 0.0);
    }
}
