use std::collections::BTreeMap;
use std::time::Duration;

/// Deterministic engine counters.
///
/// Sorted maps keep snapshots stable for logs and assertions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<&'static str, u64>,
    gauges: BTreeMap<&'static str, i64>,
    timings: BTreeMap<&'static str, Timing>,
}

/// Aggregated durations, in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Timing {
    pub count: u64,
    pub total_ms: u64,
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Timing {
    pub fn record(&mut self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if self.count == 0 {
            self.min_ms = ms;
            self.max_ms = ms;
        } else {
            self.min_ms = self.min_ms.min(ms);
            self.max_ms = self.max_ms.max(ms);
        }
        self.count += 1;
        self.total_ms = self.total_ms.saturating_add(ms);
    }

    pub fn mean_ms(&self) -> Option<u64> {
        (self.count > 0).then(|| self.total_ms / self.count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
    pub timings: Vec<(&'static str, Timing)>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        lookup(&self.counters, name).unwrap_or(0)
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        lookup(&self.gauges, name)
    }
}

fn lookup<T: Copy>(entries: &[(&'static str, T)], name: &str) -> Option<T> {
    entries.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(&mut self, name: &'static str) {
        *self.counters.entry(name).or_insert(0) += 1;
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    pub fn record_timing(&mut self, name: &'static str, elapsed: Duration) {
        self.timings.entry(name).or_default().record(elapsed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (*k, *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
            timings: self.timings.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Metrics, Timing};
    use std::time::Duration;

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.incr("fetch.ok");
        m.incr("fetch.ok");
        let snap = m.snapshot();
        assert_eq!(snap.counter("fetch.ok"), 2);
        assert_eq!(snap.counter("missing"), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        m.set_gauge("scheduler.active", 1);
        m.set_gauge("scheduler.active", 0);
        assert_eq!(m.snapshot().gauge("scheduler.active"), Some(0));
        assert_eq!(m.snapshot().gauge("missing"), None);
    }

    #[test]
    fn timing_tracks_min_max_mean() {
        let mut t = Timing::default();
        assert_eq!(t.mean_ms(), None);
        t.record(Duration::from_millis(30));
        t.record(Duration::from_millis(10));
        t.record(Duration::from_millis(20));
        assert_eq!((t.count, t.min_ms, t.max_ms), (3, 10, 30));
        assert_eq!(t.mean_ms(), Some(20));
    }

    #[test]
    fn snapshot_is_stably_sorted() {
        let mut m = Metrics::new();
        m.incr("b");
        m.incr("a");
        m.record_timing("t", Duration::from_millis(1));
        let snap = m.snapshot();
        assert_eq!(snap.counters, vec![("a", 1), ("b", 1)]);
        assert_eq!(snap.timings.len(), 1);
    }
}
