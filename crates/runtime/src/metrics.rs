use std::collections::BTreeMap;

/// Session counters.
///
/// Keyed by an enum rather than free-form strings so every counter the
/// engine bumps is listed here; snapshots iterate in declaration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Counter {
    LocationFetchIssued,
    SuggestionFetchIssued,
    MovieFetchIssued,
    CityFetchIssued,
    StaleDiscarded,
    FetchFailed,
    StoreReset,
    UnknownReference,
    TeardownIgnored,
    SelectionDeferred,
    SelectionApplied,
    SelectionSuperseded,
}

impl Counter {
    pub fn name(self) -> &'static str {
        match self {
            Counter::LocationFetchIssued => "fetch.locations.issued",
            Counter::SuggestionFetchIssued => "fetch.suggestions.issued",
            Counter::MovieFetchIssued => "fetch.movie.issued",
            Counter::CityFetchIssued => "fetch.cities.issued",
            Counter::StaleDiscarded => "fetch.stale_discarded",
            Counter::FetchFailed => "fetch.failed",
            Counter::StoreReset => "store.reset",
            Counter::UnknownReference => "highlight.unknown_reference",
            Counter::TeardownIgnored => "session.teardown_ignored",
            Counter::SelectionDeferred => "selection.deferred",
            Counter::SelectionApplied => "selection.applied",
            Counter::SelectionSuperseded => "selection.superseded",
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metrics {
    counters: BTreeMap<Counter, u64>,
    gauges: BTreeMap<&'static str, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(&'static str, u64)>,
    pub gauges: Vec<(&'static str, i64)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
        self.gauges.clear();
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        self.counters.get(&counter).copied().unwrap_or(0)
    }

    pub fn inc(&mut self, counter: Counter) {
        self.inc_by(counter, 1);
    }

    pub fn inc_by(&mut self, counter: Counter, by: u64) {
        *self.counters.entry(counter).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &'static str, value: i64) {
        self.gauges.insert(name, value);
    }

    /// Returns a stable snapshot suitable for logs/debug UI.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.name(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Counter, Metrics};
    use pretty_assertions::assert_eq;

    #[test]
    fn counters_accumulate() {
        let mut m = Metrics::new();
        m.inc(Counter::StaleDiscarded);
        m.inc_by(Counter::StaleDiscarded, 2);
        assert_eq!(m.counter(Counter::StaleDiscarded), 3);
        assert_eq!(m.counter(Counter::FetchFailed), 0);
    }

    #[test]
    fn gauges_overwrite() {
        let mut m = Metrics::new();
        assert_eq!(m.gauge("store.entities"), None);
        m.set_gauge("store.entities", 10);
        m.set_gauge("store.entities", 11);
        assert_eq!(m.gauge("store.entities"), Some(11));
    }

    #[test]
    fn snapshot_is_stably_ordered() {
        let mut m = Metrics::new();
        m.inc(Counter::StoreReset);
        m.inc(Counter::LocationFetchIssued);
        m.set_gauge("z", 1);
        m.set_gauge("a", 2);

        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![("fetch.locations.issued", 1), ("store.reset", 1)]
        );
        assert_eq!(snap.gauges, vec![("a", 2), ("z", 1)]);
    }
}
