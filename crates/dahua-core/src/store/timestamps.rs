// ── Event "active since" table ──
//
// Code → epoch seconds the event became active, 0 when inactive.
// The dispatcher is the only writer.

use std::collections::BTreeMap;

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct EventTimestamps {
    active_since: DashMap<String, i64>,
}

impl EventTimestamps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Epoch seconds the event fired, or 0 if it is not active (or never seen).
    pub fn get(&self, code: &str) -> i64 {
        self.active_since.get(code).map_or(0, |ts| *ts)
    }

    pub(crate) fn set(&self, code: &str, timestamp: i64) {
        self.active_since.insert(code.to_owned(), timestamp);
    }

    pub(crate) fn clear(&self, code: &str) {
        self.set(code, 0);
    }

    /// Copy of every code seen so far.
    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.active_since
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_code_reads_zero() {
        let table = EventTimestamps::new();
        assert_eq!(table.get("VideoMotion"), 0);
        table.set("VideoMotion", 1_700_000_000);
        assert_eq!(table.get("VideoMotion"), 1_700_000_000);
        table.clear("VideoMotion");
        assert_eq!(table.get("VideoMotion"), 0);
        assert_eq!(table.to_map().len(), 1);
    }
}
