// ── Per-code listener registry ──

use std::sync::Arc;

use dashmap::DashMap;

/// Callback invoked after an event changes its code's timestamp.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// One listener per event code; registering again replaces the previous one.
#[derive(Default)]
pub struct ListenerTable {
    listeners: DashMap<String, Listener>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, code: impl Into<String>, listener: Listener) {
        self.listeners.insert(code.into(), listener);
    }

    /// Clone out the listener so it is called without holding a shard lock.
    pub fn get(&self, code: &str) -> Option<Listener> {
        self.listeners.get(code).map(|l| Arc::clone(l.value()))
    }
}
