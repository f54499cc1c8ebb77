//! Process-wide request identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of response ids: a shared counter bumped once per request.
///
/// Every connection task holds a clone of the same `Arc<RequestIds>`, so
/// ids are unique and strictly increasing across all ports and
/// connections for the life of the process.
#[derive(Debug, Default)]
pub struct RequestIds {
    counter: AtomicU64,
}

impl RequestIds {
    /// Create a generator; the first id issued is 1.
    pub fn new() -> Self {
        RequestIds {
            counter: AtomicU64::new(0),
        }
    }

    /// Take the next id.
    pub fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}
