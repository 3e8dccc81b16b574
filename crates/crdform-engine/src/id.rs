//! Synthetic identifiers for rendered manifests
//!
//! The identifier only has to be unique within one state lifetime. It is
//! produced by an injected generator so that renders stay testable.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Source of synthetic identifiers
pub trait IdGenerator: Send + Sync {
    /// Allocate the next identifier
    fn next_id(&self) -> String;
}

/// Wall-clock nanoseconds since the Unix epoch
///
/// Identifiers are strictly increasing within one generator even when the
/// clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct ClockIdGenerator {
    last: AtomicI64,
}

impl ClockIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ClockIdGenerator {
    fn next_id(&self) -> String {
        // timestamp_nanos_opt is None after the year 2262
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let advance = |prev: i64| now.max(prev.saturating_add(1));

        let prev = match self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| Some(advance(prev)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        advance(prev).to_string()
    }
}

/// Counter for reproducible output
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        self.next.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_clock_ids_are_numeric_and_increasing() {
        let ids = ClockIdGenerator::new();
        let mut prev: i64 = 0;

        for _ in 0..1000 {
            let id: i64 = ids.next_id().parse().unwrap();
            assert!(id > prev, "{} not greater than {}", id, prev);
            prev = id;
        }
    }

    #[test]
    fn test_clock_ids_unique_across_threads() {
        let ids = Arc::new(ClockIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id");
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::new(41);
        assert_eq!(ids.next_id(), "41");
        assert_eq!(ids.next_id(), "42");
        assert_eq!(SequentialIdGenerator::default().next_id(), "1");
    }
}
