//! Completion and failure accounting.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::object::ObjectId;

/// Thread-safe completion/failure tracker for one session.
///
/// `completed` advances exactly once per submitted object, by whichever path
/// finalizes it first (synchronous render failure or asynchronous write
/// completion), and never exceeds `total`. The failure set deduplicates by
/// [`ObjectId`] and is snapshottable from any thread.
#[derive(Debug)]
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    failed: Mutex<BTreeSet<ObjectId>>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            failed: Mutex::new(BTreeSet::new()),
        }
    }

    /// Finalizes one object and returns the new completed count.
    ///
    /// Saturates at `total`: the counter strictly increases and can never
    /// pass the submitted object count, even under a double-finalize bug.
    pub fn complete_one(&self) -> usize {
        let mut cur = self.completed.load(Ordering::SeqCst);
        loop {
            if cur >= self.total {
                debug_assert!(false, "completion counter would exceed total");
                return self.total;
            }
            match self.completed.compare_exchange(
                cur,
                cur + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return cur + 1,
                Err(observed) => cur = observed,
            }
        }
    }

    /// Records a failed object. Returns false if it was already recorded.
    pub fn record_failure(&self, id: ObjectId) -> bool {
        self.failed.lock().unwrap().insert(id)
    }

    /// Failure path finalizer: records the object and counts it, so no
    /// failure is ever silently dropped.
    pub fn fail_one(&self, id: ObjectId) -> usize {
        self.record_failure(id);
        self.complete_one()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> usize {
        self.failed.lock().unwrap().len()
    }

    /// Consistent snapshot of the failure set, sorted by id.
    pub fn failed_snapshot(&self) -> Vec<ObjectId> {
        self.failed.lock().unwrap().iter().cloned().collect()
    }

    /// Whether every submitted object has been finalized.
    pub fn is_done(&self) -> bool {
        self.completed() >= self.total
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.completed(), self.total)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn id(n: usize) -> ObjectId {
        ObjectId::new("test", format!("object_{n}"))
    }

    #[test]
    fn completion_counts_up_to_total() {
        let tracker = ProgressTracker::new(3);
        assert_eq!(tracker.complete_one(), 1);
        assert_eq!(tracker.complete_one(), 2);
        assert_eq!(tracker.complete_one(), 3);
        assert!(tracker.is_done());
    }

    #[test]
    fn completion_never_exceeds_total() {
        let tracker = ProgressTracker::new(1);
        tracker.complete_one();
        // A spurious extra finalize must not push past total.
        assert_eq!(tracker.complete_one(), 1);
        assert_eq!(tracker.completed(), 1);
    }

    #[test]
    fn failure_set_deduplicates() {
        let tracker = ProgressTracker::new(5);
        assert!(tracker.record_failure(id(1)));
        assert!(!tracker.record_failure(id(1)));
        assert_eq!(tracker.failed_count(), 1);
    }

    #[test]
    fn fail_one_records_and_counts() {
        let tracker = ProgressTracker::new(2);
        tracker.fail_one(id(7));
        assert_eq!(tracker.completed(), 1);
        assert_eq!(tracker.failed_snapshot(), vec![id(7)]);
    }

    #[test]
    fn snapshot_is_sorted_and_stable() {
        let tracker = ProgressTracker::new(10);
        tracker.record_failure(id(3));
        tracker.record_failure(id(1));
        tracker.record_failure(id(2));
        assert_eq!(tracker.failed_snapshot(), vec![id(1), id(2), id(3)]);
    }

    #[test]
    fn concurrent_completion_is_exact() {
        let tracker = Arc::new(ProgressTracker::new(400));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let t = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    t.complete_one();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.completed(), 400);
        assert!(tracker.is_done());
    }

    #[test]
    fn empty_session_is_immediately_done() {
        let tracker = ProgressTracker::new(0);
        assert!(tracker.is_done());
        assert_eq!(tracker.progress(), (0, 0));
    }
}
