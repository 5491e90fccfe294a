//! A dynamic, concurrently-readable set of sequences used both as the
//! gating set a sequencer must not lap and as the dependent-sequence set a
//! [`crate::sequence_barrier::SequenceBarrier`] waits on.
//!
//! Added to and removed from rarely (processor start-up/shutdown), read on
//! every producer claim, so reads must never block. Backed by
//! [`arc_swap::ArcSwap`] rather than a hand-rolled `AtomicPtr` COW: a
//! hand-rolled version has to free the old backing vector itself, and
//! nothing short of hazard pointers or epochs can prove no concurrent
//! reader is still mid-dereference of that pointer when the free runs.
//! `ArcSwap` reference-counts the old value instead of freeing it
//! eagerly, so a reader holding a snapshot keeps it alive for as long as
//! it needs it.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::sequence::Sequence;

/// A concurrent, copy-on-write bag of [`Sequence`] handles.
///
/// Readers (producers checking gating bounds) never block. Writers (`add`/
/// `remove`) build a new backing vector and swap it in with a compare-and-
/// swap loop, so concurrent adds/removes retry rather than corrupt each
/// other.
pub struct SequenceGroup {
    sequences: ArcSwap<Vec<Arc<Sequence>>>,
}

impl SequenceGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self {
            sequences: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Add a sequence to the group.
    ///
    /// Compare-and-swap loop: snapshot the currently installed vector,
    /// build the next one from its contents, then swap it in only if no
    /// other writer raced ahead of us. Losing the race means our snapshot
    /// is stale, so we rebuild from the new value and retry.
    pub fn add(&self, sequence: Arc<Sequence>) {
        loop {
            let current = self.sequences.load();
            let mut next = (**current).clone();
            next.push(sequence.clone());
            let previous = self.sequences.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return;
            }
        }
    }

    /// Remove the first sequence pointer-equal to `sequence`.
    ///
    /// Returns `true` if an entry was removed.
    pub fn remove(&self, sequence: &Arc<Sequence>) -> bool {
        let target = Arc::as_ptr(sequence);
        loop {
            let current = self.sequences.load();
            if !current.iter().any(|s| Arc::as_ptr(s) == target) {
                return false;
            }
            let next: Vec<Arc<Sequence>> = current.iter().filter(|s| Arc::as_ptr(s) != target).cloned().collect();
            let previous = self.sequences.compare_and_swap(&current, Arc::new(next));
            if Arc::ptr_eq(&previous, &current) {
                return true;
            }
        }
    }

    /// Number of sequences currently in the group.
    pub fn count(&self) -> usize {
        self.sequences.load().len()
    }

    /// Minimum value among contained sequences, or `i64::MAX` if empty.
    pub fn get(&self) -> i64 {
        self.sequences.load().iter().map(|s| s.get()).min().unwrap_or(i64::MAX)
    }

    /// Broadcast-write `value` to every contained sequence.
    pub fn set(&self, value: i64) {
        for s in self.sequences.load().iter() {
            s.set(value);
        }
    }

    /// Snapshot the contained sequences.
    pub fn snapshot(&self) -> Vec<Arc<Sequence>> {
        (**self.sequences.load()).clone()
    }
}

impl Default for SequenceGroup {
    fn default() -> Self {
        Self::new()
    }
}
