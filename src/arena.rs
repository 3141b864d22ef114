//! The record arena: a flat, append-only buffer backing every block's
//! records.
//!
//! Records are appended within a block and never removed individually; the
//! whole arena is wiped at once when [`RecordArena::near_capacity`] says the
//! next block might not fit. Block descriptors reference arena contents by
//! `(start, end)` index pair rather than by raw pointer, so growth never
//! invalidates a live descriptor — the index stays meaningful regardless of
//! where the backing allocation lives. Capacity is reserved up front and
//! never knowingly exceeded, so in practice the backing `Vec` never
//! reallocates between clears.

use crate::error::BuildError;
use crate::record::Record;

#[derive(Debug)]
pub struct RecordArena {
    records: Vec<Record>,
    capacity: usize,
    safety_margin: usize,
}

impl RecordArena {
    pub fn new(capacity: usize, safety_margin: usize) -> Result<Self, BuildError> {
        if capacity == 0 {
            return Err(BuildError::ZeroCapacity);
        }
        if safety_margin >= capacity {
            return Err(BuildError::MarginExceedsCapacity);
        }
        Ok(Self { records: Vec::with_capacity(capacity), capacity, safety_margin })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once fewer than `safety_margin` records remain before capacity —
    /// the builder must clear (arena + block cache, together) before
    /// starting a new block once this is true.
    pub fn near_capacity(&self) -> bool {
        self.records.len() + self.safety_margin >= self.capacity
    }

    pub fn push(&mut self, record: Record) -> usize {
        let idx = self.records.len();
        self.records.push(record);
        idx
    }

    pub fn slice(&self, start: usize, end: usize) -> &[Record] {
        &self.records[start..end]
    }

    pub fn clear(&mut self) {
        self.records.clear();
        log::trace!("record arena cleared (capacity {})", self.capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::return_;

    #[test]
    fn rejects_zero_capacity() {
        assert_eq!(RecordArena::new(0, 0).unwrap_err(), BuildError::ZeroCapacity);
    }

    #[test]
    fn rejects_margin_at_or_above_capacity() {
        assert_eq!(RecordArena::new(10, 10).unwrap_err(), BuildError::MarginExceedsCapacity);
        assert_eq!(RecordArena::new(10, 20).unwrap_err(), BuildError::MarginExceedsCapacity);
    }

    #[test]
    fn push_returns_stable_index_across_growth() {
        let mut arena = RecordArena::new(8, 2).unwrap();
        let first = arena.push(Record::new(return_, 0));
        for _ in 0..4 {
            arena.push(Record::new(return_, 0));
        }
        assert_eq!(first, 0);
        assert_eq!(arena.len(), 5);
    }

    #[test]
    fn near_capacity_trips_within_margin() {
        let mut arena = RecordArena::new(4, 2).unwrap();
        assert!(!arena.near_capacity());
        arena.push(Record::new(return_, 0));
        arena.push(Record::new(return_, 0));
        assert!(arena.near_capacity());
    }

    #[test]
    fn clear_empties_the_arena() {
        let mut arena = RecordArena::new(4, 1).unwrap();
        arena.push(Record::new(return_, 0));
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.len(), 0);
    }
}
