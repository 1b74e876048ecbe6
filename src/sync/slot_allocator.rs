//! Growable slot table handing out small integer handles
//!
//! Works like a map whose keys are chosen by the table: [`SlotAllocator::push`]
//! stores a value and returns the [`SlotIndex`] it lives at. Released indices
//! go onto a free list and are reused before the table grows. The table grows
//! in chunks of [`CHUNK_SIZE`] slots up to a hard maximum, after which `push`
//! blocks until an index is released.

use super::Stack;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Number of slots added each time the table grows
pub const CHUNK_SIZE: usize = 100;

/// Handle to a live slot
///
/// Only valid between the `push` that returned it and the matching `pop`.
/// After a `pop` the handle and all copies of it should be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex(usize);

impl SlotIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Thread-safe arena of values addressed by [`SlotIndex`]
///
/// # Example
///
/// ```
/// use sumi_frontier::sync::SlotAllocator;
///
/// let hosts = SlotAllocator::new(10);
/// let handle = hosts.push("example.com".to_string());
/// assert_eq!(hosts.peek(handle).as_deref(), Some("example.com"));
/// assert_eq!(hosts.pop(handle).as_deref(), Some("example.com"));
/// assert_eq!(hosts.peek(handle), None);
/// ```
#[derive(Debug)]
pub struct SlotAllocator<T> {
    slots: Mutex<Vec<Option<T>>>,

    /// Indices that are allocated in `slots` but hold no value
    gaps: Stack<SlotIndex>,

    max_len: usize,
}

impl<T> SlotAllocator<T> {
    /// Creates a table that grows up to `max_len` slots
    ///
    /// The first chunk is allocated eagerly.
    ///
    /// # Panics
    ///
    /// Panics if `max_len` is zero.
    pub fn new(max_len: usize) -> Self {
        assert!(max_len > 0, "slot allocator max_len must be greater than 0");
        let initial = max_len.min(CHUNK_SIZE);

        let gaps = Stack::bounded(max_len);
        // Reverse order so the lowest index is handed out first.
        for index in (0..initial).rev() {
            gaps.push(SlotIndex(index));
        }

        Self {
            slots: Mutex::new((0..initial).map(|_| None).collect()),
            gaps,
            max_len,
        }
    }

    fn slots(&self) -> MutexGuard<'_, Vec<Option<T>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `elem` and returns its handle
    ///
    /// Reuses a released index when one is available, otherwise grows the
    /// table. Blocks once `max_len` slots are live until one is released.
    pub fn push(&self, elem: T) -> SlotIndex {
        if let Some(index) = self.gaps.try_pop() {
            self.store(index, elem);
            return index;
        }

        match self.grow(elem) {
            Ok(index) => index,
            Err(elem) => {
                tracing::trace!(
                    "Slot table full at {} slots, waiting for a release",
                    self.max_len
                );
                let index = self.gaps.pop();
                self.store(index, elem);
                index
            }
        }
    }

    /// Stores `elem` without blocking
    ///
    /// Returns `None` when the table is at `max_len` and no index is free.
    pub fn try_push(&self, elem: T) -> Option<SlotIndex> {
        if let Some(index) = self.gaps.try_pop() {
            self.store(index, elem);
            return Some(index);
        }

        match self.grow(elem) {
            Ok(index) => Some(index),
            // A concurrent grow may have published gaps since the first look.
            Err(elem) => {
                let index = self.gaps.try_pop()?;
                self.store(index, elem);
                Some(index)
            }
        }
    }

    fn store(&self, index: SlotIndex, elem: T) {
        self.slots()[index.0] = Some(elem);
    }

    // Adds up to one chunk of slots and stores `elem` in the first new one.
    // The remaining new indices are released as gaps while the table lock is
    // still held, so a concurrent `try_push` that sees the grown length also
    // sees the free indices. Hands `elem` back when the table is already at
    // `max_len`.
    fn grow(&self, elem: T) -> Result<SlotIndex, T> {
        let mut slots = self.slots();
        let first = slots.len();
        if first >= self.max_len {
            return Err(elem);
        }
        let added = (self.max_len - first).min(CHUNK_SIZE);
        slots.extend((0..added).map(|_| None));
        slots[first] = Some(elem);

        // Never blocks: `gaps` has room for every index below `max_len`.
        for index in (first + 1..first + added).rev() {
            self.gaps.push(SlotIndex(index));
        }
        drop(slots);

        tracing::trace!("Slot table grew from {} to {} slots", first, first + added);
        Ok(SlotIndex(first))
    }

    /// Removes and returns the value at `index`, releasing the index
    ///
    /// Returns `None` for an index that is not live; the free list is left
    /// untouched in that case.
    pub fn pop(&self, index: SlotIndex) -> Option<T> {
        let elem = self.slots().get_mut(index.0)?.take()?;
        self.gaps.push(index);
        Some(elem)
    }

    /// Number of live values
    pub fn len(&self) -> usize {
        self.slots().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots allocated so far, live or free
    pub fn allocated(&self) -> usize {
        self.slots().len()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl<T: Clone> SlotAllocator<T> {
    /// Returns a copy of the value at `index` without removing it
    pub fn peek(&self, index: SlotIndex) -> Option<T> {
        self.slots().get(index.0)?.clone()
    }
}
