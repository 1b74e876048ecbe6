//! Fixed-capacity FIFO ring buffer built on [`Semaphore`]
//!
//! The backing array is allocated once; `read` and `write` wrap around modulo
//! the capacity so pushes and pops never reallocate.

use super::Semaphore;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Ring<T> {
    slots: Vec<Option<T>>,
    read: usize,
    write: usize,
}

impl<T> Ring<T> {
    fn put(&mut self, elem: T) {
        let capacity = self.slots.len();
        self.slots[self.write] = Some(elem);
        self.write = (self.write + 1) % capacity;
    }

    fn take(&mut self) -> Option<T> {
        let capacity = self.slots.len();
        let elem = self.slots[self.read].take()?;
        self.read = (self.read + 1) % capacity;
        Some(elem)
    }
}

/// A thread-safe bounded FIFO queue
///
/// # Example
///
/// ```
/// use sumi_frontier::sync::CyclicQueue;
///
/// let queue = CyclicQueue::new(2);
/// assert!(queue.try_push("a").is_ok());
/// assert!(queue.try_push("b").is_ok());
/// assert_eq!(queue.try_push("c"), Err("c"));
/// assert_eq!(queue.pop(), "a");
/// assert!(queue.try_push("c").is_ok());
/// assert_eq!(queue.try_pop(), Some("b"));
/// assert_eq!(queue.try_pop(), Some("c"));
/// ```
#[derive(Debug)]
pub struct CyclicQueue<T> {
    ring: Mutex<Ring<T>>,
    capacity: usize,
    filled: Semaphore,
    empty: Semaphore,
}

impl<T> CyclicQueue<T> {
    /// Creates a queue holding at most `capacity` elements
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cyclic queue capacity must be greater than 0");
        Self {
            ring: Mutex::new(Ring {
                slots: (0..capacity).map(|_| None).collect(),
                read: 0,
                write: 0,
            }),
            capacity,
            filled: Semaphore::new(),
            empty: Semaphore::bounded(capacity, capacity),
        }
    }

    fn ring(&self) -> MutexGuard<'_, Ring<T>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends an element, blocking while the queue is full
    pub fn push(&self, elem: T) {
        self.empty.wait();
        self.ring().put(elem);
        self.filled.signal();
    }

    /// Appends an element without blocking
    ///
    /// Hands the element back when the queue is full.
    pub fn try_push(&self, elem: T) -> Result<(), T> {
        if !self.empty.try_wait() {
            return Err(elem);
        }
        self.ring().put(elem);
        self.filled.signal();
        Ok(())
    }

    /// Removes the oldest element, blocking while the queue is empty
    pub fn pop(&self) -> T {
        self.filled.wait();
        self.take_front()
    }

    /// Removes the oldest element without blocking
    pub fn try_pop(&self) -> Option<T> {
        if !self.filled.try_wait() {
            return None;
        }
        Some(self.take_front())
    }

    fn take_front(&self) -> T {
        let elem = self
            .ring()
            .take()
            .expect("filled semaphore counted an element that is not in the ring");
        self.empty.signal();
        elem
    }

    /// Number of elements currently queued
    pub fn len(&self) -> usize {
        self.filled.value()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
