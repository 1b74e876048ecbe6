//! Thread-safe LIFO stack built on [`Semaphore`]
//!
//! An unbounded stack only carries the "filled" semaphore, so `push` never
//! blocks. A bounded stack adds an "empty" semaphore counting free slots,
//! which makes `push` block (and `try_push` fail) when the stack is full.

use super::Semaphore;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A thread-safe stack with blocking and non-blocking operations
///
/// # Example
///
/// ```
/// use sumi_frontier::sync::Stack;
///
/// let stack = Stack::bounded(2);
/// stack.push(1);
/// stack.push(2);
/// assert_eq!(stack.try_push(3), Err(3));
/// assert_eq!(stack.pop(), 2);
/// assert_eq!(stack.try_pop(), Some(1));
/// assert_eq!(stack.try_pop(), None);
/// ```
#[derive(Debug)]
pub struct Stack<T> {
    items: Mutex<Vec<T>>,

    /// Number of elements on the stack
    filled: Semaphore,

    /// Free slots; `None` for an unbounded stack
    empty: Option<Semaphore>,
}

impl<T> Stack<T> {
    /// Creates an unbounded stack
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            filled: Semaphore::new(),
            empty: None,
        }
    }

    /// Creates a stack holding at most `capacity` elements
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            filled: Semaphore::new(),
            empty: Some(Semaphore::bounded(capacity, capacity)),
        }
    }

    fn items(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes an element, blocking while a bounded stack is full
    pub fn push(&self, elem: T) {
        if let Some(empty) = &self.empty {
            empty.wait();
        }
        self.items().push(elem);
        self.filled.signal();
    }

    /// Pushes an element without blocking
    ///
    /// Hands the element back when a bounded stack is full. Always succeeds
    /// on an unbounded stack.
    pub fn try_push(&self, elem: T) -> Result<(), T> {
        if let Some(empty) = &self.empty {
            if !empty.try_wait() {
                return Err(elem);
            }
        }
        self.items().push(elem);
        self.filled.signal();
        Ok(())
    }

    /// Pops the top element, blocking while the stack is empty
    pub fn pop(&self) -> T {
        self.filled.wait();
        self.take_top()
    }

    /// Pops the top element without blocking
    pub fn try_pop(&self) -> Option<T> {
        if !self.filled.try_wait() {
            return None;
        }
        Some(self.take_top())
    }

    // Caller must hold one unit of `filled`.
    fn take_top(&self) -> T {
        let elem = self
            .items()
            .pop()
            .expect("filled semaphore counted an element that is not on the stack");
        if let Some(empty) = &self.empty {
            empty.signal();
        }
        elem
    }

    /// Number of elements currently on the stack
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    /// Maximum number of elements, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.empty.as_ref().map(Semaphore::max_value)
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}
