//! Counting semaphore with unbounded and capacity-bounded modes
//!
//! The semaphore is the foundation of every other structure in this crate.
//! It keeps a counter guarded by a mutex and two condition variables: one
//! parks callers of [`Semaphore::wait`] while the count is zero, the other
//! parks callers of [`Semaphore::signal`] while a bounded count is at its
//! maximum.
//!
//! The non-blocking variants never overtake a blocking caller that is already
//! parked on the same boundary. A `try_wait` only succeeds if there is a unit
//! left over after every parked `wait` has been served, and a `try_signal`
//! only succeeds if there is room left over after every parked `signal`.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct State {
    /// Current count
    value: usize,

    /// Blocking waits parked at zero
    parked_waits: usize,

    /// Blocking signals parked at the maximum
    parked_signals: usize,
}

/// A counting semaphore
///
/// Constructed either unbounded ([`Semaphore::new`], [`Semaphore::unbounded`])
/// or bounded ([`Semaphore::bounded`]). In unbounded mode the maximum is
/// `usize::MAX` and `signal` never blocks in practice.
///
/// # Example
///
/// ```
/// use sumi_frontier::sync::Semaphore;
///
/// let sem = Semaphore::bounded(0, 2);
/// assert!(sem.try_signal());
/// assert!(sem.try_signal());
/// assert!(!sem.try_signal());
///
/// sem.wait();
/// assert_eq!(sem.value(), 1);
/// ```
#[derive(Debug)]
pub struct Semaphore {
    max_value: usize,
    bounded: bool,
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
}

impl Semaphore {
    /// Creates an unbounded semaphore starting at zero
    pub fn new() -> Self {
        Self::unbounded(0)
    }

    /// Creates an unbounded semaphore with the given initial count
    pub fn unbounded(initial: usize) -> Self {
        Self::build(initial, usize::MAX, false)
    }

    /// Creates a bounded semaphore
    ///
    /// # Panics
    ///
    /// Panics if `max_value` is zero or `initial` exceeds `max_value`.
    pub fn bounded(initial: usize, max_value: usize) -> Self {
        assert!(max_value > 0, "semaphore max_value must be greater than 0");
        assert!(
            initial <= max_value,
            "semaphore initial value {} exceeds max_value {}",
            initial,
            max_value
        );
        Self::build(initial, max_value, true)
    }

    fn build(initial: usize, max_value: usize, bounded: bool) -> Self {
        Self {
            max_value,
            bounded,
            state: Mutex::new(State {
                value: initial,
                parked_waits: 0,
                parked_signals: 0,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    // The counter stays consistent even if a holder panicked, so poisoning
    // is ignored.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Increments the count, waking one blocked `wait`
    ///
    /// In bounded mode this blocks while the count is at the maximum.
    pub fn signal(&self) {
        let mut state = self.lock();
        while state.value == self.max_value {
            state.parked_signals += 1;
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.parked_signals -= 1;
        }
        state.value += 1;
        self.not_empty.notify_one();
    }

    /// Decrements the count, blocking while it is zero
    pub fn wait(&self) {
        let mut state = self.lock();
        while state.value == 0 {
            state.parked_waits += 1;
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            state.parked_waits -= 1;
        }
        state.value -= 1;
        if self.bounded {
            self.not_full.notify_one();
        }
    }

    /// Tries to decrement the count without blocking
    ///
    /// Returns `false` when the count is zero or when every available unit is
    /// already claimed by a parked `wait`.
    pub fn try_wait(&self) -> bool {
        let mut state = self.lock();
        if state.value <= state.parked_waits {
            return false;
        }
        state.value -= 1;
        if self.bounded {
            self.not_full.notify_one();
        }
        true
    }

    /// Tries to increment the count without blocking
    ///
    /// Returns `false` when the count is at the maximum or when the remaining
    /// room is already claimed by a parked `signal`.
    pub fn try_signal(&self) -> bool {
        let mut state = self.lock();
        if self.max_value - state.value <= state.parked_signals {
            return false;
        }
        state.value += 1;
        self.not_empty.notify_one();
        true
    }

    /// Returns a snapshot of the current count
    pub fn value(&self) -> usize {
        self.lock().value
    }

    /// Returns the maximum count (`usize::MAX` when unbounded)
    pub fn max_value(&self) -> usize {
        self.max_value
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    /// Spins until `count` blocking waits are parked on `sem`
    fn wait_for_parked_waits(sem: &Semaphore, count: usize) {
        while sem.lock().parked_waits < count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_for_parked_signals(sem: &Semaphore, count: usize) {
        while sem.lock().parked_signals < count {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_try_wait() {
        let sem = Semaphore::new();
        assert!(!sem.try_wait());

        sem.signal();
        assert!(sem.try_wait());
        assert!(!sem.try_wait());

        sem.signal();
        sem.signal();
        assert!(sem.try_wait());
        assert!(sem.try_wait());
        assert!(!sem.try_wait());
    }

    #[test]
    fn test_initial_value() {
        let sem = Semaphore::unbounded(3);
        assert_eq!(sem.value(), 3);
        assert!(!sem.is_bounded());
        assert_eq!(sem.max_value(), usize::MAX);

        sem.wait();
        sem.wait();
        sem.wait();
        assert!(!sem.try_wait());
    }

    #[test]
    fn test_unbounded_try_signal_always_succeeds() {
        let sem = Semaphore::new();
        for _ in 0..1000 {
            assert!(sem.try_signal());
        }
        assert_eq!(sem.value(), 1000);
    }

    #[test]
    fn test_bounded_try_signal_at_max() {
        let sem = Semaphore::bounded(0, 3);
        assert!(sem.try_signal());
        assert!(sem.try_signal());
        assert!(sem.try_signal());
        assert!(!sem.try_signal());

        assert!(sem.try_wait());
        assert!(sem.try_signal());
        assert!(!sem.try_signal());
        assert_eq!(sem.value(), 3);
    }

    #[test]
    fn test_bounded_initial_at_max() {
        let sem = Semaphore::bounded(2, 2);
        assert!(!sem.try_signal());
        sem.wait();
        assert!(sem.try_signal());
    }

    #[test]
    #[should_panic(expected = "exceeds max_value")]
    fn test_initial_above_max_panics() {
        let _ = Semaphore::bounded(5, 4);
    }

    #[test]
    #[should_panic(expected = "greater than 0")]
    fn test_zero_max_panics() {
        let _ = Semaphore::bounded(0, 0);
    }

    #[test]
    fn test_wait_blocks_until_signal() {
        let sem = Arc::new(Semaphore::new());
        let done = Arc::new(AtomicBool::new(false));

        let handle = {
            let sem = Arc::clone(&sem);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                sem.wait();
                done.store(true, Ordering::SeqCst);
            })
        };

        wait_for_parked_waits(&sem, 1);
        assert!(!done.load(Ordering::SeqCst));

        sem.signal();
        handle.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(sem.value(), 0);
    }

    // A wait with no matching signal is a permanent block, not an error.
    #[test]
    fn test_wait_without_signal_stays_blocked() {
        let sem = Arc::new(Semaphore::new());
        let handle = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.wait())
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        // Release the thread so the test can exit.
        sem.signal();
        handle.join().unwrap();
    }

    #[test]
    fn test_bounded_signal_blocks_until_wait() {
        let sem = Arc::new(Semaphore::bounded(0, 2));
        sem.signal();
        sem.signal();

        let done = Arc::new(AtomicBool::new(false));
        let handle = {
            let sem = Arc::clone(&sem);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                sem.signal();
                done.store(true, Ordering::SeqCst);
            })
        };

        wait_for_parked_signals(&sem, 1);
        assert!(!done.load(Ordering::SeqCst));
        assert!(!sem.try_signal());

        sem.wait();
        handle.join().unwrap();
        assert!(done.load(Ordering::SeqCst));
        assert_eq!(sem.value(), 2);
    }

    #[test]
    fn test_try_wait_yields_to_parked_wait() {
        let sem = Arc::new(Semaphore::new());
        let handle = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.wait())
        };

        wait_for_parked_waits(&sem, 1);
        sem.signal();

        // The single unit belongs to the parked wait.
        assert!(!sem.try_wait());

        handle.join().unwrap();
        assert_eq!(sem.value(), 0);
    }

    #[test]
    fn test_try_signal_yields_to_parked_signal() {
        let sem = Arc::new(Semaphore::bounded(1, 1));
        let handle = {
            let sem = Arc::clone(&sem);
            thread::spawn(move || sem.signal())
        };

        wait_for_parked_signals(&sem, 1);
        sem.wait();

        // The freed slot belongs to the parked signal.
        assert!(!sem.try_signal());

        handle.join().unwrap();
        assert_eq!(sem.value(), 1);
    }

    #[test]
    fn test_rendezvous() {
        const LOOPS: usize = 2000;

        let first = Arc::new(Semaphore::new());
        let second = Arc::new(Semaphore::new());
        let log = Arc::new(Mutex::new(Vec::with_capacity(LOOPS * 2)));

        let spawn = |id: u8, own: Arc<Semaphore>, other: Arc<Semaphore>| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for _ in 0..LOOPS {
                    log.lock().unwrap().push(id);
                    own.signal();
                    other.wait();
                }
            })
        };

        let a = spawn(1, Arc::clone(&first), Arc::clone(&second));
        let b = spawn(2, Arc::clone(&second), Arc::clone(&first));
        a.join().unwrap();
        b.join().unwrap();

        let log = log.lock().unwrap();
        assert_eq!(log.len(), LOOPS * 2);
        for window in log.windows(3) {
            assert!(
                !(window[0] == window[1] && window[1] == window[2]),
                "rendezvous broken: three entries from thread {} in a row",
                window[0]
            );
        }
        assert!(!first.try_wait());
        assert!(!second.try_wait());
    }

    #[test]
    fn test_many_waiters_released() {
        let sem = Arc::new(Semaphore::new());
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let sem = Arc::clone(&sem);
                thread::spawn(move || sem.wait())
            })
            .collect();

        for _ in 0..50 {
            sem.signal();
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sem.value(), 0);
    }
}
