//! Blocking concurrency primitives used by the frontier
//!
//! # Components
//!
//! - `Semaphore`: counting semaphore, unbounded or capacity-bounded
//! - `Stack`: LIFO stack, unbounded or bounded
//! - `CyclicQueue`: fixed-capacity FIFO ring buffer
//! - `SlotAllocator`: growable table handing out reusable `SlotIndex` handles
//!
//! Every structure offers a blocking and a non-blocking (`try_*`) variant of
//! each operation. Internal mutexes only guard buffer mutation and are never
//! held across a blocking semaphore call.

mod cyclic_queue;
mod semaphore;
mod slot_allocator;
mod stack;

pub use cyclic_queue::CyclicQueue;
pub use semaphore::Semaphore;
pub use slot_allocator::{SlotAllocator, SlotIndex, CHUNK_SIZE};
pub use stack::Stack;
