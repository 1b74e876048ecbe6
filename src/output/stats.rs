//! Frontier statistics
//!
//! The frontier keeps a set of relaxed atomic counters while it runs; a
//! [`FrontierStatistics`] value is a point-in-time copy of them together with
//! the current queue depths.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the frontier threads and its callers
#[derive(Debug, Default)]
pub struct FrontierCounters {
    pub submitted: AtomicU64,
    pub rejected: AtomicU64,
    pub priority: AtomicU64,
    pub overflow: AtomicU64,
    pub redirected: AtomicU64,
    pub dropped: AtomicU64,
    pub dispatched: AtomicU64,
    pub requeued: AtomicU64,
}

impl FrontierCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Snapshot of frontier activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierStatistics {
    /// When the frontier threads were started
    pub started_at: DateTime<Utc>,

    /// Links handed to any input entry point
    pub submitted: u64,

    /// Links refused by the filter or the URL parser
    pub rejected: u64,

    /// Links stored in the priority queue
    pub priority: u64,

    /// Links stored in the overflow stack
    pub overflow: u64,

    /// Priority links that found the ring full and went to the stack instead
    pub redirected: u64,

    /// Links lost because both tiers were full
    pub dropped: u64,

    /// Links handed out by `get_link`
    pub dispatched: u64,

    /// Links taken for a cancelled `get_link_async` and put back
    pub requeued: u64,

    pub pending_priority: usize,
    pub pending_overflow: usize,

    /// Whitelisted hosts, including the local file pseudo-host
    pub host_count: usize,
}

impl FrontierStatistics {
    /// Builds a snapshot from live counters and queue depths
    pub fn capture(
        started_at: DateTime<Utc>,
        counters: &FrontierCounters,
        pending_priority: usize,
        pending_overflow: usize,
        host_count: usize,
    ) -> Self {
        Self {
            started_at,
            submitted: FrontierCounters::get(&counters.submitted),
            rejected: FrontierCounters::get(&counters.rejected),
            priority: FrontierCounters::get(&counters.priority),
            overflow: FrontierCounters::get(&counters.overflow),
            redirected: FrontierCounters::get(&counters.redirected),
            dropped: FrontierCounters::get(&counters.dropped),
            dispatched: FrontierCounters::get(&counters.dispatched),
            requeued: FrontierCounters::get(&counters.requeued),
            pending_priority,
            pending_overflow,
            host_count,
        }
    }

    /// Links currently stored across both tiers
    pub fn pending(&self) -> usize {
        self.pending_priority + self.pending_overflow
    }

    /// Links accepted into either tier
    ///
    /// Requeued links are counted under `requeued` only, so each link is
    /// admitted once.
    pub fn admitted(&self) -> u64 {
        self.priority + self.overflow
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &FrontierStatistics) {
    println!("=== Frontier Statistics ===\n");

    let elapsed = Utc::now() - stats.started_at;
    println!("Overview:");
    println!("  Started at: {}", stats.started_at.to_rfc3339());
    println!("  Running for: {}s", elapsed.num_seconds());
    println!("  Whitelisted hosts: {}", stats.host_count);
    println!();

    println!("Admission:");
    println!("  Submitted: {}", stats.submitted);
    println!("  Rejected: {}", stats.rejected);
    println!("  Priority queue: {}", stats.priority);
    println!(
        "  Overflow stack: {} ({} redirected from priority)",
        stats.overflow, stats.redirected
    );
    println!("  Dropped: {}", stats.dropped);
    println!();

    println!("Dispatch:");
    println!("  Dispatched: {}", stats.dispatched);
    println!("  Requeued after cancellation: {}", stats.requeued);
    println!(
        "  Pending: {} (priority {}, overflow {})",
        stats.pending(),
        stats.pending_priority,
        stats.pending_overflow
    );

    let admitted = stats.admitted();
    let dispatch_rate = if admitted > 0 {
        (stats.dispatched as f64 / admitted as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Dispatch Rate: {:.1}% ({} / {} admitted links handed out)",
        dispatch_rate, stats.dispatched, admitted
    );
}
