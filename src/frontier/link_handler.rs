//! The frontier: a two-tier work queue driven by two dedicated threads
//!
//! Links enter through [`Frontier::input_web`] and friends, pass the
//! [`Filter`], and are handed over a rendezvous channel to the input thread,
//! which stores them in the priority ring queue or the overflow stack. The
//! output thread serves one stored link per [`Frontier::get_link`] request,
//! always draining the priority tier first.
//!
//! Two semaphores coordinate the threads: `stored` counts links available
//! across both tiers and `requests` counts pending `get_link` calls.

use super::filter::{Filter, UrlCompact};
use crate::config::{Config, FrontierConfig};
use crate::output::{FrontierCounters, FrontierStatistics};
use crate::sync::{CyclicQueue, Semaphore, Stack};
use crate::url::{parse_link, resolve_link, LinkTarget, FILE_HOST};
use crate::{ConfigError, FrontierError};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;
use url::Url;

/// Where a submitted link ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Stored in the priority queue
    Priority,

    /// Stored in the overflow stack
    Overflow,

    /// Accepted by the filter but both tiers were full
    Dropped,

    /// Not whitelisted, excluded, already visited or unparsable
    Rejected,

    /// The frontier has been destroyed
    Closed,
}

impl Admission {
    /// Returns true if the link will eventually be handed out by `get_link`
    pub fn is_stored(self) -> bool {
        matches!(self, Self::Priority | Self::Overflow)
    }
}

struct LinkInput {
    priority: bool,
    requeue: bool,
    url: UrlCompact,
    placed: SyncSender<Admission>,
}

/// A link on its way to a getter, with the compact form kept for requeueing
struct Dispatch {
    link: String,
    url: UrlCompact,
}

/// State shared between the caller-facing handle and both threads
struct Shared {
    filter: Filter,
    priority: CyclicQueue<UrlCompact>,
    overflow: Stack<UrlCompact>,
    stored: Semaphore,
    requests: Semaphore,
    quit: AtomicBool,
    counters: FrontierCounters,
}

impl Shared {
    fn is_closed(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    // Requeued links were counted when first stored and are only counted
    // under `requeued`, before the link becomes visible to the output loop.
    fn place(&self, priority: bool, requeue: bool, url: UrlCompact) -> Admission {
        let url = if priority {
            match self.priority.try_push(url) {
                Ok(()) => {
                    self.count_stored(&self.counters.priority, requeue);
                    self.stored.signal();
                    return Admission::Priority;
                }
                Err(url) => {
                    tracing::debug!("Priority queue full, {} goes to overflow", url.inner_path());
                    FrontierCounters::bump(&self.counters.redirected);
                    url
                }
            }
        } else {
            url
        };

        match self.overflow.try_push(url) {
            Ok(()) => {
                self.count_stored(&self.counters.overflow, requeue);
                self.stored.signal();
                Admission::Overflow
            }
            Err(url) => {
                tracing::debug!("Overflow stack full, dropping {}", url.inner_path());
                FrontierCounters::bump(&self.counters.dropped);
                Admission::Dropped
            }
        }
    }

    fn count_stored(&self, tier: &AtomicU64, requeue: bool) {
        if requeue {
            FrontierCounters::bump(&self.counters.requeued);
        } else {
            FrontierCounters::bump(tier);
        }
    }

    // Only the output thread pops, so after `stored.wait()` one of the tiers
    // holds an element and the stack pop cannot block.
    fn take_next(&self) -> UrlCompact {
        match self.priority.try_pop() {
            Some(url) => url,
            None => self.overflow.pop(),
        }
    }
}

fn input_loop(shared: Arc<Shared>, links: Receiver<LinkInput>) {
    tracing::debug!("Frontier input loop started");

    for input in links {
        let admission = shared.place(input.priority, input.requeue, input.url);
        // The submitter may have given up waiting.
        let _ = input.placed.send(admission);
    }

    tracing::debug!("Frontier input loop stopped");
}

fn output_loop(shared: Arc<Shared>, links: SyncSender<Dispatch>) {
    tracing::debug!("Frontier output loop started");

    loop {
        shared.requests.wait();
        if shared.is_closed() {
            break;
        }

        shared.stored.wait();
        if shared.is_closed() {
            break;
        }

        let url = shared.take_next();
        let Some(link) = shared.filter.expand(&url) else {
            tracing::warn!(
                "Host {} of queued path {} is no longer interned, skipping",
                url.host(),
                url.inner_path()
            );
            // The request is still waiting for a link.
            shared.requests.signal();
            continue;
        };

        tracing::trace!("Dispatching {}", link);
        if links.send(Dispatch { link, url }).is_err() {
            break;
        }
    }

    tracing::debug!("Frontier output loop stopped");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The crawl frontier
///
/// Created once per crawl session. Every method takes `&self`, so a frontier
/// is usually shared between fetch workers behind an [`Arc`].
///
/// # Example
///
/// ```
/// use sumi_frontier::{Admission, Frontier};
///
/// let frontier = Frontier::default();
/// frontier.whitelist("example.com", true);
///
/// assert_eq!(frontier.input_web("example.com", "/a", false), Admission::Overflow);
/// assert_eq!(frontier.input_web("example.com", "/b", true), Admission::Priority);
/// assert_eq!(frontier.input_web("example.com", "/b", true), Admission::Rejected);
///
/// assert_eq!(frontier.get_link().as_deref(), Some("https://example.com/b"));
/// assert_eq!(frontier.get_link().as_deref(), Some("https://example.com/a"));
/// frontier.destroy();
/// assert_eq!(frontier.get_link(), None);
/// ```
pub struct Frontier {
    shared: Arc<Shared>,

    /// Taken by `destroy` to close the input channel
    links_in: Mutex<Option<SyncSender<LinkInput>>>,

    /// std receivers are single-consumer, so concurrent getters queue here
    links_out: Mutex<Receiver<Dispatch>>,

    input_worker: Mutex<Option<JoinHandle<()>>>,
    output_worker: Mutex<Option<JoinHandle<()>>>,

    local_files: bool,
    started_at: DateTime<Utc>,
}

impl Frontier {
    /// Builds a frontier and starts its input and output threads
    ///
    /// The `file://` pseudo-host is whitelisted unconditionally; it does not
    /// count against `host_capacity`.
    ///
    /// # Arguments
    ///
    /// * `config` - Tier capacities, host table size and crawl mode
    ///
    /// # Returns
    ///
    /// * `Ok(Frontier)` - Both threads are running
    /// * `Err(FrontierError)` - A thread could not be spawned
    ///
    /// # Panics
    ///
    /// Panics if either tier capacity is zero.
    pub fn new(config: &FrontierConfig) -> crate::Result<Self> {
        let filter = Filter::new(config.host_capacity.saturating_add(1));
        filter.whitelist(FILE_HOST, false);

        let shared = Arc::new(Shared {
            filter,
            priority: CyclicQueue::new(config.priority_capacity),
            overflow: Stack::bounded(config.overflow_capacity),
            stored: Semaphore::new(),
            requests: Semaphore::new(),
            quit: AtomicBool::new(false),
            counters: FrontierCounters::default(),
        });

        let (links_in, input_rx) = mpsc::sync_channel(0);
        let (output_tx, links_out) = mpsc::sync_channel(0);

        let input_worker = thread::Builder::new()
            .name("frontier-input".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || input_loop(shared, input_rx)
            })?;

        let output_worker = match thread::Builder::new()
            .name("frontier-output".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || output_loop(shared, output_tx)
            }) {
            Ok(handle) => handle,
            Err(e) => {
                drop(links_in);
                let _ = input_worker.join();
                return Err(e.into());
            }
        };

        tracing::info!(
            "Frontier started (priority {}, overflow {}, hosts {})",
            config.priority_capacity,
            config.overflow_capacity,
            config.host_capacity
        );

        Ok(Self {
            shared,
            links_in: Mutex::new(Some(links_in)),
            links_out: Mutex::new(links_out),
            input_worker: Mutex::new(Some(input_worker)),
            output_worker: Mutex::new(Some(output_worker)),
            local_files: config.local_files,
            started_at: Utc::now(),
        })
    }

    /// Builds a frontier with every configured host whitelisted
    ///
    /// Exclusion patterns are attached to their hosts. Seeds are not
    /// submitted; see [`Frontier::seed`].
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let frontier = Self::new(&config.frontier)?;

        for entry in &config.whitelist {
            if !frontier.whitelist(&entry.host, true) {
                return Err(ConfigError::Validation(format!(
                    "Host table full, cannot whitelist '{}'",
                    entry.host
                ))
                .into());
            }

            for pattern in &entry.exclude {
                let regex = Regex::new(pattern).map_err(|source| FrontierError::Pattern {
                    host: entry.host.clone(),
                    source,
                })?;
                frontier.exclude(&entry.host, &regex);
            }
        }

        Ok(frontier)
    }

    /// Submits every configured seed as a priority link
    ///
    /// Local seeds go first, then the seeds of each whitelist entry in file
    /// order. Returns each seed with its admission.
    pub fn seed(&self, config: &Config) -> Vec<(String, Admission)> {
        config
            .frontier
            .local_seeds
            .iter()
            .chain(config.whitelist.iter().flat_map(|entry| &entry.seeds))
            .map(|seed| (seed.clone(), self.request_visit(seed)))
            .collect()
    }

    /// Allows URLs of `host` into the frontier
    pub fn whitelist(&self, host: &str, is_web: bool) -> bool {
        self.shared.filter.whitelist(host, is_web)
    }

    /// Rejects future links of `host` whose inner path matches `pattern`
    pub fn exclude(&self, host: &str, pattern: &Regex) -> bool {
        self.shared.filter.exclude(host, pattern)
    }

    /// The dedup filter, for inspection
    pub fn filter(&self) -> &Filter {
        &self.shared.filter
    }

    /// Submits a local file by absolute path
    pub fn input_local_file(&self, path: &str, priority: bool) -> Admission {
        self.submit(FILE_HOST, path, priority)
    }

    /// Submits a web link split into host and inner path
    ///
    /// Returns once the link has been stored, dropped or rejected.
    pub fn input_web(&self, host: &str, inner_path: &str, priority: bool) -> Admission {
        self.submit(host, inner_path, priority)
    }

    /// Submits an absolute link as a priority link
    ///
    /// This is the entry point for seeds and for links the fetch engine wants
    /// crawled ahead of everything discovered so far.
    pub fn request_visit(&self, link: &str) -> Admission {
        if self.shared.is_closed() {
            return Admission::Closed;
        }
        match parse_link(link) {
            Ok(target) => self.submit_target(target, true),
            Err(e) => self.reject(link, &e.to_string()),
        }
    }

    /// Submits a link found on the page at `base`
    ///
    /// Relative links are resolved against `base`. Links are only followed
    /// within the same mode: a web page cannot lead to a local file and a
    /// local file cannot lead to the web.
    pub fn discovered_link(&self, base: &str, href: &str) -> Admission {
        if self.shared.is_closed() {
            return Admission::Closed;
        }

        let base = match Url::parse(base) {
            Ok(base) => base,
            Err(e) => return self.reject(href, &format!("invalid base URL: {}", e)),
        };
        let target = match resolve_link(&base, href) {
            Ok(target) => target,
            Err(e) => return self.reject(href, &e.to_string()),
        };

        let base_is_web = base.scheme() != "file";
        if target.is_web() != base_is_web {
            return self.reject(href, "link leaves the crawl mode of its page");
        }

        self.submit_target(target, false)
    }

    fn submit_target(&self, target: LinkTarget, priority: bool) -> Admission {
        match target {
            LinkTarget::Web { host, inner_path } => self.submit(&host, &inner_path, priority),
            LinkTarget::LocalFile { path } if self.local_files => {
                self.submit(FILE_HOST, &path, priority)
            }
            LinkTarget::LocalFile { path } => self.reject(&path, "local files are disabled"),
        }
    }

    fn reject(&self, link: &str, reason: &str) -> Admission {
        tracing::debug!("Rejecting {}: {}", link, reason);
        FrontierCounters::bump(&self.shared.counters.submitted);
        FrontierCounters::bump(&self.shared.counters.rejected);
        Admission::Rejected
    }

    fn submit(&self, host: &str, inner_path: &str, priority: bool) -> Admission {
        if self.shared.is_closed() {
            return Admission::Closed;
        }
        FrontierCounters::bump(&self.shared.counters.submitted);

        let Some(url) = self.shared.filter.compact(host, inner_path) else {
            FrontierCounters::bump(&self.shared.counters.rejected);
            return Admission::Rejected;
        };

        self.enqueue(priority, false, url)
    }

    // Hands an already compacted URL to the input thread and waits for its
    // placement.
    fn enqueue(&self, priority: bool, requeue: bool, url: UrlCompact) -> Admission {
        // Clone so the lock is not held across the rendezvous.
        let Some(links) = lock(&self.links_in).clone() else {
            return Admission::Closed;
        };

        let (placed, placement) = mpsc::sync_channel(1);
        if links
            .send(LinkInput {
                priority,
                requeue,
                url,
                placed,
            })
            .is_err()
        {
            return Admission::Closed;
        }
        placement.recv().unwrap_or(Admission::Closed)
    }

    /// Returns the next link to fetch, blocking until one is stored
    ///
    /// Returns `None` once the frontier is destroyed, including for a call
    /// that is blocked when `destroy` runs.
    pub fn get_link(&self) -> Option<String> {
        let dispatch = self.next_dispatch()?;
        FrontierCounters::bump(&self.shared.counters.dispatched);
        Some(dispatch.link)
    }

    fn next_dispatch(&self) -> Option<Dispatch> {
        if self.shared.is_closed() {
            return None;
        }
        let links = lock(&self.links_out);
        self.shared.requests.signal();
        links.recv().ok()
    }

    /// Async flavor of [`Frontier::get_link`] for fetch engines on tokio
    ///
    /// The blocking wait runs on tokio's blocking thread pool. Dropping the
    /// returned future before it resolves (a timeout, a lost `select!` arm)
    /// does not lose a link: one that was already taken for this call goes
    /// back into the priority tier.
    pub async fn get_link_async(self: &Arc<Self>) -> Option<String> {
        let (delivered, delivery) = oneshot::channel();

        let frontier = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let Some(dispatch) = frontier.next_dispatch() else {
                return;
            };
            if let Err(dispatch) = delivered.send(dispatch) {
                frontier.requeue(dispatch);
            }
        });

        let mut pending = PendingDispatch {
            frontier: Arc::clone(self),
            delivery,
        };
        let dispatch = (&mut pending.delivery).await.ok()?;
        FrontierCounters::bump(&self.shared.counters.dispatched);
        Some(dispatch.link)
    }

    // Puts a dispatched link nobody received back in front of the queue.
    // It bypasses the filter, which already marked it visited.
    fn requeue(&self, dispatch: Dispatch) {
        let admission = self.enqueue(true, true, dispatch.url);
        tracing::debug!("Requeued undelivered link {} -> {:?}", dispatch.link, admission);
    }

    /// Snapshot of the frontier's counters and queue depths
    pub fn statistics(&self) -> FrontierStatistics {
        FrontierStatistics::capture(
            self.started_at,
            &self.shared.counters,
            self.shared.priority.len(),
            self.shared.overflow.len(),
            self.shared.filter.host_count(),
        )
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Stops both threads
    ///
    /// Links still queued are discarded. Safe to call more than once; also
    /// runs when the frontier is dropped.
    pub fn destroy(&self) {
        if self.shared.quit.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("Shutting down frontier");

        drop(lock(&self.links_in).take());
        if let Some(worker) = lock(&self.input_worker).take() {
            if worker.join().is_err() {
                tracing::error!("Frontier input loop panicked");
            }
        }

        // Wake the output loop wherever it is parked so it sees `quit`.
        self.shared.requests.signal();
        self.shared.stored.signal();
        if let Some(worker) = lock(&self.output_worker).take() {
            if worker.join().is_err() {
                tracing::error!("Frontier output loop panicked");
            }
        }

        tracing::info!(
            "Frontier stopped with {} links undispatched",
            self.shared.priority.len() + self.shared.overflow.len()
        );
    }
}

/// Receiving end of one `get_link_async` call
///
/// If the call is cancelled after the blocking task sent its link but before
/// the future observed it, the link is requeued on drop.
struct PendingDispatch {
    frontier: Arc<Frontier>,
    delivery: oneshot::Receiver<Dispatch>,
}

impl Drop for PendingDispatch {
    fn drop(&mut self) {
        self.delivery.close();
        if let Ok(dispatch) = self.delivery.try_recv() {
            self.frontier.requeue(dispatch);
        }
    }
}

impl Default for Frontier {
    /// A frontier with the default capacities
    ///
    /// # Panics
    ///
    /// Panics if the frontier threads cannot be spawned, like
    /// [`std::thread::spawn`].
    fn default() -> Self {
        Self::new(&FrontierConfig::default()).expect("failed to spawn frontier threads")
    }
}

impl Drop for Frontier {
    fn drop(&mut self) {
        self.destroy();
    }
}
