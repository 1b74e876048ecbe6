//! Integration tests for the frontier
//!
//! These tests drive a running frontier from several threads (and from tokio
//! tasks) the way a fetch engine would.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use sumi_frontier::config::{load_config, FrontierConfig};
use sumi_frontier::{Admission, Frontier};
use tempfile::NamedTempFile;

fn web_frontier(priority_capacity: usize, overflow_capacity: usize) -> Arc<Frontier> {
    let frontier = Frontier::new(&FrontierConfig {
        priority_capacity,
        overflow_capacity,
        ..FrontierConfig::default()
    })
    .expect("Failed to start frontier");
    assert!(frontier.whitelist("example.com", true));
    Arc::new(frontier)
}

#[test]
fn test_priority_link_overtakes_normal_link() {
    let frontier = web_frontier(100, 1_000);

    assert_eq!(frontier.input_web("example.com", "/a", false), Admission::Overflow);
    assert_eq!(frontier.input_web("example.com", "/b", true), Admission::Priority);

    assert_eq!(frontier.get_link().as_deref(), Some("https://example.com/b"));
    assert_eq!(frontier.get_link().as_deref(), Some("https://example.com/a"));

    // A third request parks until destroy releases it.
    let third = {
        let frontier = Arc::clone(&frontier);
        thread::spawn(move || frontier.get_link())
    };
    thread::sleep(Duration::from_millis(100));
    assert!(!third.is_finished(), "get_link should block on an empty frontier");

    frontier.destroy();
    assert_eq!(third.join().unwrap(), None);
}

#[test]
fn test_blocked_getter_receives_later_submission() {
    let frontier = web_frontier(100, 1_000);

    let getter = {
        let frontier = Arc::clone(&frontier);
        thread::spawn(move || frontier.get_link())
    };
    thread::sleep(Duration::from_millis(50));
    assert!(!getter.is_finished());

    frontier.input_web("example.com", "/late", false);
    assert_eq!(
        getter.join().unwrap().as_deref(),
        Some("https://example.com/late")
    );
}

#[test]
fn test_priority_tier_drains_before_overflow() {
    let frontier = web_frontier(10, 100);

    for i in 0..20 {
        frontier.input_web("example.com", &format!("/normal/{}", i), false);
    }
    for i in 0..10 {
        frontier.input_web("example.com", &format!("/priority/{}", i), true);
    }

    for i in 0..10 {
        assert_eq!(
            frontier.get_link(),
            Some(format!("https://example.com/priority/{}", i))
        );
    }
    // Overflow is LIFO.
    for i in (0..20).rev() {
        assert_eq!(
            frontier.get_link(),
            Some(format!("https://example.com/normal/{}", i))
        );
    }
}

#[test]
fn test_crawl_feedback_loop() {
    let frontier = web_frontier(100, 1_000);
    assert_eq!(
        frontier.request_visit("https://example.com/index.html"),
        Admission::Priority
    );

    // Every page links back to the index and to two children, up to depth 3.
    let mut fetched = Vec::new();
    while fetched.len() < 15 {
        let page = frontier.get_link().expect("frontier closed early");
        let depth = page.matches('/').count() - 3;
        if depth < 3 {
            for href in ["left/index.html", "right/index.html", "/index.html"] {
                frontier.discovered_link(&page, href);
            }
        }
        fetched.push(page);
    }

    let unique: HashSet<_> = fetched.iter().collect();
    assert_eq!(unique.len(), 15);
    assert_eq!(frontier.statistics().pending(), 0);
}

#[test]
fn test_concurrent_producers_and_consumers() {
    const PRODUCERS: usize = 8;
    const CONSUMERS: usize = 8;
    const LINKS: usize = 250;

    let frontier = web_frontier(16, 100_000);

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let frontier = Arc::clone(&frontier);
            thread::spawn(move || {
                for i in 0..LINKS {
                    let admission =
                        frontier.input_web("example.com", &format!("/{}/{}", p, i), i % 3 == 0);
                    assert!(admission.is_stored());
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let frontier = Arc::clone(&frontier);
            thread::spawn(move || {
                (0..PRODUCERS * LINKS / CONSUMERS)
                    .map(|_| frontier.get_link().expect("frontier closed early"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    let consumed: Vec<String> = consumers
        .into_iter()
        .flat_map(|c| c.join().unwrap())
        .collect();

    let expected: HashSet<String> = (0..PRODUCERS)
        .flat_map(|p| (0..LINKS).map(move |i| format!("https://example.com/{}/{}", p, i)))
        .collect();
    let unique: HashSet<String> = consumed.iter().cloned().collect();

    assert_eq!(consumed.len(), PRODUCERS * LINKS, "no link handed out twice");
    assert_eq!(unique, expected);

    let stats = frontier.statistics();
    assert_eq!(stats.dispatched, (PRODUCERS * LINKS) as u64);
    assert_eq!(stats.dropped, 0);
}

#[test]
fn test_destroy_releases_every_blocked_getter() {
    let frontier = web_frontier(4, 4);

    let getters: Vec<_> = (0..4)
        .map(|_| {
            let frontier = Arc::clone(&frontier);
            thread::spawn(move || frontier.get_link())
        })
        .collect();
    thread::sleep(Duration::from_millis(50));

    frontier.destroy();
    for getter in getters {
        assert_eq!(getter.join().unwrap(), None);
    }
}

#[tokio::test]
async fn test_async_bridge() {
    let frontier = web_frontier(100, 1_000);

    let fetcher = {
        let frontier = Arc::clone(&frontier);
        tokio::spawn(async move { frontier.get_link_async().await })
    };

    frontier.input_web("example.com", "/async", true);
    assert_eq!(
        fetcher.await.unwrap().as_deref(),
        Some("https://example.com/async")
    );

    let parked = {
        let frontier = Arc::clone(&frontier);
        tokio::spawn(async move { frontier.get_link_async().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    frontier.destroy();
    assert_eq!(parked.await.unwrap(), None);
}

#[tokio::test]
async fn test_timed_out_async_getter_does_not_lose_link() {
    let frontier = web_frontier(100, 1_000);

    let waited = tokio::time::timeout(Duration::from_millis(50), frontier.get_link_async()).await;
    assert!(waited.is_err(), "nothing was stored yet");

    assert_eq!(frontier.input_web("example.com", "/x", true), Admission::Priority);

    // The abandoned request may take /x first; it must come back.
    let next = {
        let frontier = Arc::clone(&frontier);
        tokio::task::spawn_blocking(move || frontier.get_link())
    };
    let link = tokio::time::timeout(Duration::from_secs(5), next)
        .await
        .expect("link was lost to the cancelled request")
        .unwrap();
    assert_eq!(link.as_deref(), Some("https://example.com/x"));

    let stats = frontier.statistics();
    assert_eq!(stats.dispatched, 1);
    assert_eq!(stats.admitted(), 1);
    assert_eq!(stats.pending(), 0);

    frontier.destroy();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_async_getters_keep_every_link() {
    const LINKS: usize = 50;

    let frontier = web_frontier(8, 1_000);
    let producer = {
        let frontier = Arc::clone(&frontier);
        tokio::task::spawn_blocking(move || {
            for i in 0..LINKS {
                frontier.input_web("example.com", &format!("/{}", i), i % 2 == 0);
                thread::sleep(Duration::from_millis(1));
            }
        })
    };

    // Alternate short timeouts with patient getters.
    let mut received = HashSet::new();
    while received.len() < LINKS {
        let _ = tokio::time::timeout(Duration::from_micros(200), frontier.get_link_async()).await;
        let link = tokio::time::timeout(Duration::from_secs(5), frontier.get_link_async())
            .await
            .expect("link was lost to a cancelled request")
            .expect("frontier closed early");
        assert!(received.insert(link), "link handed out twice");
    }
    producer.await.unwrap();

    assert_eq!(frontier.statistics().dispatched, LINKS as u64);
    frontier.destroy();
}

#[test]
fn test_frontier_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[frontier]
priority-capacity = 2

[[whitelist]]
host = "en.wikipedia.org"
seeds = [
    "https://en.wikipedia.org/wiki/Rust",
    "https://en.wikipedia.org/wiki/Special:Random",
    "https://en.wikipedia.org/wiki/Cargo",
    "https://en.wikipedia.org/wiki/Rust",
]
exclude = ["/wiki/(File|Wikipedia|Special|User)", "/static/", "/w/"]
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    let frontier = Frontier::from_config(&config).unwrap();

    let admissions: Vec<Admission> = frontier
        .seed(&config)
        .into_iter()
        .map(|(_, admission)| admission)
        .collect();
    assert_eq!(
        admissions,
        [
            Admission::Priority,
            Admission::Rejected,
            Admission::Priority,
            Admission::Rejected,
        ]
    );

    assert_eq!(
        frontier.get_link().as_deref(),
        Some("https://en.wikipedia.org/wiki/Rust")
    );
    assert_eq!(
        frontier.discovered_link("https://en.wikipedia.org/wiki/Rust", "/w/index.php?title=Rust"),
        Admission::Rejected
    );
    assert_eq!(
        frontier.get_link().as_deref(),
        Some("https://en.wikipedia.org/wiki/Cargo")
    );
}
