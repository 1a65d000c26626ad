//! Crawl frontier: discovered-set deduplication plus a FIFO work queue
//!
//! Every URL that enters the frontier is recorded in `discovered` and queued
//! in `pending` in the same call, so a URL is queued at most once over the
//! lifetime of a crawl no matter how many pages link to it. The queue is
//! FIFO, giving breadth-first traversal in discovery order.

use std::collections::{HashSet, VecDeque};

/// Frontier owned by the coordinator for the duration of one crawl
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    /// Every URL ever seen, visited or not
    discovered: HashSet<String>,

    /// URLs still awaiting a visit, in discovery order
    pending: VecDeque<String>,
}

impl Frontier {
    /// Creates a frontier holding one seed URL
    pub fn new(seed: impl Into<String>) -> Self {
        let mut frontier = Self::default();
        frontier.offer(seed);
        frontier
    }

    /// Registers a URL, queueing it if it has never been seen
    ///
    /// Returns true if the URL was newly added. Re-offering a known URL,
    /// visited or still pending, is a no-op that returns false.
    pub fn offer(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.discovered.contains(&url) {
            return false;
        }
        self.discovered.insert(url.clone());
        self.pending.push_back(url);
        true
    }

    /// Records a URL that has already been visited under another name
    ///
    /// Used for redirect targets. The URL is marked discovered and dropped
    /// from the queue if it was waiting there. Returns true if the frontier
    /// changed.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|pending| pending != url);
        let dequeued = self.pending.len() != before;
        self.discovered.insert(url.to_string()) || dequeued
    }

    /// Removes and returns the oldest pending URL
    pub fn take_next(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Returns true if no URL is waiting for a visit
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the number of URLs ever discovered
    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    /// Returns the number of URLs waiting for a visit
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if the URL has been discovered
    pub fn contains(&self, url: &str) -> bool {
        self.discovered.contains(url)
    }
}
