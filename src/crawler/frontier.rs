//! Breadth-first crawl frontier
//!
//! The frontier tracks which URLs are waiting to be fetched and which have
//! already been selected. A URL is marked visited the moment it is handed out
//! in a batch, so rediscovering it later (even within the same round) never
//! causes a second fetch.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs waiting to be fetched, in discovery order
    queue: VecDeque<String>,

    /// Mirror of `queue` for O(1) membership checks
    queued: HashSet<String>,

    /// URLs already selected for fetching
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates a frontier holding only the seed
    pub fn new(seed: &str) -> Self {
        let mut frontier = Self::default();
        frontier.enqueue(seed);
        frontier
    }

    /// Adds a URL to the back of the queue
    ///
    /// Returns false if the URL was already visited or is already queued.
    pub fn enqueue(&mut self, url: &str) -> bool {
        if self.visited.contains(url) || self.queued.contains(url) {
            return false;
        }
        self.queued.insert(url.to_string());
        self.queue.push_back(url.to_string());
        true
    }

    /// Takes up to `max` URLs from the front of the queue, marking each visited
    pub fn next_batch(&mut self, max: usize) -> Vec<String> {
        let mut batch = Vec::with_capacity(max.min(self.queue.len()));
        while batch.len() < max {
            let Some(url) = self.queue.pop_front() else {
                break;
            };
            self.queued.remove(&url);
            if self.visited.insert(url.clone()) {
                batch.push(url);
            }
        }
        batch
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
