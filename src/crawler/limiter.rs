//! Connection limiting shared by every crawl in the process
//!
//! This module handles:
//! - A global ceiling on open connections
//! - A per-host ceiling on open connections
//! - An optional minimum delay between successive requests to one host

use crate::config::CrawlerConfig;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Held for the duration of one request; dropping it frees both slots
#[derive(Debug)]
pub struct ConnectionPermit {
    _host: OwnedSemaphorePermit,
    _global: OwnedSemaphorePermit,
}

/// Per-host limiter state
#[derive(Debug)]
struct HostSlots {
    semaphore: Arc<Semaphore>,

    /// Earliest time the next request to this host may start
    next_start: Option<Instant>,
}

/// Limits concurrent connections globally and per host
#[derive(Debug)]
pub struct ConnectionLimiter {
    global: Arc<Semaphore>,
    per_host: usize,
    hosts: DashMap<String, HostSlots>,
    politeness_delay: Duration,
}

impl ConnectionLimiter {
    /// Creates a limiter
    ///
    /// # Arguments
    ///
    /// * `max_connections` - Ceiling across all hosts
    /// * `max_per_host` - Ceiling for any single host
    /// * `politeness_delay` - Minimum spacing between request starts on one
    ///   host; zero disables it
    pub fn new(max_connections: usize, max_per_host: usize, politeness_delay: Duration) -> Self {
        Self {
            global: Arc::new(Semaphore::new(max_connections.max(1))),
            per_host: max_per_host.max(1),
            hosts: DashMap::new(),
            politeness_delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_connections,
            config.max_connections_per_host,
            config.politeness_delay(),
        )
    }

    /// Waits for a connection slot to `host`
    ///
    /// The host slot and any politeness wait come before the global slot,
    /// so a request held back by its host never occupies a global slot.
    pub async fn acquire(&self, host: &str) -> Result<ConnectionPermit, AcquireError> {
        let host_semaphore = self.host_semaphore(host);
        let host_permit = host_semaphore.acquire_owned().await?;

        if let Some(start) = self.reserve_start(host) {
            tokio::time::sleep_until(start).await;
        }

        let global_permit = Arc::clone(&self.global).acquire_owned().await?;

        Ok(ConnectionPermit {
            _host: host_permit,
            _global: global_permit,
        })
    }

    /// Free global slots
    pub fn available(&self) -> usize {
        self.global.available_permits()
    }

    /// Free slots for `host`
    pub fn available_for(&self, host: &str) -> usize {
        self.hosts
            .get(host)
            .map(|slots| slots.semaphore.available_permits())
            .unwrap_or(self.per_host)
    }

    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let slots = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| HostSlots {
                semaphore: Arc::new(Semaphore::new(self.per_host)),
                next_start: None,
            });
        Arc::clone(&slots.semaphore)
    }

    /// Claims the next start time on `host`, if a politeness delay is set
    fn reserve_start(&self, host: &str) -> Option<Instant> {
        if self.politeness_delay.is_zero() {
            return None;
        }

        let mut slots = self.hosts.get_mut(host)?;
        let now = Instant::now();
        let start = slots.next_start.map_or(now, |next| next.max(now));
        slots.next_start = Some(start + self.politeness_delay);
        Some(start)
    }
}
