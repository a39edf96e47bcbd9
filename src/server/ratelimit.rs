//! Per-user sliding-window rate limiting

use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Message sent when a user exceeds the limit
pub const RATE_LIMIT_MESSAGE: &str =
    "Rate limit exceeded. Please wait before sending more requests.";

/// Counts recent requests per user
#[derive(Debug)]
pub struct RateLimiter {
    requests: DashMap<String, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    /// Allow `limit` requests per `window` for each user
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            requests: DashMap::new(),
            limit,
            window,
        }
    }

    /// Record a request for `user` if it fits in the window.
    ///
    /// Returns `false`, without recording, when the user is over the limit.
    pub fn check(&self, user: &str) -> bool {
        let now = Instant::now();
        let mut entry = self.requests.entry(user.to_string()).or_default();
        evict_before(&mut entry, now, self.window);

        if entry.len() >= self.limit {
            return false;
        }
        entry.push_back(now);
        true
    }

    /// Drop expired timestamps and forget idle users
    pub fn prune(&self) {
        let now = Instant::now();
        self.requests.retain(|_, times| {
            evict_before(times, now, self.window);
            !times.is_empty()
        });
    }

    /// Number of users with requests in the current window
    pub fn tracked_users(&self) -> usize {
        self.requests.len()
    }

    /// Prune every `every` until the limiter is dropped
    pub fn spawn_pruner(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match limiter.upgrade() {
                    Some(limiter) => limiter.prune(),
                    None => break,
                }
            }
        })
    }
}

fn evict_before(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = times.front() {
        if now.duration_since(oldest) >= window {
            times.pop_front();
        } else {
            break;
        }
    }
}
