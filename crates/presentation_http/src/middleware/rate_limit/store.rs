//! Fixed-window lockout state and its storage.

use std::{
    collections::HashMap,
    fmt::Debug,
    time::{Duration, Instant},
};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;

/// Limits applied to one route family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_attempts: u32,
    pub window: Duration,
    pub block: Duration,
}

impl RatePolicy {
    pub const fn new(max_attempts: u32, window: Duration, block: Duration) -> Self {
        Self {
            max_attempts,
            window,
            block,
        }
    }
}

impl From<&infrastructure::RoutePolicyConfig> for RatePolicy {
    fn from(config: &infrastructure::RoutePolicyConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.window_secs),
            Duration::from_secs(config.block_secs),
        )
    }
}

/// Counter for one `(prefix, client)` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    pub count: u32,
    pub first_attempt: Instant,
    pub blocked_until: Option<Instant>,
}

impl RateLimitEntry {
    const fn fresh(now: Instant) -> Self {
        Self {
            count: 1,
            first_attempt: now,
            blocked_until: None,
        }
    }

    fn last_activity(&self) -> Instant {
        self.blocked_until
            .map_or(self.first_attempt, |until| until.max(self.first_attempt))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: Duration },
}

impl Decision {
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Advance one key's state by a single request.
///
/// A block in force wins over everything else. An expired block or an
/// elapsed window (strictly longer than `policy.window`) starts over.
pub fn step(
    entry: Option<RateLimitEntry>,
    policy: &RatePolicy,
    now: Instant,
) -> (RateLimitEntry, Decision) {
    let fresh = || {
        (
            RateLimitEntry::fresh(now),
            Decision::Allowed {
                remaining: policy.max_attempts.saturating_sub(1),
            },
        )
    };

    let Some(mut entry) = entry else {
        return fresh();
    };

    if let Some(until) = entry.blocked_until {
        if now < until {
            return (
                entry,
                Decision::Denied {
                    retry_after: until - now,
                },
            );
        }
        return fresh();
    }

    if now.saturating_duration_since(entry.first_attempt) > policy.window {
        return fresh();
    }

    entry.count = entry.count.saturating_add(1);
    if entry.count > policy.max_attempts {
        entry.blocked_until = Some(now + policy.block);
        return (
            entry,
            Decision::Denied {
                retry_after: policy.block,
            },
        );
    }

    let remaining = policy.max_attempts - entry.count;
    (entry, Decision::Allowed { remaining })
}

/// Backing table for limiter entries.
///
/// `transition` must read, step and write a key as one atomic unit so that
/// concurrent requests from the same client cannot both slip under the limit.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RateLimitStore: Send + Sync + Debug {
    async fn transition(&self, key: &str, policy: &RatePolicy, now: Instant) -> Decision;

    /// Drop entries idle for longer than `retention`, returning how many went
    async fn sweep(&self, now: Instant, retention: Duration) -> usize;
}

/// Single-process table guarded by one mutex
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get(&self, key: &str) -> Option<RateLimitEntry> {
        self.entries.lock().get(key).copied()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn transition(&self, key: &str, policy: &RatePolicy, now: Instant) -> Decision {
        let mut entries = self.entries.lock();
        let (entry, decision) = step(entries.get(key).copied(), policy, now);
        entries.insert(key.to_string(), entry);
        decision
    }

    async fn sweep(&self, now: Instant, retention: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_duration_since(entry.last_activity()) <= retention);
        before - entries.len()
    }
}
