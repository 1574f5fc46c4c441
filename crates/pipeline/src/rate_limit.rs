//! Per-identity, per-operation fixed-window rate limiting.
//!
//! State is keyed by `"{operation}:{identity}"`. A fresh window starts when no
//! entry exists or the current time has reached the entry's reset time. The
//! count is incremented unconditionally before the limit is compared, so the
//! request that first exceeds the limit is itself counted and rejected.
//!
//! Because windows are fixed, a caller can be admitted up to `2 × max` times
//! across a window boundary. That is the intended behaviour of this limiter,
//! not something to smooth out here.
//!
//! Calls never block beyond the single short critical section guarding the
//! map; there is no queuing.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{CopilotError, Timestamp};

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Class of request being admitted. Each class has its own quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    /// Any request without a dedicated policy.
    General,
    /// Registration and login attempts.
    Auth,
    /// Document generation (one chain run).
    ToolGeneration,
}

impl OperationType {
    /// Key prefix used in the limiter map.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::ToolGeneration => "toolGeneration",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quota for one operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Requests admitted per window.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Creates a policy admitting `max_requests` per `window`.
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// One policy per [`OperationType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicies {
    /// Policy for [`OperationType::General`].
    pub general: RateLimitPolicy,
    /// Policy for [`OperationType::Auth`].
    pub auth: RateLimitPolicy,
    /// Policy for [`OperationType::ToolGeneration`].
    pub tool_generation: RateLimitPolicy,
}

impl RateLimitPolicies {
    /// Returns the policy for `operation`.
    pub fn for_operation(&self, operation: OperationType) -> RateLimitPolicy {
        match operation {
            OperationType::General => self.general,
            OperationType::Auth => self.auth,
            OperationType::ToolGeneration => self.tool_generation,
        }
    }
}

impl Default for RateLimitPolicies {
    /// general 100/hour, auth 5/15min, tool generation 10/hour.
    fn default() -> Self {
        Self {
            general: RateLimitPolicy::new(100, Duration::from_secs(60 * 60)),
            auth: RateLimitPolicy::new(5, Duration::from_secs(15 * 60)),
            tool_generation: RateLimitPolicy::new(10, Duration::from_secs(60 * 60)),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Counter for one `(operation, identity)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests seen in the current window, including rejected ones.
    pub count: u32,
    /// When the current window ends.
    pub reset_at: Timestamp,
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// Requests left in the current window (0 once exhausted).
    pub remaining: u32,
    /// When the current window ends.
    pub reset_at: Timestamp,
    /// Whole seconds (rounded up) until `reset_at`; 0 when `allowed`.
    pub retry_after_secs: u64,
}

impl RateDecision {
    /// Converts a rejection into [`CopilotError::RateLimited`].
    pub fn into_result(self, operation: OperationType) -> Result<Self, CopilotError> {
        if self.allowed {
            Ok(self)
        } else {
            Err(CopilotError::RateLimited {
                operation,
                retry_after_secs: self.retry_after_secs,
                reset_at: self.reset_at,
            })
        }
    }
}

/// Process-wide fixed-window counters behind one mutex.
#[derive(Debug, Default)]
pub struct RateLimiter {
    policies: RateLimitPolicies,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Creates a limiter enforcing `policies`.
    pub fn new(policies: RateLimitPolicies) -> Self {
        Self {
            policies,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request for `identity` against `operation`'s quota.
    pub fn check(&self, identity: &str, operation: OperationType) -> RateDecision {
        self.check_at(identity, operation, Timestamp::now())
    }

    /// [`RateLimiter::check`] with an explicit clock reading.
    pub fn check_at(&self, identity: &str, operation: OperationType, now: Timestamp) -> RateDecision {
        let policy = self.policies.for_operation(operation);
        let key = format!("{operation}:{identity}");

        let entry = {
            let mut entries = self.entries.lock();
            let entry = entries.entry(key).or_insert(RateLimitEntry {
                count: 0,
                reset_at: now.plus(policy.window),
            });
            if now >= entry.reset_at {
                *entry = RateLimitEntry {
                    count: 0,
                    reset_at: now.plus(policy.window),
                };
            }
            entry.count = entry.count.saturating_add(1);
            *entry
        };

        let allowed = entry.count <= policy.max_requests;
        let retry_after_secs = if allowed {
            0
        } else {
            ceil_secs(now.until(entry.reset_at))
        };
        if !allowed {
            debug!(%operation, identity, count = entry.count, retry_after_secs, "rate limit exceeded");
        }

        RateDecision {
            allowed,
            remaining: policy.max_requests.saturating_sub(entry.count),
            reset_at: entry.reset_at,
            retry_after_secs,
        }
    }

    /// Drops entries whose window ended more than `grace` before `now`.
    ///
    /// Returns how many entries were removed. An evicted key simply starts a
    /// fresh window on its next request, exactly as a stale entry would.
    pub fn evict_expired(&self, now: Timestamp, grace: Duration) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.reset_at.plus(grace));
        before - entries.len()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}
