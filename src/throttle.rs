//! # Wrong-Password Throttling
//!
//! Per-identity failure counter with a temporary lockout, guarding decryption
//! attempts against brute force.
//!
//! ## State machine (per identity)
//!
//! ```text
//! Open   --failure (attempts < max)--> Open    attempts += 1
//! Open   --max-th failure-----------> Locked  lockout_until = now + lockout
//! Locked --check before expiry------> Locked  reject with remaining seconds
//! Locked --check after expiry-------> Open    attempts = 0 (lazily, no timer)
//! any    --success------------------> Open    attempts = 0
//! ```
//!
//! Records are created on first use and kept for the life of the process.
//! The store lives in memory only, so it is scoped to a single instance and
//! resets on restart. All transitions go through one mutex, so concurrent
//! requests for the same identity cannot lose updates.
//!
//! ## Usage
//!
//! ```ignore
//! let throttle = AttemptThrottle::new(ThrottleConfig::default());
//!
//! if let Gate::Locked { remaining_secs } = throttle.check("10.0.0.7") {
//!     return Err(InkError::LockedOut { remaining_secs });
//! }
//! match open(&sealed, password) {
//!     Ok(message) => throttle.record_success("10.0.0.7"),
//!     Err(_) => { throttle.record_failure("10.0.0.7"); }
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Default consecutive failures before a lockout.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default lockout length in seconds.
pub const DEFAULT_LOCKOUT_SECS: u64 = 30;

/// Throttle tuning, loaded from the `[throttle]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Consecutive failures that trigger a lockout.
    pub max_attempts: u32,
    /// How long a lockout lasts (seconds).
    pub lockout_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lockout_secs: DEFAULT_LOCKOUT_SECS,
        }
    }
}

/// Whether an identity may attempt a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Attempts may proceed.
    Open,
    /// Rejected until the lockout window ends.
    Locked {
        /// Seconds left, rounded up.
        remaining_secs: u64,
    },
}

/// Per-identity record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThrottleState {
    /// Consecutive failures since the last reset.
    pub attempts: u32,
    /// End of the active lockout, if any.
    pub lockout_until: Option<Instant>,
}

impl ThrottleState {
    /// Remaining lockout at `now`, or `None` when not locked.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        self.lockout_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Clear an expired lockout together with its attempt count.
    fn expire(&mut self, now: Instant) -> bool {
        match self.lockout_until {
            Some(until) if now >= until => {
                self.attempts = 0;
                self.lockout_until = None;
                true
            }
            _ => false,
        }
    }
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

/// In-memory throttle store keyed by opaque identity strings.
#[derive(Debug, Default)]
pub struct AttemptThrottle {
    config: ThrottleConfig,
    records: Mutex<HashMap<String, ThrottleState>>,
}

impl AttemptThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, ThrottleState>> {
        // Plain counters: still consistent after a poisoning panic.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gate an attempt from `identity`.
    pub fn check(&self, identity: &str) -> Gate {
        self.check_at(identity, Instant::now())
    }

    /// [`check`](Self::check) against an explicit clock reading.
    pub fn check_at(&self, identity: &str, now: Instant) -> Gate {
        let mut records = self.records();
        let Some(state) = records.get_mut(identity) else {
            return Gate::Open;
        };

        if let Some(remaining) = state.remaining(now) {
            return Gate::Locked {
                remaining_secs: ceil_secs(remaining),
            };
        }

        if state.expire(now) {
            info!("🔓 Lockout expired for {}", identity);
        }
        Gate::Open
    }

    /// Record a failed attempt. Returns the gate as it stands afterwards.
    pub fn record_failure(&self, identity: &str) -> Gate {
        self.record_failure_at(identity, Instant::now())
    }

    /// [`record_failure`](Self::record_failure) against an explicit clock reading.
    pub fn record_failure_at(&self, identity: &str, now: Instant) -> Gate {
        let mut records = self.records();
        let state = records.entry(identity.to_string()).or_default();

        // Already locked: the window is not extended.
        if let Some(remaining) = state.remaining(now) {
            return Gate::Locked {
                remaining_secs: ceil_secs(remaining),
            };
        }
        state.expire(now);

        state.attempts += 1;
        if state.attempts >= self.config.max_attempts {
            let lockout = Duration::from_secs(self.config.lockout_secs);
            state.lockout_until = Some(now + lockout);
            warn!(
                "🔒 {} locked out for {}s after {} failed attempts",
                identity, self.config.lockout_secs, state.attempts
            );
            return Gate::Locked {
                remaining_secs: self.config.lockout_secs,
            };
        }

        info!(
            "Failed attempt {}/{} from {}",
            state.attempts, self.config.max_attempts, identity
        );
        Gate::Open
    }

    /// Record a successful attempt, resetting the identity to a clean state.
    pub fn record_success(&self, identity: &str) {
        if let Some(state) = self.records().get_mut(identity) {
            *state = ThrottleState::default();
        }
    }

    /// Current consecutive failure count.
    pub fn attempts(&self, identity: &str) -> u32 {
        self.records()
            .get(identity)
            .map_or(0, |state| state.attempts)
    }

    /// Snapshot of the record for `identity`, if one exists.
    pub fn state(&self, identity: &str) -> Option<ThrottleState> {
        self.records().get(identity).copied()
    }
}
