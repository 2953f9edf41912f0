//! Self-imposed rate limiting for outbound calls.
//!
//! The remote service asks clients to pace themselves; [`RateLimiter`]
//! enforces that locally, as either a fixed minimum delay between calls, a
//! maximum call count per rolling window, or both. All timing uses the
//! monotonic [`tokio::time`] clock, so wall-clock adjustments never grant
//! or deny calls incorrectly.
//!
//! # Permits
//!
//! [`RateLimiter::acquire`] waits until a call is permissible, reserves the
//! slot, and hands back a [`Permit`]. The caller fires the permit at the
//! moment the request goes out; a permit dropped unfired (the caller was
//! cancelled before reaching the network) rolls its reservation back, so
//! cancelled calls are never counted as sent.
//!
//! # Sharing
//!
//! A limiter is owned by the client that built it. To make several clients
//! share one budget, build the limiter yourself and pass the same
//! `Arc<RateLimiter>` to each builder; nothing is process-global.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;
use crate::{Result, RoshanError};

/// Rate limit policy: a minimum inter-call delay, a calls-per-window
/// ceiling, or both. At least one must be set.
///
/// ```rust
/// # use roshan::RateLimit;
/// # use std::time::Duration;
/// let policy = RateLimit::anonymous()
///     .min_interval(Duration::from_secs(1))
///     .timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct RateLimit {
    /// Minimum delay between consecutive calls.
    pub min_interval: Option<Duration>,
    /// Maximum calls per rolling `window`.
    pub max_calls: Option<u32>,
    /// Width of the rolling window. Only meaningful with `max_calls`.
    pub window: Duration,
    /// Maximum time `acquire()` may wait before failing with
    /// [`RoshanError::RateLimitTimeout`]. Default: wait indefinitely.
    pub timeout: Option<Duration>,
}

impl RateLimit {
    /// Policy for clients without a credential: 3 seconds between calls
    /// and the free-tier ceiling of 60 calls per minute.
    pub fn anonymous() -> Self {
        Self {
            min_interval: Some(Duration::from_secs(3)),
            max_calls: Some(60),
            window: Duration::from_secs(60),
            timeout: None,
        }
    }

    /// Policy for clients with a credential: 1200 calls per minute, no
    /// fixed delay.
    pub fn authenticated() -> Self {
        Self {
            min_interval: None,
            max_calls: Some(1200),
            window: Duration::from_secs(60),
            timeout: None,
        }
    }

    /// Set the minimum delay between consecutive calls.
    pub fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Set a calls-per-window ceiling.
    pub fn per_window(mut self, max_calls: u32, window: Duration) -> Self {
        self.max_calls = Some(max_calls);
        self.window = window;
        self
    }

    /// Bound how long `acquire()` may wait.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Reservations and send history behind the limiter's mutex.
#[derive(Debug, Default)]
struct LimiterState {
    /// Most recent grant, for the min-interval policy.
    last_grant: Option<Instant>,
    /// Grants inside the rolling window, oldest first.
    granted: VecDeque<Instant>,
}

/// Bounds outbound call frequency per its [`RateLimit`] policy.
pub struct RateLimiter {
    policy: RateLimit,
    state: Arc<Mutex<LimiterState>>,
}

impl RateLimiter {
    /// Build a limiter. Fails if the policy has neither a minimum interval
    /// nor a window ceiling, or if the ceiling could never grant.
    pub fn new(policy: RateLimit) -> Result<Self> {
        if policy.min_interval.is_none() && policy.max_calls.is_none() {
            return Err(RoshanError::Configuration(
                "rate limit policy needs a minimum interval or a window ceiling".into(),
            ));
        }
        if policy.max_calls == Some(0) {
            return Err(RoshanError::Configuration(
                "a ceiling of zero calls per window can never grant".into(),
            ));
        }
        if policy.max_calls.is_some() && policy.window.is_zero() {
            return Err(RoshanError::Configuration(
                "window ceiling requires a non-zero window".into(),
            ));
        }
        Ok(Self {
            policy,
            state: Arc::new(Mutex::new(LimiterState::default())),
        })
    }

    /// The active policy.
    pub fn policy(&self) -> &RateLimit {
        &self.policy
    }

    /// Wait until the next call is permissible, then reserve its slot.
    ///
    /// Concurrent acquires serialize through the state mutex: the slot is
    /// reserved under the lock, so two waiters can never be granted the
    /// same slot. Waiting beyond the policy timeout fails with
    /// [`RoshanError::RateLimitTimeout`]; without a timeout this waits as
    /// long as the policy demands.
    pub async fn acquire(&self) -> Result<Permit> {
        let started = Instant::now();
        let deadline = self.policy.timeout.map(|t| started + t);
        loop {
            let wait = {
                let mut state = self.state.lock().expect("limiter state poisoned");
                let now = Instant::now();
                let wait = self.next_wait(&mut state, now);
                if wait.is_zero() {
                    let prev_grant = state.last_grant.replace(now);
                    // Window history is only kept when a ceiling needs it.
                    if self.policy.max_calls.is_some() {
                        state.granted.push_back(now);
                    }
                    metrics::histogram!(telemetry::RATE_LIMIT_WAIT_SECONDS)
                        .record((now - started).as_secs_f64());
                    return Ok(Permit {
                        state: Arc::clone(&self.state),
                        granted_at: now,
                        prev_grant,
                        fired: false,
                    });
                }
                wait
            };
            if let Some(deadline) = deadline {
                if Instant::now() + wait > deadline {
                    return Err(RoshanError::RateLimitTimeout {
                        waited: started.elapsed(),
                    });
                }
            }
            debug!(wait_ms = wait.as_millis() as u64, "rate limit wait");
            tokio::time::sleep(wait).await;
        }
    }

    /// How long until a call would be permissible at `now`.
    /// Also evicts window entries that have aged out.
    fn next_wait(&self, state: &mut LimiterState, now: Instant) -> Duration {
        let mut wait = Duration::ZERO;
        if let (Some(min), Some(last)) = (self.policy.min_interval, state.last_grant) {
            wait = wait.max((last + min).saturating_duration_since(now));
        }
        if let Some(max_calls) = self.policy.max_calls {
            while let Some(&oldest) = state.granted.front() {
                if now.saturating_duration_since(oldest) >= self.policy.window {
                    state.granted.pop_front();
                } else {
                    break;
                }
            }
            if state.granted.len() >= max_calls as usize {
                if let Some(&oldest) = state.granted.front() {
                    wait = wait.max((oldest + self.policy.window).saturating_duration_since(now));
                }
            }
        }
        wait
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// A granted rate-limit slot.
///
/// Call [`fire`](Self::fire) when the request reaches the network. Dropping
/// an unfired permit rolls the reservation back, so a call cancelled before
/// it was sent does not consume budget.
#[must_use = "an unfired permit rolls its reservation back"]
pub struct Permit {
    state: Arc<Mutex<LimiterState>>,
    granted_at: Instant,
    prev_grant: Option<Instant>,
    fired: bool,
}

impl Permit {
    /// Record the call as sent, consuming the reservation permanently.
    pub fn fire(mut self) {
        self.fired = true;
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if self.fired {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            if let Some(pos) = state.granted.iter().rposition(|&t| t == self.granted_at) {
                state.granted.remove(pos);
            }
            if state.last_grant == Some(self.granted_at) {
                state.last_grant = self.prev_grant;
            }
        }
    }
}
