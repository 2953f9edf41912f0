//! Telemetry metric name constants.
//!
//! Centralised metric names for roshan operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `roshan_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `endpoint` — endpoint family (e.g. "matches", "players", "explorer")
//! - `status` — outcome: "ok" or "error"

/// Total requests issued to the remote service (cache hits excluded).
///
/// Labels: `endpoint`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "roshan_requests_total";

/// Outbound request duration in seconds.
///
/// Labels: `endpoint`.
pub const REQUEST_DURATION_SECONDS: &str = "roshan_request_duration_seconds";

/// Total dispatches served from the local cache.
///
/// Labels: `endpoint`.
pub const CACHE_HITS_TOTAL: &str = "roshan_cache_hits_total";

/// Total dispatches that consulted the cache and missed.
///
/// Labels: `endpoint`.
pub const CACHE_MISSES_TOTAL: &str = "roshan_cache_misses_total";

/// Time spent waiting for rate-limit permission, in seconds.
pub const RATE_LIMIT_WAIT_SECONDS: &str = "roshan_rate_limit_wait_seconds";
