//! Roshan - Typed client for the OpenDota match-data API
//!
//! This crate exposes the OpenDota REST API as typed local method calls,
//! with a local on-disk cache to avoid redundant network calls and a
//! self-imposed rate limiter to stay within the service's usage policy.
//!
//! # Example
//!
//! ```rust,no_run
//! use roshan::OpenDota;
//!
//! #[tokio::main]
//! async fn main() -> roshan::Result<()> {
//!     let client = OpenDota::builder().build()?;
//!
//!     // First call hits the network and lands in the cache;
//!     // repeating it is served locally without rate limiting.
//!     let player = client.get_player(111620041).await?;
//!     println!("{}", serde_json::to_string_pretty(&player)?);
//!
//!     let teams = client.search_team("Alliance").await?;
//!     println!("{} teams matched", teams.len());
//!     Ok(())
//! }
//! ```
//!
//! # Explorer Example
//!
//! ```rust,no_run
//! use roshan::OpenDota;
//!
//! #[tokio::main]
//! async fn main() -> roshan::Result<()> {
//!     let client = OpenDota::builder().api_key("your-key").build()?;
//!
//!     // Forwarded verbatim; identical queries are cache-hit-equivalent.
//!     let rows = client
//!         .explorer("select count(*) from matches where duration > 7200")
//!         .await?;
//!     println!("{rows:?}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod limit;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::FileCache;
pub use client::{DEFAULT_BASE_URL, OpenDota, OpenDotaBuilder};
pub use endpoint::{CacheKey, Endpoint, Shape};
pub use error::{Result, RoshanError};
pub use limit::{Permit, RateLimit, RateLimiter};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    Document, Hero, HeroQuery, League, Record, SchemaField, Team, TeamPlayer, UpdateFrequency,
};
