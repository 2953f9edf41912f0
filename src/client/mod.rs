//! The OpenDota client: dispatch pipeline and typed accessors.
//!
//! Every public accessor builds an [`Endpoint`] descriptor and funnels it
//! through [`OpenDota::dispatch`]: compute the cache key, consult the
//! [`FileCache`], and on a miss acquire a rate-limit permit, issue the
//! request, normalize the response shape, and store the result. Cache hits
//! return without touching the limiter — cached reads never wait on, or
//! count against, the remote budget.
//!
//! Remote failures are surfaced as-is and never retried here; the design
//! deliberately does not hide remote errors behind stale cached data.

mod builder;

pub use builder::OpenDotaBuilder;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::FileCache;
use crate::endpoint::{Endpoint, Shape};
use crate::limit::RateLimiter;
use crate::telemetry;
use crate::types::{
    Document, Hero, HeroQuery, League, Record, SchemaField, Team, TeamPlayer, UpdateFrequency,
};
use crate::{Result, RoshanError};

/// Default base URL of the remote service.
pub const DEFAULT_BASE_URL: &str = "https://api.opendota.com/api";

/// How the dispatch pipeline interacts with the cache for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheMode {
    /// Serve from cache when possible, store fresh results.
    ReadWrite,
    /// Skip both cache read and cache write.
    Bypass,
    /// Skip the read, fetch fresh, overwrite the entry.
    Refresh,
}

/// Client for the OpenDota API.
///
/// Build one with [`OpenDota::builder`]; the default configuration is
/// anonymous (stricter rate policy), caching enabled under
/// `~/.cache/roshan`.
///
/// ```rust,no_run
/// use roshan::OpenDota;
///
/// #[tokio::main]
/// async fn main() -> roshan::Result<()> {
///     let client = OpenDota::builder().build()?;
///     let player = client.get_player(111620041).await?;
///     println!("{}", serde_json::to_string_pretty(&player)?);
///     Ok(())
/// }
/// ```
pub struct OpenDota {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cache: FileCache,
    cache_enabled: bool,
    limiter: Arc<RateLimiter>,
}

impl OpenDota {
    /// Create a builder for configuring a client.
    pub fn builder() -> OpenDotaBuilder {
        OpenDotaBuilder::new()
    }

    /// A client with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub(crate) fn from_parts(
        http: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        cache: FileCache,
        cache_enabled: bool,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            cache,
            cache_enabled,
            limiter,
        }
    }

    /// The cache root directory this client reads and writes.
    pub fn cache_dir(&self) -> &Path {
        self.cache.root()
    }

    /// The rate limiter governing this client's outbound calls. Pass a
    /// clone to [`OpenDotaBuilder::shared_limiter`] to make another client
    /// share the same budget.
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Remove one cached entry, or the whole cache when `endpoint` is
    /// `None`.
    pub fn clear_cache(&self, endpoint: Option<&Endpoint>) -> Result<()> {
        match endpoint {
            Some(endpoint) => self.cache.clear(Some(&endpoint.cache_key())),
            None => self.cache.clear(None),
        }
    }

    // ------------------------------------------------------------------
    // Dispatch pipeline
    // ------------------------------------------------------------------

    /// Dispatch one descriptor through the full pipeline.
    ///
    /// With `use_cache` the call may be served from the local store; a
    /// cache hit skips the rate limiter entirely. With `use_cache = false`
    /// both cache read and write are bypassed, but the call still goes
    /// through the limiter.
    pub async fn dispatch(&self, endpoint: &Endpoint, use_cache: bool) -> Result<Document> {
        let mode = if use_cache {
            CacheMode::ReadWrite
        } else {
            CacheMode::Bypass
        };
        self.dispatch_mode(endpoint, mode).await
    }

    /// Fetch fresh and overwrite the cached entry, regardless of what is
    /// stored. The counterpart of a plain cached dispatch for data the
    /// caller knows to be stale.
    pub async fn refresh(&self, endpoint: &Endpoint) -> Result<Document> {
        self.dispatch_mode(endpoint, CacheMode::Refresh).await
    }

    async fn dispatch_mode(&self, endpoint: &Endpoint, mode: CacheMode) -> Result<Document> {
        let key = endpoint.cache_key();
        let family = endpoint.family();
        let store = endpoint.cacheable() && mode != CacheMode::Bypass;

        if store && mode == CacheMode::ReadWrite {
            if let Some(value) = self.cache.get(&key)? {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL, "endpoint" => family).increment(1);
                debug!(key = %key, "cache hit, skipping network");
                return normalize(endpoint, value);
            }
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "endpoint" => family).increment(1);
        }

        let permit = self.limiter.acquire().await?;

        let url = format!("{}{}", self.base_url, endpoint.path());
        let mut request = self.http.request(endpoint.method(), &url);
        let mut pairs = endpoint.query();
        if let Some(ref api_key) = self.api_key {
            // The credential travels on the request only; it is never part
            // of the descriptor, so it never reaches the cache key.
            pairs.push(("api_key", api_key.clone()));
        }
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }

        debug!(url = %url, endpoint = family, "dispatching request");
        let started = std::time::Instant::now();
        permit.fire();
        let response = request.send().await.map_err(map_transport_error)?;
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "endpoint" => family)
            .record(started.elapsed().as_secs_f64());

        let status = response.status();
        if !status.is_success() {
            metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => family, "status" => "error")
                .increment(1);
            warn!(status = status.as_u16(), endpoint = family, "remote call failed");
            if status == reqwest::StatusCode::NOT_FOUND
                && matches!(endpoint.shape(), Shape::Record | Shape::Any)
            {
                return Err(RoshanError::NotFound(key.to_string()));
            }
            let message = response.text().await.unwrap_or_default();
            return Err(RoshanError::Remote {
                status: status.as_u16(),
                message,
            });
        }
        metrics::counter!(telemetry::REQUESTS_TOTAL, "endpoint" => family, "status" => "ok")
            .increment(1);

        let value: Value = response.json().await.map_err(map_transport_error)?;
        let document = normalize(endpoint, value)?;
        if store {
            self.cache.put(&key, &document.to_value())?;
        }
        Ok(document)
    }

    async fn record(&self, endpoint: Endpoint) -> Result<Record> {
        self.dispatch(&endpoint, self.cache_enabled)
            .await?
            .into_record()
    }

    async fn records(&self, endpoint: Endpoint) -> Result<Vec<Value>> {
        self.dispatch(&endpoint, self.cache_enabled)
            .await?
            .into_records()
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Match details.
    pub async fn get_match(&self, match_id: u64) -> Result<Record> {
        self.record(Endpoint::Match { match_id }).await
    }

    /// Recent professional matches.
    pub async fn get_pro_matches(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::ProMatches).await
    }

    /// Top currently ongoing live games. Never cached.
    pub async fn get_live(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::Live).await
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Player profile.
    pub async fn get_player(&self, account_id: u64) -> Result<Record> {
        self.record(Endpoint::Player { account_id }).await
    }

    /// Professional players.
    pub async fn get_pro_players(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::ProPlayers).await
    }

    /// Heroes played by a player.
    pub async fn get_player_heroes(&self, account_id: u64) -> Result<Vec<Value>> {
        self.records(Endpoint::PlayerHeroes { account_id }).await
    }

    /// Matches played by a player, optionally limited to the last `days`.
    pub async fn get_player_matches(
        &self,
        account_id: u64,
        days: Option<u32>,
    ) -> Result<Vec<Value>> {
        self.records(Endpoint::PlayerMatches { account_id, days })
            .await
    }

    /// Player rating history.
    pub async fn get_player_ratings(&self, account_id: u64) -> Result<Vec<Value>> {
        self.records(Endpoint::PlayerRatings { account_id }).await
    }

    /// Player hero rankings.
    pub async fn get_player_rankings(&self, account_id: u64) -> Result<Vec<Value>> {
        self.records(Endpoint::PlayerRankings { account_id }).await
    }

    /// Remote player search. Never cached.
    pub async fn search_player(&self, query: &str) -> Result<Vec<Value>> {
        self.records(Endpoint::SearchPlayers {
            query: query.to_string(),
        })
        .await
    }

    // ------------------------------------------------------------------
    // Heroes
    // ------------------------------------------------------------------

    /// Hero data.
    pub async fn get_heroes(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::Heroes).await
    }

    /// Hero performance in recent matches.
    pub async fn get_hero_stats(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::HeroStats).await
    }

    /// Benchmarks for one hero.
    pub async fn get_hero_benchmarks(&self, hero_id: u32) -> Result<Record> {
        self.record(Endpoint::HeroBenchmarks { hero_id }).await
    }

    /// Search heroes by name, attack type, or roles — a client-side filter
    /// over [`get_heroes`](Self::get_heroes).
    pub async fn search_hero(&self, query: &HeroQuery) -> Result<Vec<Hero>> {
        let heroes: Vec<Hero> = serde_json::from_value(Value::Array(self.get_heroes().await?))?;
        Ok(heroes.into_iter().filter(|h| query.matches(h)).collect())
    }

    // ------------------------------------------------------------------
    // Leagues
    // ------------------------------------------------------------------

    /// Leagues.
    pub async fn get_leagues(&self) -> Result<Vec<Value>> {
        self.records(Endpoint::Leagues).await
    }

    /// Search leagues by name, case-insensitive substring.
    pub async fn search_league(&self, query: &str) -> Result<Vec<League>> {
        let leagues: Vec<League> = serde_json::from_value(Value::Array(self.get_leagues().await?))?;
        Ok(leagues.into_iter().filter(|l| l.matches(query)).collect())
    }

    // ------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------

    /// Team data. When caching is enabled the list response also primes
    /// the per-team cache entries, so a later `get_team` for any listed
    /// team is served locally.
    pub async fn get_teams(&self) -> Result<Vec<Value>> {
        let teams = self.records(Endpoint::Teams).await?;
        if self.cache_enabled {
            self.prime_team_entries(&teams)?;
        }
        Ok(teams)
    }

    /// One team.
    pub async fn get_team(&self, team_id: u64) -> Result<Record> {
        self.record(Endpoint::Team { team_id }).await
    }

    /// Matches for a team.
    pub async fn get_team_matches(&self, team_id: u64) -> Result<Vec<Value>> {
        self.records(Endpoint::TeamMatches { team_id }).await
    }

    /// Players who have played for a team. With `current_only`, limited to
    /// the current roster.
    pub async fn get_team_players(
        &self,
        team_id: u64,
        current_only: bool,
    ) -> Result<Vec<TeamPlayer>> {
        let players: Vec<TeamPlayer> =
            serde_json::from_value(Value::Array(self.records(Endpoint::TeamPlayers { team_id }).await?))?;
        if current_only {
            Ok(players
                .into_iter()
                .filter(|p| p.is_current_team_member == Some(true))
                .collect())
        } else {
            Ok(players)
        }
    }

    /// Heroes played by a team.
    pub async fn get_team_heroes(&self, team_id: u64) -> Result<Vec<Value>> {
        self.records(Endpoint::TeamHeroes { team_id }).await
    }

    /// Search teams by name substring or exact tag, case-insensitive.
    /// An empty result is valid, not an error.
    pub async fn search_team(&self, query: &str) -> Result<Vec<Team>> {
        let teams: Vec<Team> = serde_json::from_value(Value::Array(self.get_teams().await?))?;
        Ok(teams.into_iter().filter(|t| t.matches(query)).collect())
    }

    fn prime_team_entries(&self, teams: &[Value]) -> Result<()> {
        for team in teams {
            if let Some(team_id) = team.get("team_id").and_then(Value::as_u64) {
                self.cache
                    .put(&Endpoint::Team { team_id }.cache_key(), team)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constants (static game data)
    // ------------------------------------------------------------------

    /// Names of the available static game-data resources.
    pub async fn get_constant_names(&self) -> Result<Vec<String>> {
        let names = self.records(Endpoint::ConstantNames).await?;
        Ok(serde_json::from_value(Value::Array(names))?)
    }

    /// One static game-data resource, raw.
    pub async fn get_constant(&self, resource: &str) -> Result<Value> {
        let document = self
            .dispatch(
                &Endpoint::Constant {
                    resource: resource.to_string(),
                },
                self.cache_enabled,
            )
            .await?;
        Ok(document.into_value())
    }

    /// Static game data for the named resources, keyed by resource name.
    /// An empty slice fetches every available resource.
    pub async fn get_constants(&self, resources: &[&str]) -> Result<Record> {
        let names: Vec<String> = if resources.is_empty() {
            self.get_constant_names().await?
        } else {
            resources.iter().map(|s| s.to_string()).collect()
        };
        let mut out = Record::new();
        for name in names {
            let value = self.get_constant(&name).await?;
            out.insert(name, value);
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Database
    // ------------------------------------------------------------------

    /// Sorted unique table names from the schema introspection endpoint.
    pub async fn get_schema_tables(&self) -> Result<Vec<String>> {
        let fields = self.schema_fields().await?;
        let mut tables: Vec<String> = fields.into_iter().map(|f| f.table_name).collect();
        tables.sort();
        tables.dedup();
        Ok(tables)
    }

    /// Column name → data type for one table. Unknown tables produce an
    /// empty map.
    pub async fn get_schema(&self, table_name: &str) -> Result<BTreeMap<String, String>> {
        let fields = self.schema_fields().await?;
        Ok(fields
            .into_iter()
            .filter(|f| f.table_name == table_name)
            .map(|f| (f.column_name, f.data_type))
            .collect())
    }

    async fn schema_fields(&self) -> Result<Vec<SchemaField>> {
        let fields = self.records(Endpoint::Schema).await?;
        Ok(serde_json::from_value(Value::Array(fields))?)
    }

    /// Submit a free-form SQL query to the explorer endpoint and return
    /// its rows. The SQL is forwarded verbatim — never parsed or validated
    /// locally — and is part of the cache key, so identical queries are
    /// cache-hit-equivalent.
    pub async fn explorer(&self, sql: &str) -> Result<Vec<Value>> {
        self.dispatch(
            &Endpoint::Explorer {
                sql: sql.to_string(),
            },
            self.cache_enabled,
        )
        .await?
        .into_rows()
    }

    /// Alias for [`explorer`](Self::explorer).
    pub async fn query(&self, sql: &str) -> Result<Vec<Value>> {
        self.explorer(sql).await
    }

    // ------------------------------------------------------------------
    // Parse requests
    // ------------------------------------------------------------------

    /// Submit a new parse request for a match. Never cached.
    pub async fn request_parse(&self, match_id: u64) -> Result<Record> {
        info!(match_id, "requesting parse");
        self.record(Endpoint::RequestParse { match_id }).await
    }

    /// Poll the state of a parse job. Never cached.
    pub async fn request_status(&self, job_id: &str) -> Result<Record> {
        self.record(Endpoint::RequestStatus {
            job_id: job_id.to_string(),
        })
        .await
    }

    /// Request parses for a player's recent matches that have no parsed
    /// replay yet. Returns the submitted job records.
    pub async fn request_parse_missing(
        &self,
        account_id: u64,
        days: Option<u32>,
    ) -> Result<Vec<Record>> {
        let matches = self.get_player_matches(account_id, days).await?;
        let mut jobs = Vec::new();
        for m in &matches {
            let parsed_version = m.get("version").and_then(Value::as_i64);
            let needs_parse = parsed_version.is_none_or(|v| v < 20);
            if !needs_parse {
                continue;
            }
            if let Some(match_id) = m.get("match_id").and_then(Value::as_u64) {
                jobs.push(self.request_parse(match_id).await?);
            }
        }
        Ok(jobs)
    }

    // ------------------------------------------------------------------
    // Bulk refresh
    // ------------------------------------------------------------------

    /// Force-refresh the core data set.
    ///
    /// Every tier refreshes teams; [`UpdateFrequency::Medium`] adds
    /// per-hero benchmarks; [`UpdateFrequency::Low`] additionally refreshes
    /// the constants mirror and hero data.
    pub async fn update_data(&self, frequency: UpdateFrequency) -> Result<()> {
        let teams = self.refresh(&Endpoint::Teams).await?.into_records()?;
        self.prime_team_entries(&teams)?;

        if frequency <= UpdateFrequency::Medium {
            let heroes: Vec<Hero> = serde_json::from_value(Value::Array(self.get_heroes().await?))?;
            for hero in &heroes {
                self.refresh(&Endpoint::HeroBenchmarks { hero_id: hero.id })
                    .await?;
            }
        }

        if frequency <= UpdateFrequency::Low {
            let names = self.refresh(&Endpoint::ConstantNames).await?.into_records()?;
            let names: Vec<String> = serde_json::from_value(Value::Array(names))?;
            for resource in names {
                self.refresh(&Endpoint::Constant { resource }).await?;
            }
            self.refresh(&Endpoint::Heroes).await?;
        }
        Ok(())
    }
}

/// Map a `reqwest` failure into the error taxonomy: ambient timeouts and
/// cancellations are distinct from connection-level transport failures.
fn map_transport_error(e: reqwest::Error) -> RoshanError {
    if e.is_timeout() {
        RoshanError::Cancelled(e.to_string())
    } else if e.is_decode() {
        RoshanError::Data(e.to_string())
    } else {
        RoshanError::Transport(e.to_string())
    }
}

/// Normalize a raw response body into the endpoint's document shape.
///
/// An `{"error": ...}` body means the service could not produce the
/// resource even under HTTP 200: entity lookups surface that as a lookup
/// miss, everything else as a remote error.
fn normalize(endpoint: &Endpoint, value: Value) -> Result<Document> {
    if let Value::Object(ref map) = value {
        if let Some(error) = map.get("error").and_then(Value::as_str) {
            return Err(match endpoint.shape() {
                Shape::Record | Shape::Any => {
                    RoshanError::NotFound(format!("{}: {error}", endpoint.cache_key()))
                }
                _ => RoshanError::Remote {
                    status: 200,
                    message: error.to_string(),
                },
            });
        }
    }
    match (endpoint.shape(), value) {
        (Shape::Record, Value::Object(map)) => Ok(Document::Record(map)),
        // The service answers `null` for entities it has never seen
        // (e.g. unknown parse jobs).
        (Shape::Record, Value::Null) => {
            Err(RoshanError::NotFound(endpoint.cache_key().to_string()))
        }
        (Shape::Records, Value::Array(items)) => Ok(Document::Records(items)),
        (Shape::Rows, Value::Object(mut map)) => match map.remove("rows") {
            Some(Value::Array(rows)) => Ok(Document::Rows(rows)),
            None | Some(Value::Null) => Ok(Document::Rows(Vec::new())),
            Some(other) => Err(RoshanError::Data(format!(
                "explorer rows field is not an array: {other}"
            ))),
        },
        // A cached explorer document is stored as the bare row array.
        (Shape::Rows, Value::Array(rows)) => Ok(Document::Rows(rows)),
        (Shape::Any, Value::Object(map)) => Ok(Document::Record(map)),
        (Shape::Any, Value::Array(items)) => Ok(Document::Records(items)),
        (shape, other) => Err(RoshanError::Data(format!(
            "{} returned {}, expected {shape:?}",
            endpoint.cache_key(),
            json_kind(&other),
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
