//! Remote endpoint descriptors and cache addressing.
//!
//! [`Endpoint`] identifies one remote call: the resource family plus the
//! parameters that address a specific instance or query. A descriptor is
//! immutable once constructed and knows everything the dispatch pipeline
//! needs — URL path, query pairs, HTTP method, the response [`Shape`]
//! contract, and its deterministic [`CacheKey`].
//!
//! The explorer SQL string and the constants resource name are part of the
//! descriptor, and therefore part of the cache key: identical query strings
//! are cache-hit-equivalent, distinct strings never collide.

use std::fmt;

/// Response shape contract for an endpoint family.
///
/// Entity lookups produce a single record, list/search endpoints produce an
/// ordered sequence, the explorer produces row-shaped results. `Any` covers
/// the constants mirror, whose payload shape varies per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A single structured record (JSON object).
    Record,
    /// An ordered sequence of records (JSON array), possibly empty.
    Records,
    /// Row-shaped query results (the `rows` field of the explorer response).
    Rows,
    /// Object or array, decided by the payload (constants resources).
    Any,
}

/// Descriptor for one remote call: endpoint family + parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Match details by match id.
    Match { match_id: u64 },
    /// Recent professional matches.
    ProMatches,
    /// Top currently ongoing live games. Never cached.
    Live,
    /// Player profile by account id.
    Player { account_id: u64 },
    /// Professional players.
    ProPlayers,
    /// Heroes played by a player.
    PlayerHeroes { account_id: u64 },
    /// Matches played by a player, optionally limited to recent days.
    PlayerMatches { account_id: u64, days: Option<u32> },
    /// Player rating history.
    PlayerRatings { account_id: u64 },
    /// Player hero rankings.
    PlayerRankings { account_id: u64 },
    /// Hero data.
    Heroes,
    /// Hero performance in recent matches.
    HeroStats,
    /// Benchmarks for one hero.
    HeroBenchmarks { hero_id: u32 },
    /// Leagues.
    Leagues,
    /// Teams.
    Teams,
    /// One team by team id.
    Team { team_id: u64 },
    /// Matches for a team.
    TeamMatches { team_id: u64 },
    /// Players who have played for a team.
    TeamPlayers { team_id: u64 },
    /// Heroes played by a team.
    TeamHeroes { team_id: u64 },
    /// Names of available static game-data resources.
    ConstantNames,
    /// One static game-data resource (mirrored from dotaconstants).
    Constant { resource: String },
    /// Remote player search. Never cached.
    SearchPlayers { query: String },
    /// Database schema introspection.
    Schema,
    /// Free-form SQL forwarded to the explorer endpoint. The SQL is never
    /// parsed or validated locally.
    Explorer { sql: String },
    /// Submit a match parse request (POST). Never cached.
    RequestParse { match_id: u64 },
    /// Poll a parse job. Never cached.
    RequestStatus { job_id: String },
}

impl Endpoint {
    /// URL path below the API base, with leading slash.
    pub fn path(&self) -> String {
        match self {
            Self::Match { match_id } => format!("/matches/{match_id}"),
            Self::ProMatches => "/proMatches".into(),
            Self::Live => "/live".into(),
            Self::Player { account_id } => format!("/players/{account_id}"),
            Self::ProPlayers => "/proPlayers".into(),
            Self::PlayerHeroes { account_id } => format!("/players/{account_id}/heroes"),
            Self::PlayerMatches { account_id, .. } => format!("/players/{account_id}/matches"),
            Self::PlayerRatings { account_id } => format!("/players/{account_id}/ratings"),
            Self::PlayerRankings { account_id } => format!("/players/{account_id}/rankings"),
            Self::Heroes => "/heroes".into(),
            Self::HeroStats => "/heroStats".into(),
            Self::HeroBenchmarks { .. } => "/benchmarks".into(),
            Self::Leagues => "/leagues".into(),
            Self::Teams => "/teams".into(),
            Self::Team { team_id } => format!("/teams/{team_id}"),
            Self::TeamMatches { team_id } => format!("/teams/{team_id}/matches"),
            Self::TeamPlayers { team_id } => format!("/teams/{team_id}/players"),
            Self::TeamHeroes { team_id } => format!("/teams/{team_id}/heroes"),
            Self::ConstantNames => "/constants".into(),
            Self::Constant { resource } => format!("/constants/{resource}"),
            Self::SearchPlayers { .. } => "/search".into(),
            Self::Schema => "/schema".into(),
            Self::Explorer { .. } => "/explorer".into(),
            Self::RequestParse { match_id } => format!("/request/{match_id}"),
            Self::RequestStatus { job_id } => format!("/request/{job_id}"),
        }
    }

    /// Query pairs for this descriptor, in canonical (fixed) order.
    ///
    /// The credential is NOT part of the descriptor — it is attached at
    /// request-build time and never reaches the cache key.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::PlayerMatches {
                days: Some(days), ..
            } => vec![("date", days.to_string())],
            Self::HeroBenchmarks { hero_id } => vec![("hero_id", hero_id.to_string())],
            Self::SearchPlayers { query } => vec![("q", query.clone())],
            Self::Explorer { sql } => vec![("sql", sql.clone())],
            _ => Vec::new(),
        }
    }

    /// HTTP method. The API is GET-only except parse submission.
    pub fn method(&self) -> reqwest::Method {
        match self {
            Self::RequestParse { .. } => reqwest::Method::POST,
            _ => reqwest::Method::GET,
        }
    }

    /// The normalization contract for this endpoint's responses.
    pub fn shape(&self) -> Shape {
        match self {
            Self::Match { .. }
            | Self::Player { .. }
            | Self::Team { .. }
            | Self::HeroBenchmarks { .. }
            | Self::RequestParse { .. }
            | Self::RequestStatus { .. } => Shape::Record,
            Self::Explorer { .. } => Shape::Rows,
            Self::Constant { .. } => Shape::Any,
            _ => Shape::Records,
        }
    }

    /// Whether results for this descriptor may be served from / stored to
    /// the local cache. Live data, remote search, and parse-job traffic are
    /// excluded: the first two are volatile, the last is a mutation.
    pub fn cacheable(&self) -> bool {
        !matches!(
            self,
            Self::Live
                | Self::SearchPlayers { .. }
                | Self::RequestParse { .. }
                | Self::RequestStatus { .. }
        )
    }

    /// Endpoint family label for metrics and logs.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Match { .. } | Self::ProMatches | Self::Live => "matches",
            Self::Player { .. }
            | Self::ProPlayers
            | Self::PlayerHeroes { .. }
            | Self::PlayerMatches { .. }
            | Self::PlayerRatings { .. }
            | Self::PlayerRankings { .. }
            | Self::SearchPlayers { .. } => "players",
            Self::Heroes | Self::HeroStats | Self::HeroBenchmarks { .. } => "heroes",
            Self::Leagues => "leagues",
            Self::Teams
            | Self::Team { .. }
            | Self::TeamMatches { .. }
            | Self::TeamPlayers { .. }
            | Self::TeamHeroes { .. } => "teams",
            Self::ConstantNames | Self::Constant { .. } => "constants",
            Self::Schema => "schema",
            Self::Explorer { .. } => "explorer",
            Self::RequestParse { .. } | Self::RequestStatus { .. } => "request",
        }
    }

    /// Deterministic cache key: path plus canonical query string.
    ///
    /// Identical descriptors produce identical keys; distinct descriptors
    /// never collide (path and query order are fixed per variant). POST
    /// descriptors get their own `post/` namespace: parse submission and
    /// job polling share the `/request/{id}` path, and no GET path begins
    /// with `post/`.
    pub fn cache_key(&self) -> CacheKey {
        let mut key = String::new();
        if self.method() == reqwest::Method::POST {
            key.push_str("post/");
        }
        key.push_str(&self.path()[1..]);
        let pairs = self.query();
        for (i, (name, value)) in pairs.iter().enumerate() {
            key.push(if i == 0 { '?' } else { '&' });
            key.push_str(name);
            key.push('=');
            key.push_str(value);
        }
        CacheKey(key)
    }
}

/// Deterministic string derived from an [`Endpoint`] for cache addressing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
