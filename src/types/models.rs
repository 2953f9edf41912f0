//! Typed views over API records.
//!
//! The client returns raw documents for most calls; these structs cover the
//! places where the library itself reads fields — client-side search
//! filters, team roster filtering, schema introspection. Unknown fields are
//! ignored on deserialization, and fields the service is known to null out
//! (team names, tags) are optional.

use serde::{Deserialize, Serialize};

/// One hero, as returned by the heroes endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    pub id: u32,
    pub name: String,
    pub localized_name: String,
    #[serde(default)]
    pub primary_attr: Option<String>,
    #[serde(default)]
    pub attack_type: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Client-side hero search filter.
///
/// All criteria are optional and conjunctive:
///
/// ```rust
/// # use roshan::HeroQuery;
/// let query = HeroQuery::new().name("anti").attack_type("Melee").role("Carry");
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeroQuery {
    pub name: Option<String>,
    pub attack_type: Option<String>,
    pub roles: Vec<String>,
}

impl HeroQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match heroes whose localized name contains this (case-insensitive).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Match heroes with this attack type (case-insensitive).
    pub fn attack_type(mut self, attack_type: impl Into<String>) -> Self {
        self.attack_type = Some(attack_type.into());
        self
    }

    /// Require this role; may be given multiple times, all must match.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Whether a hero satisfies every configured criterion.
    pub fn matches(&self, hero: &Hero) -> bool {
        if let Some(ref name) = self.name {
            let needle = name.to_lowercase();
            if !hero.localized_name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        if let Some(ref attack_type) = self.attack_type {
            match hero.attack_type {
                Some(ref t) if t.eq_ignore_ascii_case(attack_type) => {}
                _ => return false,
            }
        }
        self.roles.iter().all(|role| {
            hero.roles
                .iter()
                .any(|have| have.eq_ignore_ascii_case(role))
        })
    }
}

/// One team, as returned by the teams endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub wins: Option<u32>,
    #[serde(default)]
    pub losses: Option<u32>,
}

impl Team {
    /// Name-substring or exact-tag match, case-insensitive.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        let by_name = self
            .name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle));
        let by_tag = self
            .tag
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(query));
        by_name || by_tag
    }
}

/// One league, as returned by the leagues endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub leagueid: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tier: Option<String>,
}

impl League {
    /// Name-substring match, case-insensitive.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&needle))
    }
}

/// One roster entry, as returned by the team players endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPlayer {
    pub account_id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub games_played: Option<u32>,
    #[serde(default)]
    pub wins: Option<u32>,
    #[serde(default)]
    pub is_current_team_member: Option<bool>,
}

/// One column descriptor from the schema introspection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

/// How much of the core data set `update_data` force-refreshes.
///
/// `High` refreshes only fast-moving data (teams); `Medium` adds per-hero
/// benchmarks; `Low` additionally refreshes data that changes very
/// infrequently (constants, heroes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UpdateFrequency {
    Low,
    Medium,
    High,
}
