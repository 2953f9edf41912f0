//! Public types for the Roshan API.

mod document;
mod models;

pub use document::{Document, Record};
pub use models::{Hero, HeroQuery, League, SchemaField, Team, TeamPlayer, UpdateFrequency};
