//! rosh — OpenDota API client CLI
//!
//! One subcommand per client method; prints the returned document as
//! pretty JSON. Each error kind exits with its own non-zero code.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use roshan::{HeroQuery, OpenDota, Result, UpdateFrequency};

/// OpenDota CLI client
#[derive(Parser)]
#[command(name = "rosh")]
#[command(version = roshan::PKG_VERSION)]
#[command(about = "OpenDota match-data API client")]
struct Args {
    /// API key; grants the higher rate ceiling
    #[arg(long, env = "OPENDOTA_API_KEY")]
    api_key: Option<String>,

    /// Cache root directory (default: ~/.cache/roshan)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Bypass the on-disk cache for this invocation
    #[arg(long)]
    no_cache: bool,

    /// API base URL
    #[arg(long, default_value = roshan::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match details
    Match {
        match_id: u64,
    },

    /// Recent professional matches
    ProMatches,

    /// Top currently ongoing live games
    Live,

    /// Player profile
    Player {
        account_id: u64,
    },

    /// Professional players
    ProPlayers,

    /// Heroes played by a player
    PlayerHeroes {
        account_id: u64,
    },

    /// Matches played by a player
    PlayerMatches {
        account_id: u64,
        /// Limit to the last N days
        #[arg(long)]
        days: Option<u32>,
    },

    /// Player rating history
    PlayerRatings {
        account_id: u64,
    },

    /// Player hero rankings
    PlayerRankings {
        account_id: u64,
    },

    /// Hero data
    Heroes,

    /// Hero performance in recent matches
    HeroStats,

    /// Benchmarks for one hero
    Benchmarks {
        hero_id: u32,
    },

    /// Leagues
    Leagues,

    /// Teams
    Teams,

    /// One team
    Team {
        team_id: u64,
    },

    /// Matches for a team
    TeamMatches {
        team_id: u64,
    },

    /// Players who have played for a team
    TeamPlayers {
        team_id: u64,
        /// Include past roster members
        #[arg(long)]
        all: bool,
    },

    /// Heroes played by a team
    TeamHeroes {
        team_id: u64,
    },

    /// Static game data; no names fetches every resource
    Constants {
        resources: Vec<String>,
    },

    /// Search heroes by name, attack type, or roles
    SearchHero {
        /// Localized-name substring
        #[arg(long)]
        name: Option<String>,
        /// "Melee" or "Ranged"
        #[arg(long)]
        attack_type: Option<String>,
        /// Required role; may be given multiple times
        #[arg(long)]
        role: Vec<String>,
    },

    /// Search leagues by name
    SearchLeague {
        query: String,
    },

    /// Search teams by name or tag
    SearchTeam {
        query: String,
    },

    /// Remote player search
    SearchPlayer {
        query: String,
    },

    /// Database schema: table names, or columns of one table
    Schema {
        table: Option<String>,
    },

    /// Submit a free-form SQL query to the explorer endpoint
    Explorer {
        sql: String,
    },

    /// Submit a match parse request
    RequestParse {
        match_id: u64,
    },

    /// Poll a parse job
    RequestStatus {
        job_id: String,
    },

    /// Force-refresh the core data set
    Update {
        #[arg(value_enum, default_value = "high")]
        frequency: Frequency,
    },

    /// Remove every cached entry
    ClearCache,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Frequency {
    Low,
    Medium,
    High,
}

impl From<Frequency> for UpdateFrequency {
    fn from(f: Frequency) -> Self {
        match f {
            Frequency::Low => UpdateFrequency::Low,
            Frequency::Medium => UpdateFrequency::Medium,
            Frequency::High => UpdateFrequency::High,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut builder = OpenDota::builder()
        .base_url(args.base_url)
        .cache(!args.no_cache);
    if let Some(api_key) = args.api_key {
        builder = builder.api_key(api_key);
    }
    if let Some(cache_dir) = args.cache_dir {
        builder = builder.cache_dir(cache_dir);
    }
    let client = builder.build()?;

    match args.command {
        Command::Match { match_id } => print_json(&client.get_match(match_id).await?),
        Command::ProMatches => print_json(&client.get_pro_matches().await?),
        Command::Live => print_json(&client.get_live().await?),
        Command::Player { account_id } => print_json(&client.get_player(account_id).await?),
        Command::ProPlayers => print_json(&client.get_pro_players().await?),
        Command::PlayerHeroes { account_id } => {
            print_json(&client.get_player_heroes(account_id).await?)
        }
        Command::PlayerMatches { account_id, days } => {
            print_json(&client.get_player_matches(account_id, days).await?)
        }
        Command::PlayerRatings { account_id } => {
            print_json(&client.get_player_ratings(account_id).await?)
        }
        Command::PlayerRankings { account_id } => {
            print_json(&client.get_player_rankings(account_id).await?)
        }
        Command::Heroes => print_json(&client.get_heroes().await?),
        Command::HeroStats => print_json(&client.get_hero_stats().await?),
        Command::Benchmarks { hero_id } => print_json(&client.get_hero_benchmarks(hero_id).await?),
        Command::Leagues => print_json(&client.get_leagues().await?),
        Command::Teams => print_json(&client.get_teams().await?),
        Command::Team { team_id } => print_json(&client.get_team(team_id).await?),
        Command::TeamMatches { team_id } => print_json(&client.get_team_matches(team_id).await?),
        Command::TeamPlayers { team_id, all } => {
            print_json(&client.get_team_players(team_id, !all).await?)
        }
        Command::TeamHeroes { team_id } => print_json(&client.get_team_heroes(team_id).await?),
        Command::Constants { resources } => {
            let names: Vec<&str> = resources.iter().map(String::as_str).collect();
            print_json(&client.get_constants(&names).await?)
        }
        Command::SearchHero {
            name,
            attack_type,
            role,
        } => {
            let mut query = HeroQuery::new();
            if let Some(name) = name {
                query = query.name(name);
            }
            if let Some(attack_type) = attack_type {
                query = query.attack_type(attack_type);
            }
            for role in role {
                query = query.role(role);
            }
            print_json(&client.search_hero(&query).await?)
        }
        Command::SearchLeague { query } => print_json(&client.search_league(&query).await?),
        Command::SearchTeam { query } => print_json(&client.search_team(&query).await?),
        Command::SearchPlayer { query } => print_json(&client.search_player(&query).await?),
        Command::Schema { table } => match table {
            Some(table) => print_json(&client.get_schema(&table).await?),
            None => print_json(&client.get_schema_tables().await?),
        },
        Command::Explorer { sql } => print_json(&client.explorer(&sql).await?),
        Command::RequestParse { match_id } => print_json(&client.request_parse(match_id).await?),
        Command::RequestStatus { job_id } => print_json(&client.request_status(&job_id).await?),
        Command::Update { frequency } => client.update_data(frequency.into()).await,
        Command::ClearCache => client.clear_cache(None),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(version = roshan::version_string(), "rosh starting");
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("rosh: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
