//! Wiremock integration tests for the dispatch pipeline.
//!
//! These verify the cache/limiter/network interplay end to end: hit counts
//! are enforced by mock expectations, so "zero network calls" is asserted
//! by the mock server itself.

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roshan::endpoint::Endpoint;
use roshan::{FileCache, OpenDota, RateLimit, RoshanError};

/// A policy that never makes tests wait.
fn instant_policy() -> RateLimit {
    RateLimit::authenticated()
}

fn client_for(server: &MockServer, dir: &TempDir) -> OpenDota {
    OpenDota::builder()
        .base_url(server.uri())
        .cache_dir(dir.path())
        .rate_limit(instant_policy())
        .build()
        .expect("client should build")
}

#[tokio::test]
async fn player_fetch_is_idempotent_and_cached() {
    let mock_server = MockServer::start().await;
    let body = json!({"profile": {"account_id": 111620041}, "rank_tier": 54});

    Mock::given(method("GET"))
        .and(path("/players/111620041"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let first = client.get_player(111620041).await.unwrap();
    assert_eq!(
        first.get("profile").and_then(|p| p.get("account_id")),
        Some(&json!(111620041))
    );

    // One new cache file appeared.
    let cache = FileCache::new(dir.path());
    let entry = cache.entry_path(
        &Endpoint::Player {
            account_id: 111620041,
        }
        .cache_key(),
    );
    assert!(entry.exists());

    // Second call: identical document, zero additional network calls
    // (the mock expectation of exactly 1 verifies on drop).
    let second = client.get_player(111620041).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn cache_bypass_hits_network_every_time_and_writes_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = OpenDota::builder()
        .base_url(mock_server.uri())
        .cache_dir(dir.path())
        .cache(false)
        .rate_limit(instant_policy())
        .build()
        .unwrap();

    client.get_heroes().await.unwrap();
    client.get_heroes().await.unwrap();

    // No cache side effect observed.
    assert!(
        FileCache::new(dir.path())
            .get(&Endpoint::Heroes.cache_key())
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn cached_read_skips_the_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    // Second uncached call would have to wait a minute; a cached one
    // must return without consulting the limiter at all.
    let client = OpenDota::builder()
        .base_url(mock_server.uri())
        .cache_dir(dir.path())
        .rate_limit(instant_policy().min_interval(Duration::from_secs(60)))
        .build()
        .unwrap();

    client.get_heroes().await.unwrap();
    let cached = tokio::time::timeout(Duration::from_secs(2), client.get_heroes())
        .await
        .expect("cached read must not wait on the rate budget")
        .unwrap();
    assert_eq!(cached, Vec::<serde_json::Value>::new());
}

#[tokio::test]
async fn missing_entity_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/players/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Not Found"})))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let err = client.get_player(1).await.unwrap_err();
    assert!(matches!(err, RoshanError::NotFound(_)), "{err:?}");
    // Failures are never cached.
    assert!(
        FileCache::new(dir.path())
            .get(&Endpoint::Player { account_id: 1 }.cache_key())
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn error_body_under_200_is_not_found_for_lookups() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/matches/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "Not Found"})))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let err = client.get_match(42).await.unwrap_err();
    assert!(matches!(err, RoshanError::NotFound(_)));
}

#[tokio::test]
async fn server_error_propagates_with_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/proMatches"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    // Not retried internally: each call reaches the network once.
    for _ in 0..2 {
        match client.get_pro_matches().await.unwrap_err() {
            RoshanError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal");
            }
            other => panic!("expected Remote, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn empty_team_search_is_ok_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let teams = client.search_team("Alliance").await.unwrap();
    assert!(teams.is_empty());
}

#[tokio::test]
async fn team_search_matches_name_and_tag() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {"team_id": 111471, "name": "Alliance", "tag": "Alliance", "rating": 1400.0},
        {"team_id": 2163,   "name": "Team Liquid", "tag": "Liquid", "rating": 1500.0},
        {"team_id": 1,      "name": null, "tag": null}
    ]);

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let hits = client.search_team("alliance").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].team_id, 111471);

    let hits = client.search_team("liquid").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].team_id, 2163);
}

#[tokio::test]
async fn teams_listing_primes_per_team_entries() {
    let mock_server = MockServer::start().await;
    let body = json!([{"team_id": 111471, "name": "Alliance", "tag": "[A]"}]);

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;
    // No mock for /teams/111471: the lookup must be served from cache.

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    client.get_teams().await.unwrap();
    let team = client.get_team(111471).await.unwrap();
    assert_eq!(team.get("name"), Some(&json!("Alliance")));
}

#[tokio::test]
async fn explorer_rows_round_trip_and_cache() {
    let mock_server = MockServer::start().await;
    let sql = "select count(*) from matches";

    Mock::given(method("GET"))
        .and(path("/explorer"))
        .and(query_param("sql", sql))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"rows": [{"count": 7}], "rowCount": 1})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let rows = client.explorer(sql).await.unwrap();
    assert_eq!(rows, vec![json!({"count": 7})]);

    // Identical query string: cache-hit-equivalent.
    let again = client.explorer(sql).await.unwrap();
    assert_eq!(rows, again);
}

#[tokio::test]
async fn distinct_explorer_queries_do_not_share_entries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/explorer"))
        .and(query_param("sql", "select 1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": [{"n": 1}]})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/explorer"))
        .and(query_param("sql", "select 2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rows": [{"n": 2}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    assert_eq!(client.explorer("select 1").await.unwrap(), vec![json!({"n": 1})]);
    assert_eq!(client.explorer("select 2").await.unwrap(), vec![json!({"n": 2})]);
}

#[tokio::test]
async fn schema_tables_and_columns() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {"table_name": "matches", "column_name": "match_id", "data_type": "bigint"},
        {"table_name": "matches", "column_name": "duration", "data_type": "integer"},
        {"table_name": "players", "column_name": "account_id", "data_type": "bigint"}
    ]);

    Mock::given(method("GET"))
        .and(path("/schema"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let tables = client.get_schema_tables().await.unwrap();
    assert_eq!(tables, vec!["matches".to_string(), "players".to_string()]);

    // Second schema read is served from cache (expect(1) above).
    let columns = client.get_schema("matches").await.unwrap();
    assert_eq!(columns.get("match_id"), Some(&"bigint".to_string()));
    assert_eq!(columns.len(), 2);

    // Unknown tables produce an empty map, not an error.
    assert!(client.get_schema("nonexistent").await.unwrap().is_empty());
}

#[tokio::test]
async fn api_key_travels_as_query_param_but_not_into_cache_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/heroes"))
        .and(query_param("api_key", "secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = OpenDota::builder()
        .base_url(mock_server.uri())
        .cache_dir(dir.path())
        .api_key("secret-key")
        .build()
        .unwrap();

    client.get_heroes().await.unwrap();

    // The cache entry is addressed by the descriptor alone.
    let cache = FileCache::new(dir.path());
    assert!(cache.get(&Endpoint::Heroes.cache_key()).unwrap().is_some());
    let path_str = cache
        .entry_path(&Endpoint::Heroes.cache_key())
        .to_string_lossy()
        .into_owned();
    assert!(!path_str.contains("secret"));
}

#[tokio::test]
async fn corrupt_cache_entry_surfaces_through_dispatch() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    // Plant a malformed document at the key's backing location.
    let cache = FileCache::new(dir.path());
    let entry = cache.entry_path(&Endpoint::Heroes.cache_key());
    std::fs::create_dir_all(entry.parent().unwrap()).unwrap();
    std::fs::write(&entry, "not json at all").unwrap();

    let err = client.get_heroes().await.unwrap_err();
    assert!(matches!(err, RoshanError::CacheCorruption { .. }), "{err:?}");

    // The documented recovery path: clear, then refetch.
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;
    client.clear_cache(Some(&Endpoint::Heroes)).unwrap();
    assert!(client.get_heroes().await.unwrap().is_empty());
}

#[tokio::test]
async fn refresh_overwrites_a_cached_entry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    client.get_heroes().await.unwrap();
    // Refresh skips the cached read and fetches again.
    client.refresh(&Endpoint::Heroes).await.unwrap();
}

#[tokio::test]
async fn parse_request_posts_and_is_never_cached() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/request/271145478"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job": {"jobId": 12345}})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let job = client.request_parse(271145478).await.unwrap();
    assert_eq!(
        job.get("job").and_then(|j| j.get("jobId")),
        Some(&json!(12345))
    );
    // Repeating the mutation repeats the POST.
    client.request_parse(271145478).await.unwrap();
}

#[tokio::test]
async fn live_games_are_never_served_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/live"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    client.get_live().await.unwrap();
    client.get_live().await.unwrap();
}

#[tokio::test]
async fn hero_search_filters_client_side() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {"id": 1, "name": "npc_dota_hero_antimage", "localized_name": "Anti-Mage",
         "primary_attr": "agi", "attack_type": "Melee", "roles": ["Carry", "Escape"]},
        {"id": 2, "name": "npc_dota_hero_axe", "localized_name": "Axe",
         "primary_attr": "str", "attack_type": "Melee", "roles": ["Initiator", "Durable"]},
        {"id": 3, "name": "npc_dota_hero_bane", "localized_name": "Bane",
         "primary_attr": "all", "attack_type": "Ranged", "roles": ["Support", "Disabler"]}
    ]);

    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let melee = client
        .search_hero(&roshan::HeroQuery::new().attack_type("melee"))
        .await
        .unwrap();
    assert_eq!(melee.len(), 2);

    // Second search reuses the cached hero list.
    let carries = client
        .search_hero(&roshan::HeroQuery::new().role("carry"))
        .await
        .unwrap();
    assert_eq!(carries.len(), 1);
    assert_eq!(carries[0].localized_name, "Anti-Mage");
}

#[tokio::test]
async fn current_roster_filter() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {"account_id": 1, "name": "active", "is_current_team_member": true},
        {"account_id": 2, "name": "former", "is_current_team_member": false},
        {"account_id": 3, "name": "unknown", "is_current_team_member": null}
    ]);

    Mock::given(method("GET"))
        .and(path("/teams/111471/players"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let current = client.get_team_players(111471, true).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].account_id, 1);

    let everyone = client.get_team_players(111471, false).await.unwrap();
    assert_eq!(everyone.len(), 3);
}

#[tokio::test]
async fn parse_missing_submits_only_unparsed_matches() {
    let mock_server = MockServer::start().await;
    let matches = json!([
        {"match_id": 10, "version": null},
        {"match_id": 11, "version": 21},
        {"match_id": 12, "version": 5}
    ]);

    Mock::given(method("GET"))
        .and(path("/players/1/matches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&matches))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/request/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {"jobId": 1}})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/request/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job": {"jobId": 2}})))
        .expect(1)
        .mount(&mock_server)
        .await;
    // No mock for /request/11: a parsed match must not be resubmitted.

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let jobs = client.request_parse_missing(1, None).await.unwrap();
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn update_medium_refreshes_teams_and_benchmarks_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"team_id": 5, "name": "Tundra", "tag": "TE"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/heroes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "npc_dota_hero_antimage", "localized_name": "Anti-Mage"}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/benchmarks"))
        .and(query_param("hero_id", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"hero_id": 1, "result": {}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    // No mock for /constants: the medium tier must not touch them.

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    client
        .update_data(roshan::UpdateFrequency::Medium)
        .await
        .unwrap();

    // The refreshed team list primed the per-team entry.
    let team = client.get_team(5).await.unwrap();
    assert_eq!(team.get("name"), Some(&json!("Tundra")));
}

#[tokio::test]
async fn constants_fetch_named_resources() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/constants/game_mode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"1": {"name": "all_pick"}})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/constants/patch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "7.36"}])))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let client = client_for(&mock_server, &dir);

    let constants = client.get_constants(&["game_mode", "patch"]).await.unwrap();
    assert_eq!(constants.len(), 2);
    assert!(constants.get("game_mode").unwrap().is_object());
    assert!(constants.get("patch").unwrap().is_array());
}
