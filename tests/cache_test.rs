//! Tests for [`FileCache`] — durable file-per-key document storage.

use std::fs;

use serde_json::json;
use tempfile::TempDir;

use roshan::endpoint::Endpoint;
use roshan::{FileCache, RoshanError};

fn player_key() -> roshan::CacheKey {
    Endpoint::Player {
        account_id: 111620041,
    }
    .cache_key()
}

#[test]
fn miss_is_none_not_an_error() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    assert!(cache.get(&player_key()).unwrap().is_none());
}

#[test]
fn put_then_get_round_trips() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let doc = json!({"profile": {"account_id": 111620041}});

    cache.put(&player_key(), &doc).unwrap();
    assert_eq!(cache.get(&player_key()).unwrap(), Some(doc));
}

#[test]
fn put_creates_nested_directories() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path().join("deep").join("root"));
    cache.put(&player_key(), &json!([])).unwrap();

    let path = cache.entry_path(&player_key());
    assert!(path.exists());
    assert!(path.starts_with(dir.path().join("deep").join("root")));
}

#[test]
fn overwrite_replaces_entry() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());

    cache.put(&player_key(), &json!({"v": 1})).unwrap();
    cache.put(&player_key(), &json!({"v": 2})).unwrap();

    assert_eq!(cache.get(&player_key()).unwrap(), Some(json!({"v": 2})));
}

#[test]
fn corrupt_entry_surfaces_not_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let path = cache.entry_path(&player_key());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "{ this is not json").unwrap();

    let err = cache.get(&player_key()).unwrap_err();
    match err {
        RoshanError::CacheCorruption { key, .. } => {
            assert_eq!(key, "players/111620041");
        }
        other => panic!("expected CacheCorruption, got {other:?}"),
    }
}

#[test]
fn truncated_entry_surfaces_too() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let path = cache.entry_path(&player_key());
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    // The front half of a valid document.
    fs::write(&path, r#"{"profile": {"account_id":"#).unwrap();

    assert!(matches!(
        cache.get(&player_key()),
        Err(RoshanError::CacheCorruption { .. })
    ));
}

#[test]
fn no_temp_file_remains_after_put() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    cache.put(&player_key(), &json!({"v": 1})).unwrap();

    let parent = cache.entry_path(&player_key());
    let names: Vec<String> = fs::read_dir(parent.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
}

#[test]
fn clear_one_entry_leaves_others() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let heroes = Endpoint::Heroes.cache_key();

    cache.put(&player_key(), &json!({"v": 1})).unwrap();
    cache.put(&heroes, &json!([])).unwrap();

    cache.clear(Some(&player_key())).unwrap();
    assert!(cache.get(&player_key()).unwrap().is_none());
    assert!(cache.get(&heroes).unwrap().is_some());
}

#[test]
fn clear_all_removes_everything() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());

    cache.put(&player_key(), &json!({"v": 1})).unwrap();
    cache.put(&Endpoint::Heroes.cache_key(), &json!([])).unwrap();

    cache.clear(None).unwrap();
    assert!(cache.get(&player_key()).unwrap().is_none());
    assert!(cache.get(&Endpoint::Heroes.cache_key()).unwrap().is_none());
}

#[test]
fn clear_missing_entry_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    cache.clear(Some(&player_key())).unwrap();
    cache.clear(None).unwrap();
}

#[test]
fn explorer_keys_map_to_distinct_files() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let a = Endpoint::Explorer {
        sql: "select 1".into(),
    }
    .cache_key();
    let b = Endpoint::Explorer {
        sql: "SELECT 1".into(),
    }
    .cache_key();

    cache.put(&a, &json!([{"n": 1}])).unwrap();
    cache.put(&b, &json!([{"n": 2}])).unwrap();

    assert_ne!(cache.entry_path(&a), cache.entry_path(&b));
    assert_eq!(cache.get(&a).unwrap(), Some(json!([{"n": 1}])));
    assert_eq!(cache.get(&b).unwrap(), Some(json!([{"n": 2}])));
}

#[test]
fn hostile_key_stays_inside_the_root() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let key = Endpoint::Explorer {
        sql: "../../../../etc/passwd".into(),
    }
    .cache_key();

    cache.put(&key, &json!({"owned": false})).unwrap();
    assert!(cache.entry_path(&key).starts_with(dir.path()));
    assert_eq!(cache.get(&key).unwrap(), Some(json!({"owned": false})));
}

#[test]
fn very_long_sql_still_stores_and_loads() {
    let dir = TempDir::new().unwrap();
    let cache = FileCache::new(dir.path());
    let sql = format!(
        "select * from matches where match_id in ({})",
        (0..200).map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
    );
    let key = Endpoint::Explorer { sql }.cache_key();

    cache.put(&key, &json!([])).unwrap();
    assert_eq!(cache.get(&key).unwrap(), Some(json!([])));
}

#[test]
fn concurrent_readers_never_see_partial_writes() {
    use std::sync::Arc;
    use std::thread;

    let dir = TempDir::new().unwrap();
    let cache = Arc::new(FileCache::new(dir.path()));
    let key = Arc::new(player_key());

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = Arc::clone(&cache);
        let key = Arc::clone(&key);
        handles.push(thread::spawn(move || {
            for round in 0..20 {
                cache.put(&key, &json!({"writer": i, "round": round})).unwrap();
                // Whatever we read back must be a complete document.
                if let Some(doc) = cache.get(&key).unwrap() {
                    assert!(doc.get("writer").is_some());
                    assert!(doc.get("round").is_some());
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("thread panicked");
    }
}
