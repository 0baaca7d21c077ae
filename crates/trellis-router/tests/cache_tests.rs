//! Cache lifecycle tests: persistence, staleness, corruption, fallback.

use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;
use trellis_router::cache::{CacheRecord, RouteCache};
use trellis_router::index::RouteIndex;
use trellis_router::resolver::resolve_with_index;
use trellis_router::Method;

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap();
}

#[test]
fn record_survives_a_json_round_trip() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "index.php");
    touch(tree.path(), "api/users.post.php");
    touch(tree.path(), "users/[id]/index.php");
    touch(tree.path(), "users/[id]/posts/[post_id].delete.php");
    touch(tree.path(), "products/[category]-[id].php");

    let record = CacheRecord {
        built_at_ms: 1_700_000_000_000,
        index: RouteIndex::build(tree.path()).unwrap(),
    };

    let json = serde_json::to_string_pretty(&record).unwrap();
    let back: CacheRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(record, back);
}

#[test]
fn deserialized_index_resolves_like_the_original() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "users/[id]/index.php");

    let index = RouteIndex::build(tree.path()).unwrap();
    let json = serde_json::to_string(&index).unwrap();
    let back: RouteIndex = serde_json::from_str(&json).unwrap();

    let resolved = resolve_with_index(&back, &["users", "42"], Method::Get).unwrap();
    assert_eq!(resolved.params.get("id"), Some(&"42".to_string()));
}

#[test]
fn load_or_build_persists_a_record() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let cache_file = store.path().join("routes.json");

    let cache = RouteCache::new(cache_file.clone(), true);
    let index = cache.load_or_build(tree.path()).unwrap();

    assert_eq!(index.handler_count(), 1);
    assert!(cache_file.exists());

    let raw = fs::read_to_string(&cache_file).unwrap();
    let record: CacheRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.index, *index);
}

#[test]
fn fresh_record_is_reused_without_rebuilding() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();

    let cache = RouteCache::new(store.path().join("routes.json"), true);
    cache.load_or_build(tree.path()).unwrap();
    let first = cache.info().last_update.unwrap();

    thread::sleep(Duration::from_millis(20));
    cache.load_or_build(tree.path()).unwrap();
    let second = cache.info().last_update.unwrap();

    assert_eq!(first, second);
}

#[test]
fn persisted_record_is_shared_across_instances() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let cache_file = store.path().join("routes.json");

    let writer = RouteCache::new(cache_file.clone(), true);
    writer.load_or_build(tree.path()).unwrap();
    let built = writer.info().last_update.unwrap();

    thread::sleep(Duration::from_millis(20));
    let reader = RouteCache::new(cache_file, true);
    let index = reader.load_or_build(tree.path()).unwrap();

    assert_eq!(index.handler_count(), 1);
    // Loaded from disk, not rebuilt.
    assert_eq!(reader.info().last_update.unwrap(), built);
}

#[test]
fn new_route_file_triggers_a_rebuild() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();

    let cache = RouteCache::new(store.path().join("routes.json"), true);
    let index = cache.load_or_build(tree.path()).unwrap();
    assert_eq!(index.handler_count(), 1);
    let first = cache.info().last_update.unwrap();

    thread::sleep(Duration::from_millis(20));
    touch(tree.path(), "contact.php");

    let index = cache.load_or_build(tree.path()).unwrap();
    assert_eq!(index.handler_count(), 2);
    assert!(cache.info().last_update.unwrap() > first);
}

#[test]
fn is_stale_compares_against_newest_mtime() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");

    assert!(RouteCache::is_stale(tree.path(), 0));
    let far_future = u64::MAX / 2;
    assert!(!RouteCache::is_stale(tree.path(), far_future));
}

#[test]
fn corrupt_record_is_discarded_and_rebuilt() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let cache_file = store.path().join("routes.json");
    fs::write(&cache_file, "{ not json").unwrap();

    let cache = RouteCache::new(cache_file.clone(), true);
    let index = cache.load_or_build(tree.path()).unwrap();

    assert_eq!(index.handler_count(), 1);
    // The rebuild overwrote the corrupt record with a valid one.
    let raw = fs::read_to_string(&cache_file).unwrap();
    assert!(serde_json::from_str::<CacheRecord>(&raw).is_ok());
}

#[test]
fn disabled_cache_never_touches_disk() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let cache_file = store.path().join("routes.json");

    let cache = RouteCache::new(cache_file.clone(), false);
    let index = cache.load_or_build(tree.path()).unwrap();

    assert_eq!(index.handler_count(), 1);
    assert!(!cache_file.exists());
    assert!(!cache.info().enabled);
}

#[test]
fn unusable_cache_location_falls_back_to_temp_dir() {
    let store = TempDir::new().unwrap();
    let not_a_dir = store.path().join("plain_file");
    fs::write(&not_a_dir, "occupied").unwrap();

    let cache = RouteCache::new(not_a_dir.join("routes.json"), true);
    assert!(cache.cache_file().starts_with(std::env::temp_dir()));
}

#[test]
fn clear_removes_record_and_snapshot() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let cache_file = store.path().join("routes.json");

    let cache = RouteCache::new(cache_file.clone(), true);
    cache.load_or_build(tree.path()).unwrap();
    assert!(cache_file.exists());

    cache.clear();
    assert!(!cache_file.exists());

    let info = cache.info();
    assert!(info.last_update.is_none());
    assert!(!info.file_exists);
    assert_eq!(info.route_counts.handlers, 0);
}

#[test]
fn info_reports_counts_after_a_build() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "index.php");
    touch(tree.path(), "api/users.php");
    touch(tree.path(), "users/[id]/index.php");
    let store = TempDir::new().unwrap();

    let cache = RouteCache::new(store.path().join("routes.json"), true);
    cache.load_or_build(tree.path()).unwrap();

    let info = cache.info();
    assert!(info.enabled);
    assert!(info.file_exists);
    assert!(info.file_size > 0);
    assert_eq!(info.route_counts.handlers, 3);
    assert_eq!(info.route_counts.dynamic_dirs, 1);
    // Root, api, users, users/[id].
    assert_eq!(info.route_counts.prefixes, 4);
}
