//! Facade tests: configuration, request handling, and diagnostics.

use pretty_assertions::assert_eq;
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;
use trellis_router::{RouteRequest, Router, RouterConfig, RouterError};

fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    File::create(path).unwrap();
}

fn router_for(tree: &TempDir, store: &TempDir, use_cache: bool) -> Router {
    Router::new(RouterConfig {
        routes_dir: tree.path().to_path_buf(),
        cache_file: store.path().join("routes.json"),
        use_cache,
    })
    .unwrap()
}

#[test]
fn missing_routes_dir_is_rejected() {
    let store = TempDir::new().unwrap();
    let err = Router::new(RouterConfig {
        routes_dir: store.path().join("nope"),
        cache_file: store.path().join("routes.json"),
        use_cache: true,
    })
    .unwrap_err();
    assert!(matches!(err, RouterError::RoutesRootMissing(_)));
}

#[test]
fn resolves_through_the_cache() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "users/[id]/index.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    let request = RouteRequest::parse("GET", "/users/42").unwrap();
    let found = router.resolve(&request).unwrap().unwrap();
    assert!(found.handler_path.ends_with("users/[id]/index.php"));
    assert_eq!(found.params.get("id"), Some(&"42".to_string()));

    assert!(store.path().join("routes.json").exists());
}

#[test]
fn resolves_without_the_cache() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, false);

    let request = RouteRequest::parse("GET", "/about").unwrap();
    assert!(router.resolve(&request).unwrap().is_some());
    assert!(!store.path().join("routes.json").exists());
}

#[test]
fn trailing_slash_matches_the_same_route() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "blog/index.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    let bare = router
        .resolve(&RouteRequest::parse("GET", "/blog").unwrap())
        .unwrap();
    let slashed = router
        .resolve(&RouteRequest::parse("GET", "/blog/").unwrap())
        .unwrap();
    assert_eq!(bare, slashed);
    assert!(bare.is_some());
}

#[test]
fn unmatched_request_is_ok_none() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    let request = RouteRequest::parse("POST", "/about").unwrap();
    assert!(router.resolve(&request).unwrap().is_none());
}

#[test]
fn lists_routes_deduplicated_and_sorted() {
    let tree = TempDir::new().unwrap();
    for file in [
        "index.php",
        "about.php",
        "api/users.php",
        "api/users.post.php",
        "blog/index.php",
        "users/[id]/index.php",
    ] {
        touch(tree.path(), file);
    }
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    assert_eq!(
        router.list_routes(),
        vec!["/", "/about", "/api/users", "/blog", "/users/[id]"]
    );
}

#[test]
fn cache_info_reflects_resolution_state() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    // Nothing built yet.
    assert!(router.cache_info().last_update.is_none());

    router
        .resolve(&RouteRequest::parse("GET", "/about").unwrap())
        .unwrap();

    let info = router.cache_info();
    assert!(info.enabled);
    assert!(info.file_exists);
    assert_eq!(info.route_counts.handlers, 1);
}

#[test]
fn clear_cache_forgets_the_index() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    router
        .resolve(&RouteRequest::parse("GET", "/about").unwrap())
        .unwrap();
    router.clear_cache();

    let info = router.cache_info();
    assert!(!info.file_exists);
    assert!(info.last_update.is_none());

    // Resolution still works, rebuilding on demand.
    assert!(router
        .resolve(&RouteRequest::parse("GET", "/about").unwrap())
        .unwrap()
        .is_some());
}

#[test]
fn router_and_errors_are_debug_printable() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "about.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    let rendered = format!("{router:?}");
    assert!(rendered.contains("Router"));
    assert!(rendered.contains("RouteCache"));
}

#[test]
fn duplicate_dynamic_dirs_surface_as_an_error() {
    let tree = TempDir::new().unwrap();
    touch(tree.path(), "shop/[id]/index.php");
    touch(tree.path(), "shop/[slug]/index.php");
    let store = TempDir::new().unwrap();
    let router = router_for(&tree, &store, true);

    let err = router
        .resolve(&RouteRequest::parse("GET", "/shop/1").unwrap())
        .unwrap_err();
    assert!(matches!(err, RouterError::DuplicateDynamicDir { .. }));
}
