//! Subtree registration: one subscription per directory.

use std::fs;

use pathwatch::SubtreeRegistrar;
use tempfile::TempDir;

fn registrar() -> SubtreeRegistrar {
    let backend = notify::recommended_watcher(|_res: notify::Result<notify::Event>| {})
        .expect("backend watcher");
    SubtreeRegistrar::new(backend)
}

#[test]
fn test_recursive_registration_covers_every_directory() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("a/b")).unwrap();
    fs::create_dir(root.path().join("c")).unwrap();
    // Files must not get subscriptions of their own
    fs::write(root.path().join("a/file.txt"), "x").unwrap();

    let registry = registrar()
        .register_all(root.path(), true)
        .expect("recursive registration");

    // Root plus the 3 subdirectories
    assert_eq!(registry.len(), 4);
    assert!(registry.handle_for(root.path()).is_some());
    assert!(registry.handle_for(&root.path().join("a")).is_some());
    assert!(registry.handle_for(&root.path().join("a/b")).is_some());
    assert!(registry.handle_for(&root.path().join("c")).is_some());
    assert!(registry.handle_for(&root.path().join("a/file.txt")).is_none());
}

#[test]
fn test_non_recursive_registration_subscribes_root_only() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("sub")).unwrap();

    let registry = registrar()
        .register_all(root.path(), false)
        .expect("registration");

    assert_eq!(registry.len(), 1);
    assert!(registry.handle_for(root.path()).is_some());
    assert!(registry.handle_for(&root.path().join("sub")).is_none());
}

#[test]
fn test_missing_path_aborts_registration() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("does-not-exist");

    assert!(registrar().register_all(&missing, false).is_err());
    assert!(registrar().register_all(&missing, true).is_err());
}
