use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use aurdesk_core::PackageRecord;
use aurdesk_store::LocalStore;

use crate::{first_unresolved, DepCache};

#[test]
fn resolvable_dependencies_report_nothing_unresolved() {
    let (base, store) = fixture_store(&["pcre2", "git"]);

    let mut record = PackageRecord::new("tool", "1.0-1");
    record.depends = vec!["pcre2>=10.0".to_string()];
    record.make_depends = vec!["git".to_string()];

    let cache = DepCache::new();
    assert_eq!(first_unresolved(&record, &store, &cache), None);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn the_first_unresolved_dependency_short_circuits() {
    let (base, store) = fixture_store(&["present"]);

    let mut record = PackageRecord::new("tool", "1.0-1");
    record.depends = vec![
        "present".to_string(),
        "missing-one>=2".to_string(),
        "missing-two".to_string(),
    ];

    let cache = DepCache::new();
    assert_eq!(
        first_unresolved(&record, &store, &cache),
        Some("missing-one>=2")
    );
    assert_eq!(cache.lookup("present"), Some(true));
    assert_eq!(cache.lookup("missing-one"), Some(false));
    assert_eq!(
        cache.lookup("missing-two"),
        None,
        "short circuit must stop before later dependencies"
    );

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn version_clauses_are_stripped_before_lookup() {
    let (base, store) = fixture_store(&["pcre2"]);

    let mut record = PackageRecord::new("tool", "1.0-1");
    record.depends = vec!["pcre2<11".to_string()];

    let cache = DepCache::new();
    assert_eq!(first_unresolved(&record, &store, &cache), None);
    assert_eq!(cache.lookup("pcre2"), Some(true));
    assert_eq!(cache.lookup("pcre2<11"), None);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn cached_verdicts_win_over_fresh_store_lookups() {
    let (base, store) = fixture_store(&["pcre2"]);

    let cache = DepCache::new();
    cache.record("pcre2", false);

    let mut record = PackageRecord::new("tool", "1.0-1");
    record.depends = vec!["pcre2".to_string()];
    assert_eq!(first_unresolved(&record, &store, &cache), Some("pcre2"));

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn cache_entries_are_write_once() {
    let cache = DepCache::new();
    cache.record("dep", true);
    cache.record("dep", false);
    assert_eq!(cache.lookup("dep"), Some(true));
}

#[test]
fn make_depends_are_checked_after_run_depends() {
    let (base, store) = fixture_store(&["runtime"]);

    let mut record = PackageRecord::new("tool", "1.0-1");
    record.depends = vec!["runtime".to_string()];
    record.make_depends = vec!["buildtool".to_string()];

    let cache = DepCache::new();
    assert_eq!(first_unresolved(&record, &store, &cache), Some("buildtool"));

    let _ = fs::remove_dir_all(&base);
}

fn fixture_store(installed: &[&str]) -> (PathBuf, LocalStore) {
    let base = test_base();
    let root = base.join("root");
    let db = base.join("db");
    fs::create_dir_all(&root).expect("must create root dir");
    fs::create_dir_all(db.join("local")).expect("must create local db dir");
    for name in installed {
        write_entry(&db, name, "1.0-1");
    }

    let store = LocalStore::open(&root, &db).expect("must open store");
    (base, store)
}

fn write_entry(db: &Path, name: &str, version: &str) {
    let entry_dir = db.join("local").join(format!("{name}-{version}"));
    fs::create_dir_all(&entry_dir).expect("must create entry dir");
    fs::write(
        entry_dir.join("desc"),
        format!("%NAME%\n{name}\n\n%VERSION%\n{version}\n"),
    )
    .expect("must write desc");
}

fn test_base() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    path.push(format!(
        "aurdesk-resolver-tests-{}-{}",
        std::process::id(),
        nanos
    ));
    path
}
