use std::collections::BTreeSet;

use changeplan_cache::{CacheError, ChangeCache, acquire_lock, is_valid, load, save};
use changeplan_core::{Author, Change, CommitGraph, CommitType, GitRange, RawCommit};

fn change(sha: &str, commit_type: CommitType, package: &str) -> Change {
    Change {
        sha: sha.to_string(),
        commit_type,
        scope: None,
        subject: format!("{commit_type} in {package}"),
        body: Some("details".to_string()),
        breaking: Vec::new(),
        references: Vec::new(),
        author: Author::new("Ada").with_email("ada@example.com"),
        co_authors: Vec::new(),
        packages: BTreeSet::from([package.to_string()]),
        files_changed: BTreeSet::from([format!("crates/{package}/src/lib.rs")]),
        timestamp: "2025-01-15T10:00:00Z".to_string(),
        is_merge: false,
        is_revert: false,
        revert_of: None,
        cherry_pick_of: None,
        parents: Vec::new(),
        links: None,
    }
}

fn history() -> CommitGraph {
    CommitGraph::from_commits(&[
        RawCommit::new("aaaaaaa1", "chore: root"),
        RawCommit::new("bbbbbbb2", "feat: a").with_parents(["aaaaaaa1"]),
        RawCommit::new("ccccccc3", "fix: b").with_parents(["bbbbbbb2"]),
        RawCommit::new("ddddddd4", "fix: c").with_parents(["ccccccc3"]),
    ])
}

#[test]
fn save_then_load_round_trips() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cache = ChangeCache::new("graph-1", "ccccccc3");
    cache.merge_classified([
        change("bbbbbbb2", CommitType::Feat, "core"),
        change("ccccccc3", CommitType::Fix, "api"),
    ]);
    cache.update_last_tag("core", "core-v1.0.0", "aaaaaaa1");

    let lock = acquire_lock(dir.path())?;
    save(&lock, &cache);
    drop(lock);

    let loaded = load(dir.path()).expect("cache should load");
    assert_eq!(loaded, cache);
    Ok(())
}

#[test]
fn graph_hash_change_invalidates_until_rebuilt() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let range = GitRange::new(Some("aaaaaaa1"), "ccccccc3");
    let lock = acquire_lock(dir.path())?;
    save(&lock, &ChangeCache::new("graph-1", "ccccccc3"));

    assert!(is_valid(dir.path(), &range, Some("graph-1"), Some("ccccccc3"), &history()));
    assert!(!is_valid(dir.path(), &range, Some("graph-2"), Some("ccccccc3"), &history()));
    assert!(is_valid(dir.path(), &range, Some("graph-1"), Some("ccccccc3"), &history()));

    save(&lock, &ChangeCache::new("graph-2", "ccccccc3"));

    assert!(is_valid(dir.path(), &range, Some("graph-2"), Some("ccccccc3"), &history()));
    assert!(!is_valid(dir.path(), &range, Some("graph-1"), Some("ccccccc3"), &history()));
    Ok(())
}

#[test]
fn head_must_descend_from_cached_head() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lock = acquire_lock(dir.path())?;
    save(&lock, &ChangeCache::new("graph-1", "ccccccc3"));

    let forward = GitRange::new(Some("aaaaaaa1"), "ddddddd4");
    let behind = GitRange::new(Some("aaaaaaa1"), "bbbbbbb2");

    assert!(is_valid(dir.path(), &forward, None, Some("ddddddd4"), &history()));
    assert!(!is_valid(dir.path(), &behind, None, Some("bbbbbbb2"), &history()));
    Ok(())
}

#[test]
fn missing_cache_is_invalid() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let range = GitRange::new(None, "HEAD");

    assert!(!is_valid(dir.path(), &range, None, None, &history()));
    Ok(())
}

#[test]
fn concurrent_writer_sees_contention() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut first = acquire_lock(dir.path())?;

    let second = acquire_lock(dir.path());
    assert!(matches!(second, Err(CacheError::LockContention { .. })));

    first.release();
    let third = acquire_lock(dir.path());
    assert!(third.is_ok());
    Ok(())
}
