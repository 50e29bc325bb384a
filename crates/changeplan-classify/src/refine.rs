use std::collections::{HashMap, HashSet, VecDeque};

use changeplan_core::{Change, CommitType};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::Result;
use crate::classifier::ClassifyOptions;
use crate::error::ClassifyError;

/// Applies author filtering, merge collapsing, revert collapsing and type
/// filters, in that order. Input order is preserved for surviving changes.
///
/// # Errors
///
/// Returns `ClassifyError::InvalidAuthorPattern` if an ignore-author pattern
/// is not a valid glob.
pub fn refine(changes: Vec<Change>, options: &ClassifyOptions) -> Result<Vec<Change>> {
    // ancestry of the full batch, before anything is dropped
    let parents: HashMap<String, Vec<String>> = changes
        .iter()
        .map(|c| (c.sha.clone(), c.parents.clone()))
        .collect();

    let mut changes = filter_authors(changes, &options.ignore_authors)?;

    if options.collapse_merges {
        changes = collapse_merges(changes, &parents, options.prefer_merge_summary);
    }
    if options.collapse_reverts {
        changes = collapse_reverts(changes);
    }

    Ok(changes
        .into_iter()
        .filter(|c| {
            options.include_types.is_empty() || options.include_types.contains(&c.commit_type)
        })
        .filter(|c| !options.exclude_types.contains(&c.commit_type))
        .collect())
}

fn author_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ClassifyError::InvalidAuthorPattern {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| ClassifyError::InvalidAuthorPattern {
            pattern: patterns.join(", "),
            source,
        })
}

fn filter_authors(changes: Vec<Change>, patterns: &[String]) -> Result<Vec<Change>> {
    if patterns.is_empty() {
        return Ok(changes);
    }
    let globs = author_globs(patterns)?;

    Ok(changes
        .into_iter()
        .filter(|change| {
            let author = &change.author;
            let ignored = globs.is_match(&author.name)
                || author.email.as_deref().is_some_and(|e| globs.is_match(e))
                || globs.is_match(author.to_string());
            if ignored {
                debug!(sha = %change.sha, author = %author, "skipping commit from ignored author");
            }
            !ignored
        })
        .collect())
}

fn severity(change: &Change) -> u8 {
    if change.is_breaking() {
        return 5;
    }
    match change.commit_type {
        CommitType::Feat => 4,
        CommitType::Fix => 3,
        CommitType::Perf => 2,
        _ => 1,
    }
}

fn type_rank(commit_type: CommitType) -> u8 {
    match commit_type {
        CommitType::Feat => 4,
        CommitType::Fix => 3,
        CommitType::Perf => 2,
        _ => 1,
    }
}

/// Commits in the batch reachable from `starts`, following parent links.
fn reachable<'a>(starts: &'a [String], parents: &'a HashMap<String, Vec<String>>) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    let mut queue: VecDeque<&str> = starts.iter().map(String::as_str).collect();

    while let Some(sha) = queue.pop_front() {
        let Some(next) = parents.get(sha) else {
            continue;
        };
        if seen.insert(sha) {
            queue.extend(next.iter().map(String::as_str));
        }
    }
    seen
}

fn collapse_merges(
    changes: Vec<Change>,
    parents: &HashMap<String, Vec<String>>,
    prefer_merge_summary: bool,
) -> Vec<Change> {
    let mut slots: Vec<Option<Change>> = changes.into_iter().map(Some).collect();
    let position: HashMap<String, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.as_ref().map(|c| (c.sha.clone(), i)))
        .collect();

    for index in 0..slots.len() {
        let Some(merge) = slots[index].as_ref() else {
            continue;
        };
        if !merge.is_merge || merge.parents.len() < 2 {
            continue;
        }

        let mainline = reachable(&merge.parents[..1], parents);
        let branch = reachable(&merge.parents[1..], parents);
        let mut members: Vec<usize> = branch
            .difference(&mainline)
            .filter_map(|sha| position.get(*sha).copied())
            .filter(|&i| i < index && slots[i].is_some())
            .collect();
        members.sort_unstable();

        if members.is_empty() {
            continue;
        }

        let constituents: Vec<Change> = members.iter().filter_map(|&i| slots[i].take()).collect();
        if let Some(merge) = slots[index].take() {
            debug!(
                sha = %merge.sha,
                folded = constituents.len(),
                "collapsing merge constituents"
            );
            slots[index] = Some(fold_merge(merge, constituents, prefer_merge_summary));
        }
    }

    slots.into_iter().flatten().collect()
}

fn fold_merge(mut merge: Change, constituents: Vec<Change>, prefer_merge_summary: bool) -> Change {
    let dominant = constituents
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| severity(a).cmp(&severity(b)).then(ib.cmp(ia)))
        .map(|(_, c)| c.clone());

    if let Some(dominant) = dominant {
        if type_rank(dominant.commit_type) > type_rank(merge.commit_type) {
            merge.commit_type = dominant.commit_type;
        }
        if !prefer_merge_summary {
            merge.scope = dominant.scope;
            merge.subject = dominant.subject;
            merge.body = dominant.body;
        }
    }

    for change in constituents {
        merge.breaking.extend(change.breaking);
        for reference in change.references {
            if !merge.references.contains(&reference) {
                merge.references.push(reference);
            }
        }
        let mut authors = change.co_authors;
        authors.insert(0, change.author);
        for author in authors {
            if author != merge.author && !merge.co_authors.contains(&author) {
                merge.co_authors.push(author);
            }
        }
        merge.packages.extend(change.packages);
        merge.files_changed.extend(change.files_changed);
    }

    merge
}

/// Drops reverts together with what they cancel. A chain of reverts resolves
/// by parity: the commit at its root survives when the chain has an even
/// number of reverts.
fn collapse_reverts(changes: Vec<Change>) -> Vec<Change> {
    let mut dropped = vec![false; changes.len()];
    let mut reverted = vec![false; changes.len()];
    let mut target_of: Vec<Option<usize>> = vec![None; changes.len()];

    for index in 0..changes.len() {
        let Some(target) = changes[index].revert_of.as_deref() else {
            continue;
        };
        let Some(target_index) = (0..index)
            .rev()
            .find(|&i| !reverted[i] && changes[i].matches_sha(target))
        else {
            continue;
        };
        reverted[target_index] = true;
        target_of[index] = Some(target_index);
        dropped[index] = true;

        let mut root = target_index;
        let mut depth = 1;
        while let Some(next) = target_of[root] {
            root = next;
            depth += 1;
        }
        dropped[root] = depth % 2 == 1;
        debug!(
            revert = %changes[index].sha,
            root = %changes[root].sha,
            restored = !dropped[root],
            "collapsing revert chain"
        );
    }

    changes
        .into_iter()
        .zip(dropped)
        .filter_map(|(change, dropped)| (!dropped).then_some(change))
        .collect()
}
