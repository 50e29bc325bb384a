use changeplan_core::{Change, CommitType};

/// Changes of one type, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeGroup<'a> {
    pub commit_type: CommitType,
    pub changes: Vec<&'a Change>,
}

/// Groups changes by type in section order. Empty groups are omitted.
#[must_use]
pub fn group_changes(changes: &[Change]) -> Vec<ChangeGroup<'_>> {
    CommitType::ORDERED
        .into_iter()
        .map(|commit_type| ChangeGroup {
            commit_type,
            changes: changes
                .iter()
                .filter(|c| c.commit_type == commit_type)
                .collect(),
        })
        .filter(|group| !group.changes.is_empty())
        .collect()
}
