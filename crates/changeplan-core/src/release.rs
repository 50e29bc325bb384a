use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BreakingChange, BumpLevel, BumpReason, Change, CommitType, GitRange};

/// Manifest schema version written by this engine. Readers reject anything else.
pub const SCHEMA_VERSION: &str = "1.0";

/// A policy override that changed the computed bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub rule: String,
    pub requested: BumpLevel,
    pub applied: BumpLevel,
}

/// Release decision for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRelease {
    pub name: String,
    pub prev: String,
    pub next: String,
    pub bump: BumpLevel,
    pub reason: BumpReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ripple_from: Option<Vec<String>>,
    #[serde(default)]
    pub breaking: Vec<BreakingChange>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub breaking_count: usize,
    pub by_type: BTreeMap<CommitType, usize>,
}

/// Immutable record of one planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseManifest {
    pub schema_version: String,
    pub range: GitRange,
    pub timestamp: DateTime<Utc>,
    pub packages: Vec<PackageRelease>,
    pub workspace: WorkspaceSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity: Option<BTreeMap<String, String>>,
}

impl ReleaseManifest {
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&PackageRelease> {
        self.packages.iter().find(|p| p.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
