use std::collections::BTreeMap;

use changeplan_core::ReleaseManifest;
use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256-";

/// `sha256-<hex>` digest of an artifact.
#[must_use]
pub fn digest(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{PREFIX}{}", hex::encode(hasher.finalize()))
}

/// Returns a copy of `manifest` whose integrity map covers `artifacts`.
///
/// Existing entries for other artifacts are kept.
#[must_use]
pub fn with_integrity<'a, I, B>(manifest: ReleaseManifest, artifacts: I) -> ReleaseManifest
where
    I: IntoIterator<Item = (&'a str, B)>,
    B: AsRef<[u8]>,
{
    let mut integrity = manifest.integrity.clone().unwrap_or_default();
    for (name, contents) in artifacts {
        integrity.insert(name.to_string(), digest(contents.as_ref()));
    }

    ReleaseManifest {
        integrity: (!integrity.is_empty()).then_some(integrity),
        ..manifest
    }
}

/// Whether `contents` matches the recorded digest for `name`.
#[must_use]
pub fn verify_integrity(manifest: &ReleaseManifest, name: &str, contents: &[u8]) -> bool {
    manifest
        .integrity
        .as_ref()
        .and_then(|entries: &BTreeMap<String, String>| entries.get(name))
        .is_some_and(|recorded| *recorded == digest(contents))
}

#[cfg(test)]
mod tests {
    use changeplan_core::GitRange;

    use super::*;
    use crate::assemble_manifest;

    #[test]
    fn digest_has_prefix_and_hex() {
        let value = digest(b"hello");

        assert_eq!(
            value,
            "sha256-2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn integrity_entries_verify() {
        let manifest = assemble_manifest(&GitRange::new(None, "HEAD"), &[]);

        let manifest = with_integrity(manifest, [("CHANGELOG.md", "# Changes\n")]);

        assert!(verify_integrity(&manifest, "CHANGELOG.md", b"# Changes\n"));
        assert!(!verify_integrity(&manifest, "CHANGELOG.md", b"tampered"));
        assert!(!verify_integrity(&manifest, "missing.md", b""));
    }

    #[test]
    fn no_artifacts_leaves_integrity_unset() {
        let manifest = assemble_manifest(&GitRange::new(None, "HEAD"), &[]);

        let manifest = with_integrity(manifest, Vec::<(&str, Vec<u8>)>::new());

        assert!(manifest.integrity.is_none());
    }
}
