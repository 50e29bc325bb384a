use semver::Version;

/// The newest `<package>-v<version>` tag of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
    pub package: String,
    /// Full tag name, e.g. `core-v1.2.0`.
    pub name: String,
    pub version: Version,
    /// Commit the tag points at.
    pub sha: String,
}
