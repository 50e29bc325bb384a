use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CargoManifest {
    pub package: Option<Package>,
    pub workspace: Option<WorkspaceSection>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default, rename = "dev-dependencies")]
    pub dev_dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default, rename = "build-dependencies")]
    pub build_dependencies: BTreeMap<String, DependencySpec>,
}

impl CargoManifest {
    /// Names of every declared dependency, resolving `package = "..."` renames.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .chain(&self.dev_dependencies)
            .chain(&self.build_dependencies)
            .map(|(key, spec)| spec.package_name().unwrap_or(key))
    }
}

#[derive(Debug, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: Option<VersionField>,
    pub metadata: Option<PackageMetadata>,
}

impl Package {
    pub fn is_experimental(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.changeplan.as_ref())
            .is_some_and(|c| c.experimental)
    }
}

#[derive(Debug, Deserialize)]
pub struct PackageMetadata {
    pub changeplan: Option<ChangeplanPackageMetadata>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeplanPackageMetadata {
    #[serde(default)]
    pub experimental: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum VersionField {
    Literal(String),
    Inherited(InheritedVersion),
}

#[derive(Debug, Deserialize)]
pub struct InheritedVersion {
    pub workspace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Version(String),
    Detailed(DetailedDependency),
}

impl DependencySpec {
    fn package_name(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(detail) => detail.package.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailedDependency {
    pub package: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceSection {
    pub members: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub package: Option<WorkspacePackage>,
}

#[derive(Debug, Deserialize)]
pub struct WorkspacePackage {
    pub version: Option<String>,
}
