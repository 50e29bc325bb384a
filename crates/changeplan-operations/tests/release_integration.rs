use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use changeplan_changelog::TemplateRegistry;
use changeplan_core::{BumpLevel, BumpReason, GitRange, Platform};
use changeplan_git::Repository;
use changeplan_manifest::{read_manifest, verify_integrity};
use changeplan_operations::ReleaseConfig;
use changeplan_operations::operations::{
    ChangelogOperation, PlanOperation, PlanRequest, WORKSPACE_CHANGELOG, package_changelog_name,
    write_release,
};
use changeplan_operations::providers::{
    FileSystemCacheStore, FileSystemWorkspaceProvider, RegistryTemplateSource,
};
use tempfile::TempDir;

const ROOT_MANIFEST: &str = r#"[workspace]
members = ["crates/*"]

[workspace.metadata.changeplan]
strategy = "independent"
template = "technical"
repository = "https://github.com/acme/widgets"
"#;

fn write_package(root: &Path, name: &str, dependency: Option<&str>) -> anyhow::Result<()> {
    let dir = root.join("crates").join(name);
    fs::create_dir_all(dir.join("src"))?;
    let mut manifest = format!("[package]\nname = \"{name}\"\nversion = \"1.0.0\"\nedition = \"2021\"\n");
    if let Some(dep) = dependency {
        let _ = write!(manifest, "\n[dependencies]\n{dep} = {{ path = \"../{dep}\" }}\n");
    }
    fs::write(dir.join("Cargo.toml"), manifest)?;
    fs::write(dir.join("src/lib.rs"), "")?;
    Ok(())
}

fn commit_all(repo: &git2::Repository, message: &str) -> anyhow::Result<String> {
    let mut index = repo.index()?;
    index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;

    let sig = git2::Signature::now("Ada", "ada@example.com")?;
    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit()?),
        Err(_) => None,
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
    Ok(oid.to_string())
}

/// A git repository holding an `api -> core` workspace, one initial commit
/// and one feature commit on each package. Returns the initial commit.
fn repository_with_history() -> anyhow::Result<(TempDir, String)> {
    let dir = TempDir::new()?;
    let repo = git2::Repository::init(dir.path())?;
    fs::write(dir.path().join("Cargo.toml"), ROOT_MANIFEST)?;
    fs::write(dir.path().join(".gitignore"), ".changeplan/\n")?;
    write_package(dir.path(), "api", Some("core"))?;
    write_package(dir.path(), "core", None)?;
    let initial = commit_all(&repo, "chore: initial workspace")?;
    let target = repo.find_commit(git2::Oid::from_str(&initial)?)?;
    repo.tag_lightweight("core-v1.0.0", target.as_object(), false)?;

    fs::write(dir.path().join("crates/api/src/lib.rs"), "pub fn endpoint() {}\n")?;
    commit_all(&repo, "feat(api): add endpoint")?;
    fs::write(dir.path().join("crates/core/src/lib.rs"), "pub fn parse() {}\n")?;
    commit_all(&repo, "fix(core): handle empty input\n\nCloses #12")?;

    Ok((dir, initial))
}

#[test]
fn plans_release_from_git_history() -> anyhow::Result<()> {
    let (dir, initial) = repository_with_history()?;
    let git = git2::Repository::open(dir.path())?;
    git.remote("origin", "git@gitlab.com:acme/widgets.git")?;
    let repository = Repository::open(dir.path())?;
    let range = GitRange::new(Some(&initial), "HEAD");

    let request = PlanRequest::from_repository(&repository, range)?
        .with_release_tags(&repository, ["api", "core"])?;
    assert_eq!(request.commits.len(), 2);

    let operation = PlanOperation::new(FileSystemWorkspaceProvider::new(), FileSystemCacheStore::new());
    let manifest = operation.plan(&request)?;

    let api = manifest.package("api").expect("api released");
    assert_eq!((api.bump, api.reason), (BumpLevel::Minor, BumpReason::Feat));
    assert_eq!(api.changes[0].author.name, "Ada");
    let core = manifest.package("core").expect("core released");
    assert_eq!((core.bump, core.reason), (BumpLevel::Patch, BumpReason::Fix));
    assert_eq!(core.changes[0].references[0].id, "12");

    // the configured repository wins over the origin remote
    let links = core.changes[0].links.as_ref().expect("links recorded");
    assert!(links.commit.starts_with("https://github.com/acme/widgets/commit/"));
    assert_eq!(request.remote_url.as_deref(), Some("git@gitlab.com:acme/widgets.git"));

    let cache = changeplan_cache::load(&dir.path().join(".changeplan/cache")).expect("cache written");
    let tag = cache.last_tag("core").expect("core tag recorded");
    assert_eq!((tag.tag.as_str(), tag.sha.as_str()), ("core-v1.0.0", initial.as_str()));
    assert!(cache.last_tag("api").is_none());

    let replanned = operation.plan(&request)?;
    assert_eq!(replanned.packages, manifest.packages);
    Ok(())
}

#[tokio::test]
async fn renders_and_writes_release_artifacts() -> anyhow::Result<()> {
    let (dir, initial) = repository_with_history()?;
    let repository = Repository::open(dir.path())?;
    let request = PlanRequest::from_repository(&repository, GitRange::new(Some(&initial), "HEAD"))?;
    let manifest = PlanOperation::new(FileSystemWorkspaceProvider::new(), FileSystemCacheStore::new())
        .plan(&request)?;

    let config = ReleaseConfig::load(repository.root())?;
    let source = RegistryTemplateSource::new(TemplateRegistry::new().with_base_dir(repository.root()));
    let changelogs = ChangelogOperation::from_config(source, &config)?
        .render(&manifest, Some(Platform::GitHub))
        .await?;

    let api = &changelogs.packages["api"];
    assert!(api.starts_with(
        "## [api 1.1.0](https://github.com/acme/widgets/compare/api-v1.0.0...api-v1.1.0)"
    ));
    assert!(api.contains("**api:** add endpoint"));
    assert!(changelogs.packages["core"].contains("[#12](https://github.com/acme/widgets/issues/12)"));

    let out = config.output_dir(repository.root());
    let written = write_release(&out, manifest, &changelogs)?;

    assert_eq!(written.changelogs.len(), 3);
    let on_disk = read_manifest(&written.manifest_path)?;
    for name in [
        package_changelog_name("api"),
        package_changelog_name("core"),
        WORKSPACE_CHANGELOG.to_string(),
    ] {
        let contents = fs::read(out.join(&name))?;
        assert!(verify_integrity(&on_disk, &name, &contents), "{name} digest");
    }
    Ok(())
}
