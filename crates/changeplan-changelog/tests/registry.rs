use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use changeplan_changelog::{
    Locale, SummaryEnhancer, Template, TemplateData, TemplateError, TemplateRegistry,
};
use changeplan_core::{
    Author, BumpLevel, BumpReason, Change, CommitType, GitRange, PackageRelease, Platform,
    ReleaseManifest, RepositoryInfo, SCHEMA_VERSION, WorkspaceSummary,
};
use chrono::{TimeZone, Utc};

fn change(sha: &str, commit_type: CommitType, package: &str, subject: &str) -> Change {
    Change {
        sha: sha.to_string(),
        commit_type,
        scope: Some(package.to_string()),
        subject: subject.to_string(),
        body: None,
        breaking: Vec::new(),
        references: Vec::new(),
        author: Author::new("Ada"),
        co_authors: Vec::new(),
        packages: BTreeSet::from([package.to_string()]),
        files_changed: BTreeSet::new(),
        timestamp: "2025-01-15T10:00:00Z".to_string(),
        is_merge: false,
        is_revert: false,
        revert_of: None,
        cherry_pick_of: None,
        parents: Vec::new(),
        links: None,
    }
}

fn release(name: &str, next: &str, changes: Vec<Change>) -> PackageRelease {
    PackageRelease {
        name: name.to_string(),
        prev: "1.2.0".to_string(),
        next: next.to_string(),
        bump: BumpLevel::Minor,
        reason: BumpReason::Feat,
        ripple_from: None,
        breaking: Vec::new(),
        changes,
        policy: None,
    }
}

fn manifest() -> ReleaseManifest {
    let shared = change("aaaaaaa111", CommitType::Fix, "core", "null check");
    ReleaseManifest {
        schema_version: SCHEMA_VERSION.to_string(),
        range: GitRange::new(Some("v1.2.0"), "HEAD"),
        timestamp: Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
        packages: vec![
            release(
                "api",
                "1.3.0",
                vec![
                    change("bbbbbbb222", CommitType::Feat, "api", "add endpoint"),
                    shared.clone(),
                ],
            ),
            release("core", "1.2.1", vec![shared]),
        ],
        workspace: WorkspaceSummary {
            breaking_count: 0,
            by_type: BTreeMap::from([(CommitType::Feat, 1), (CommitType::Fix, 1)]),
        },
        integrity: None,
    }
}

#[tokio::test]
async fn builtins_are_registered() -> anyhow::Result<()> {
    let registry = TemplateRegistry::new();

    for id in TemplateRegistry::BUILTIN {
        let template = registry.resolve(id).await?;
        assert_eq!(template.id(), id);
        assert_eq!(template.version(), "1.0");
    }
    Ok(())
}

#[tokio::test]
async fn workspace_data_deduplicates_shared_changes() -> anyhow::Result<()> {
    let data = TemplateData::from_manifest(&manifest());

    assert_eq!(data.changes.len(), 2);
    assert_eq!(data.version, "2025-01-15");
    assert!(data.package.is_none());

    let rendered = TemplateRegistry::new().render("compact", &data, None).await?;
    assert_eq!(
        rendered,
        "**2025-01-15** (2025-01-15)\n\n- feat(api): add endpoint (bbbbbbb)\n- fix(core): null check (aaaaaaa)\n"
    );
    Ok(())
}

#[test]
fn lockstep_manifest_uses_shared_version() {
    let mut manifest = manifest();
    for package in &mut manifest.packages {
        package.next = "2.0.0".to_string();
    }

    let data = TemplateData::from_manifest(&manifest);

    assert_eq!(data.version, "2.0.0");
    assert_eq!(data.previous_version.as_deref(), Some("1.2.0"));
}

#[tokio::test]
async fn external_template_renders_from_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(
        dir.path().join("notes.toml"),
        r###"
id = "notes"
version = "1.0"

[render]
header = "# {title} ({date})"
section = "## {title}"
entry = "* {subject} {commit}"
footer = "Range: {range}"
"###,
    )?;
    let registry = TemplateRegistry::new().with_base_dir(dir.path());
    let repo = RepositoryInfo::from_url("https://gitlab.com/acme/widgets")?;
    let data = TemplateData::from_release(
        &manifest().packages[0],
        &GitRange::new(Some("v1.2.0"), "HEAD"),
        chrono::NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date"),
    )
    .with_locale(Locale::Fr)
    .with_repository(repo);

    let rendered = registry
        .render("notes.toml", &data, Some(Platform::GitLab))
        .await?;

    assert_eq!(
        rendered,
        "# api 1.3.0 (2025-01-15)\n\
         \n## Fonctionnalités\n\n\
         * add endpoint [bbbbbbb](https://gitlab.com/acme/widgets/-/commit/bbbbbbb222)\n\
         \n## Corrections de bugs\n\n\
         * null check [aaaaaaa](https://gitlab.com/acme/widgets/-/commit/aaaaaaa111)\n\
         \nRange: v1.2.0..HEAD\n"
    );
    Ok(())
}

#[tokio::test]
async fn unknown_template_is_not_found() {
    let registry = TemplateRegistry::new();

    let result = registry.resolve("does/not/exist.toml").await;

    assert!(matches!(
        result,
        Err(TemplateError::NotFound { id }) if id == "does/not/exist.toml"
    ));
}

#[tokio::test]
async fn external_contract_violations_are_fatal() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("old.toml"), "version = \"2.0\"\n[render]\nheader = \"\"\nentry = \"\"\n")?;
    std::fs::write(dir.path().join("bare.toml"), "version = \"1.0\"\n")?;
    let registry = TemplateRegistry::new().with_base_dir(dir.path());

    assert!(matches!(
        registry.resolve("old.toml").await,
        Err(TemplateError::UnsupportedVersion { .. })
    ));
    assert!(matches!(
        registry.resolve("bare.toml").await,
        Err(TemplateError::MissingRender { .. })
    ));
    Ok(())
}

struct Plugin {
    version: &'static str,
}

#[async_trait]
impl Template for Plugin {
    fn id(&self) -> &str {
        "plugin"
    }

    fn version(&self) -> &str {
        self.version
    }

    async fn render(
        &self,
        data: &TemplateData,
        _platform: Option<Platform>,
    ) -> changeplan_changelog::Result<String> {
        Ok(format!("{} changes", data.changes.len()))
    }
}

#[tokio::test]
async fn register_checks_version() -> anyhow::Result<()> {
    let mut registry = TemplateRegistry::new();

    let rejected = registry.register(Box::new(Plugin { version: "0.1" }));
    assert!(matches!(rejected, Err(TemplateError::UnsupportedVersion { .. })));
    assert!(!registry.contains("plugin"));

    registry.register(Box::new(Plugin { version: "1.0" }))?;
    let rendered = registry
        .render("plugin", &TemplateData::from_manifest(&manifest()), None)
        .await?;
    assert_eq!(rendered, "2 changes");
    Ok(())
}

struct FixedSummary;

#[async_trait]
impl SummaryEnhancer for FixedSummary {
    async fn summarize(&self, _data: &TemplateData) -> changeplan_changelog::Result<Option<String>> {
        Ok(Some("A quiet release.".to_string()))
    }
}

#[tokio::test]
async fn corporate_ai_uses_configured_enhancer() -> anyhow::Result<()> {
    let registry = TemplateRegistry::new().with_enhancer(Box::new(FixedSummary));
    let data = TemplateData::from_manifest(&manifest()).with_locale(Locale::Es);

    let rendered = registry.render("corporate-ai", &data, None).await?;

    assert!(rendered.contains("### Destacados\n\nA quiet release.\n"));
    Ok(())
}
