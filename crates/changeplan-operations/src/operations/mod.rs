mod changelog;
mod plan;
mod write;

pub use changelog::{ChangelogOperation, RenderedChangelogs};
pub use plan::{PlanOperation, PlanRequest};
pub use write::{WORKSPACE_CHANGELOG, WrittenRelease, package_changelog_name, write_release};
