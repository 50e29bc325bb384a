mod cache_store;
mod template_source;
mod workspace_provider;

pub use cache_store::ChangeCacheStore;
pub use template_source::TemplateSource;
pub use workspace_provider::WorkspaceProvider;
