mod cache;
mod template;
mod workspace;

pub use cache::FileSystemCacheStore;
pub use template::RegistryTemplateSource;
pub use workspace::FileSystemWorkspaceProvider;
