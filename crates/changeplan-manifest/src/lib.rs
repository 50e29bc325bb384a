mod assemble;
mod error;
mod integrity;
mod reader;
mod writer;

pub use assemble::{assemble_manifest, assemble_manifest_at};
pub use error::ManifestError;
pub use integrity::{digest, verify_integrity, with_integrity};
pub use reader::read_manifest;
pub use writer::{MANIFEST_FILE, serialize_manifest, write_manifest};

pub type Result<T> = std::result::Result<T, ManifestError>;
