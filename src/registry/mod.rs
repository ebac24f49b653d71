//! Package registry layer
//!
//! - [`metadata`]: `MetadataClient` trait and the metadata it returns
//! - [`pypi`]: PyPI JSON API implementation
//! - [`error`]: Error type for registry lookups

pub mod error;
pub mod metadata;
pub mod pypi;

pub use error::RegistryError;
pub use metadata::{MetadataClient, PackageMetadata, ProjectInfo};
pub use pypi::PypiClient;
