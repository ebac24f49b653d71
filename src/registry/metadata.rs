//! Metadata lookup trait for a single published release

#[cfg(test)]
use mockall::automock;

use crate::registry::error::RegistryError;

/// Project information of a release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Project URL, either the source repository or another homepage
    pub url: String,
}

/// Metadata of one published release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub info: ProjectInfo,
    /// Distribution artifact URLs (source and built distributions), in registry order
    pub urls: Vec<String>,
}

/// Trait for looking up release metadata from a registry
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait MetadataClient: Send + Sync {
    /// Fetches metadata for an exact release
    ///
    /// # Arguments
    /// * `package_name` - The name of the package (e.g., "requests")
    /// * `version` - The exact release version (e.g., "2.26.0")
    async fn fetch_metadata(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<PackageMetadata, RegistryError>;
}
