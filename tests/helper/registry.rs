//! Registry test utilities

use std::collections::HashMap;

use async_trait::async_trait;

use depdiff::registry::{MetadataClient, PackageMetadata, ProjectInfo, RegistryError};

/// In-memory registry keyed by `(name, version)`
#[derive(Default)]
pub struct FakeMetadataClient {
    releases: HashMap<(String, String), PackageMetadata>,
}

impl FakeMetadataClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_release(mut self, name: &str, version: &str, homepage: &str, urls: &[String]) -> Self {
        self.releases.insert(
            (name.to_string(), version.to_string()),
            PackageMetadata {
                info: ProjectInfo {
                    url: homepage.to_string(),
                },
                urls: urls.to_vec(),
            },
        );
        self
    }
}

#[async_trait]
impl MetadataClient for FakeMetadataClient {
    async fn fetch_metadata(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<PackageMetadata, RegistryError> {
        self.releases
            .get(&(package_name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(format!("{package_name}=={version}")))
    }
}
