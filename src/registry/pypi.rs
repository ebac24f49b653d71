//! PyPI registry client for fetching release metadata

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::DEFAULT_REGISTRY_URL;
use crate::registry::error::RegistryError;
use crate::registry::metadata::{MetadataClient, PackageMetadata, ProjectInfo};

const USER_AGENT: &str = concat!("depdiff/", env!("CARGO_PKG_VERSION"));

const GITHUB_PREFIX: &str = "https://github.com/";

/// PyPI registry client
pub struct PypiClient {
    client: Client,
    base_url: String,
}

impl Default for PypiClient {
    fn default() -> Self {
        Self::new(DEFAULT_REGISTRY_URL.to_string())
    }
}

impl PypiClient {
    pub fn new(base_url: String) -> Self {
        Self::with_client(build_http_client(), base_url)
    }

    /// Creates a client sharing an existing HTTP client
    pub fn with_client(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Builds the HTTP client used for registry and artifact requests
pub fn build_http_client() -> Client {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// PyPI JSON API response structure for a single release
#[derive(Debug, Deserialize)]
struct PypiReleaseResponse {
    info: PypiInfo,
    #[serde(default)]
    urls: Vec<PypiFile>,
}

#[derive(Debug, Default, Deserialize)]
struct PypiInfo {
    home_page: Option<String>,
    project_url: Option<String>,
    project_urls: Option<PypiProjectUrls>,
}

#[derive(Debug, Default, Deserialize)]
struct PypiProjectUrls {
    #[serde(rename = "Homepage")]
    homepage: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PypiFile {
    url: String,
}

impl PypiInfo {
    /// Picks the project URL: a GitHub URL wins outright, otherwise the first
    /// non-empty candidate is used.
    fn best_url(&self) -> String {
        let homepage = self.project_urls.as_ref().and_then(|u| u.homepage.as_deref());
        let candidates = [
            self.home_page.as_deref(),
            self.project_url.as_deref(),
            homepage,
        ];

        let mut candidates = candidates.into_iter().flatten().filter(|c| !c.is_empty());

        let Some(first) = candidates.next() else {
            return String::new();
        };

        if first.starts_with(GITHUB_PREFIX) {
            return first.to_string();
        }

        candidates
            .find(|c| c.starts_with(GITHUB_PREFIX))
            .unwrap_or(first)
            .to_string()
    }
}

#[async_trait]
impl MetadataClient for PypiClient {
    async fn fetch_metadata(
        &self,
        package_name: &str,
        version: &str,
    ) -> Result<PackageMetadata, RegistryError> {
        let url = format!("{}/pypi/{}/{}/json", self.base_url, package_name, version);
        debug!("Fetching PyPI release metadata: {}", url);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(format!(
                "{}=={}",
                package_name, version
            )));
        }

        if !response.status().is_success() {
            return Err(RegistryError::InvalidResponse(format!(
                "PyPI API returned status {}",
                response.status()
            )));
        }

        let release: PypiReleaseResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))?;

        let metadata = PackageMetadata {
            info: ProjectInfo {
                url: release.info.best_url(),
            },
            urls: release.urls.into_iter().map(|f| f.url).collect(),
        };

        debug!(
            "Found {} artifacts for {}=={}",
            metadata.urls.len(),
            package_name,
            version
        );

        Ok(metadata)
    }
}
