//! Hybrid retrieval: version-control diff first, artifact comparison second
//!
//! For an update the retriever looks up the new release's project URL. When it
//! points at a known hosting platform the repository is cloned and the two
//! version tags are diffed. Any failure on that path falls back to downloading
//! both release artifacts and comparing their extracted trees.

use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use tracing::{debug, warn};

use crate::diff::SourceComparator;
use crate::parser::DependencyChange;
use crate::registry::MetadataClient;
use crate::retrieval::artifact::ArtifactFetcher;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::tracker::TempDirTracker;
use crate::retrieval::vcs::{GitRepository, extract_repository_url};

/// Produces the source diff for one dependency change
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait DiffRetriever: Send + Sync {
    async fn get_diff(&self, change: &DependencyChange) -> Result<String, RetrievalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieverOptions {
    /// Try a repository diff before comparing artifacts
    pub vcs_enabled: bool,
    /// Fetch old and new artifacts concurrently
    pub parallel_downloads: bool,
}

impl Default for RetrieverOptions {
    fn default() -> Self {
        Self {
            vcs_enabled: true,
            parallel_downloads: true,
        }
    }
}

/// Maps a project URL to a clonable repository URL, or `None` when the project
/// is not hosted anywhere the retriever can clone from
pub type RepositoryResolver = fn(&str) -> Option<String>;

pub struct HybridRetriever {
    metadata: Arc<dyn MetadataClient>,
    resolve_repository: RepositoryResolver,
    artifacts: ArtifactFetcher,
    tracker: Arc<dyn TempDirTracker>,
    comparator: SourceComparator,
    options: RetrieverOptions,
}

impl HybridRetriever {
    pub fn new(
        metadata: Arc<dyn MetadataClient>,
        http: Client,
        tracker: Arc<dyn TempDirTracker>,
        options: RetrieverOptions,
    ) -> Self {
        Self {
            artifacts: ArtifactFetcher::new(Arc::clone(&metadata), http),
            metadata,
            resolve_repository: extract_repository_url,
            tracker,
            comparator: SourceComparator::new(),
            options,
        }
    }

    /// Replaces the GitHub/GitLab/Bitbucket URL rule, e.g. for self-hosted forges
    pub fn with_repository_resolver(mut self, resolver: RepositoryResolver) -> Self {
        self.resolve_repository = resolver;
        self
    }

    /// Returns the repository diff, or `None` when the artifact path should be used instead.
    async fn try_vcs(&self, name: &str, old: &str, new: &str) -> Option<String> {
        match self.vcs_diff(name, old, new).await {
            Ok(Some(diff)) => Some(diff),
            Ok(None) => None,
            Err(e) => {
                warn!("Repository diff for {} failed, comparing artifacts: {}", name, e);
                None
            }
        }
    }

    async fn vcs_diff(
        &self,
        name: &str,
        old: &str,
        new: &str,
    ) -> Result<Option<String>, RetrievalError> {
        let metadata = self.metadata.fetch_metadata(name, new).await?;
        let Some(url) = (self.resolve_repository)(&metadata.info.url) else {
            debug!("No repository URL for {} ({:?})", name, metadata.info.url);
            return Ok(None);
        };

        let repo = GitRepository::clone_blobless(&url, self.tracker.as_ref()).await?;
        let (Some(old_tag), Some(new_tag)) =
            (repo.resolve_tag(old).await, repo.resolve_tag(new).await)
        else {
            debug!("No tags for {} {} -> {} in {}", name, old, new, url);
            return Ok(None);
        };

        debug!("Diffing {} tags {}..{}", name, old_tag, new_tag);
        repo.diff(&old_tag, &new_tag).await.map(Some)
    }

    async fn artifact_fallback(&self, change: &DependencyChange) -> Result<String, RetrievalError> {
        let Some((old, new)) = change.versions() else {
            return Err(RetrievalError::Inapplicable {
                name: change.name.clone(),
            });
        };

        let name = change.name.as_str();
        let tracker = self.tracker.as_ref();
        let (old_root, new_root) = if self.options.parallel_downloads {
            tokio::try_join!(
                self.artifacts.fetch(name, old, tracker),
                self.artifacts.fetch(name, new, tracker)
            )?
        } else {
            (
                self.artifacts.fetch(name, old, tracker).await?,
                self.artifacts.fetch(name, new, tracker).await?,
            )
        };

        let comparator = self.comparator;
        let diff = tokio::task::spawn_blocking(move || {
            comparator.compare_directories(&old_root, &new_root)
        })
        .await?;
        Ok(diff)
    }
}

#[async_trait::async_trait]
impl DiffRetriever for HybridRetriever {
    async fn get_diff(&self, change: &DependencyChange) -> Result<String, RetrievalError> {
        if self.options.vcs_enabled
            && let Some((old, new)) = change.versions()
            && let Some(diff) = self.try_vcs(&change.name, old, new).await
        {
            return Ok(diff);
        }
        self.artifact_fallback(change).await
    }
}
