//! Release artifact download and extraction
//!
//! Source distributions (`.tar.gz`) are preferred over built distributions
//! (`.whl`/`.zip`). Each artifact gets its own tracked temporary directory that
//! holds the extracted tree after the archive itself has been removed.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::ARTIFACT_TEMP_PREFIX;
use crate::registry::MetadataClient;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::tracker::TempDirTracker;

const EXTRACT_DIR_NAME: &str = "extracted";

/// Archive format of a distribution artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Gzip-compressed tarball (source distribution)
    TarGz,
    /// Zip container (wheel or zip source distribution)
    Zip,
}

impl ArchiveKind {
    /// Detects the archive format from a file name or URL
    pub fn from_name(name: &str) -> Option<Self> {
        let path = strip_query(name);
        if path.ends_with(".tar.gz") {
            Some(ArchiveKind::TarGz)
        } else if path.ends_with(".whl") || path.ends_with(".zip") {
            Some(ArchiveKind::Zip)
        } else {
            None
        }
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Picks the artifact to download: the first source distribution, otherwise
/// the first built distribution.
pub fn select_artifact(urls: &[String]) -> Option<&str> {
    let first_of = |kind: ArchiveKind| {
        urls.iter()
            .map(String::as_str)
            .find(|url| ArchiveKind::from_name(url) == Some(kind))
    };
    first_of(ArchiveKind::TarGz).or_else(|| first_of(ArchiveKind::Zip))
}

fn file_name_from_url(url: &str) -> &str {
    strip_query(url)
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("artifact")
}

/// Unpacks `archive` into `dest` according to its file name.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<(), RetrievalError> {
    let name = archive.to_string_lossy();
    let kind = ArchiveKind::from_name(&name)
        .ok_or_else(|| RetrievalError::UnsupportedArchive(name.to_string()))?;

    std::fs::create_dir_all(dest)?;
    let file = File::open(archive)?;
    match kind {
        ArchiveKind::TarGz => tar::Archive::new(GzDecoder::new(file))
            .unpack(dest)
            .map_err(|e| RetrievalError::Archive(format!("{name}: {e}"))),
        ArchiveKind::Zip => zip::ZipArchive::new(file)
            .and_then(|mut zip| zip.extract(dest))
            .map_err(|e| RetrievalError::Archive(format!("{name}: {e}"))),
    }
}

/// Returns the single top-level directory of an extraction, or the extraction
/// directory itself when it holds anything else.
pub fn effective_root(extract_dir: &Path) -> Result<PathBuf, RetrievalError> {
    let entries = std::fs::read_dir(extract_dir)?.collect::<Result<Vec<_>, _>>()?;
    if let [only] = entries.as_slice()
        && only.file_type()?.is_dir()
    {
        return Ok(only.path());
    }
    Ok(extract_dir.to_path_buf())
}

/// Downloads and extracts release artifacts
pub struct ArtifactFetcher {
    metadata: Arc<dyn MetadataClient>,
    http: Client,
}

impl ArtifactFetcher {
    pub fn new(metadata: Arc<dyn MetadataClient>, http: Client) -> Self {
        Self { metadata, http }
    }

    /// Fetches the release `name==version` and returns the root of its
    /// extracted source tree.
    pub async fn fetch(
        &self,
        name: &str,
        version: &str,
        tracker: &dyn TempDirTracker,
    ) -> Result<PathBuf, RetrievalError> {
        let metadata = self.metadata.fetch_metadata(name, version).await?;
        let url = select_artifact(&metadata.urls).ok_or_else(|| {
            RetrievalError::NoSuitableArtifact {
                name: name.to_string(),
                version: version.to_string(),
            }
        })?;

        let dir = tempfile::Builder::new()
            .prefix(ARTIFACT_TEMP_PREFIX)
            .tempdir()?
            .keep();
        tracker.track_temp_dir(&dir);

        let archive = dir.join(file_name_from_url(url));
        self.download(url, &archive).await?;

        let extract_dir = dir.join(EXTRACT_DIR_NAME);
        let root = tokio::task::spawn_blocking(move || {
            extract_archive(&archive, &extract_dir)?;
            std::fs::remove_file(&archive)?;
            effective_root(&extract_dir)
        })
        .await??;

        debug!("Extracted {}=={} to {:?}", name, version, root);
        Ok(root)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), RetrievalError> {
        debug!("Downloading {}", url);
        let mut response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Download(format!("HTTP {status} for {url}")));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::metadata::MockMetadataClient;
    use crate::registry::{PackageMetadata, RegistryError};
    use crate::retrieval::tracker::TempDirRegistry;
    use mockito::Server;
    use rstest::rstest;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("pkg-1.0.tar.gz", Some(ArchiveKind::TarGz))]
    #[case("pkg-1.0-py3-none-any.whl", Some(ArchiveKind::Zip))]
    #[case("pkg-1.0.zip", Some(ArchiveKind::Zip))]
    #[case("https://host/pkg-1.0.tar.gz?sha=1", Some(ArchiveKind::TarGz))]
    #[case("pkg-1.0.tar.bz2", None)]
    #[case("pkg-1.0.exe", None)]
    fn archive_kind_from_name(#[case] name: &str, #[case] expected: Option<ArchiveKind>) {
        assert_eq!(ArchiveKind::from_name(name), expected);
    }

    #[test]
    fn select_artifact_prefers_source_distribution() {
        let list = urls(&[
            "https://files/pkg-1.0-py3-none-any.whl",
            "https://files/pkg-1.0.tar.gz",
        ]);
        assert_eq!(select_artifact(&list), Some("https://files/pkg-1.0.tar.gz"));
    }

    #[test]
    fn select_artifact_falls_back_to_wheel() {
        let list = urls(&[
            "https://files/pkg-1.0.exe",
            "https://files/pkg-1.0-py3-none-any.whl",
            "https://files/pkg-1.0-py2-none-any.whl",
        ]);
        assert_eq!(
            select_artifact(&list),
            Some("https://files/pkg-1.0-py3-none-any.whl")
        );
    }

    #[test]
    fn select_artifact_none_when_nothing_matches() {
        assert_eq!(select_artifact(&urls(&["https://files/pkg.exe"])), None);
        assert_eq!(select_artifact(&[]), None);
    }

    #[test]
    fn file_name_from_url_takes_last_segment() {
        assert_eq!(
            file_name_from_url("https://files/a/b/pkg-1.0.tar.gz?x=1"),
            "pkg-1.0.tar.gz"
        );
        assert_eq!(file_name_from_url("https://files/"), "artifact");
    }

    #[test]
    fn effective_root_with_single_file_is_extraction_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only.py"), "").unwrap();

        assert_eq!(effective_root(dir.path()).unwrap(), dir.path());
    }

    #[test]
    fn extract_unknown_format_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("pkg-1.0.tar.bz2");
        std::fs::write(&archive, b"data").unwrap();

        let result = extract_archive(&archive, &dir.path().join("out"));

        assert!(matches!(result, Err(RetrievalError::UnsupportedArchive(_))));
    }

    #[test]
    fn extract_corrupt_archive_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("pkg-1.0.zip");
        std::fs::write(&archive, b"not a zip").unwrap();

        let result = extract_archive(&archive, &dir.path().join("out"));

        assert!(matches!(result, Err(RetrievalError::Archive(_))));
    }

    #[tokio::test]
    async fn fetch_without_artifacts_fails_before_creating_dirs() {
        let mut metadata = MockMetadataClient::new();
        metadata.expect_fetch_metadata().returning(|_, _| {
            Ok(PackageMetadata {
                urls: vec!["https://files/pkg-1.0.exe".to_string()],
                ..Default::default()
            })
        });

        let fetcher = ArtifactFetcher::new(Arc::new(metadata), Client::new());
        let registry = TempDirRegistry::new();

        let result = fetcher.fetch("pkg", "1.0", &registry).await;

        assert!(matches!(
            result,
            Err(RetrievalError::NoSuitableArtifact { ref name, ref version })
                if name == "pkg" && version == "1.0"
        ));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn fetch_propagates_registry_errors() {
        let mut metadata = MockMetadataClient::new();
        metadata
            .expect_fetch_metadata()
            .returning(|name, _| Err(RegistryError::NotFound(name.to_string())));

        let fetcher = ArtifactFetcher::new(Arc::new(metadata), Client::new());

        let result = fetcher.fetch("pkg", "1.0", &TempDirRegistry::new()).await;

        assert!(matches!(
            result,
            Err(RetrievalError::Registry(RegistryError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn failed_download_keeps_temp_dir_tracked() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/files/pkg-1.0.tar.gz")
            .with_status(500)
            .create_async()
            .await;

        let artifact_url = format!("{}/files/pkg-1.0.tar.gz", server.url());
        let mut metadata = MockMetadataClient::new();
        metadata.expect_fetch_metadata().returning(move |_, _| {
            Ok(PackageMetadata {
                urls: vec![artifact_url.clone()],
                ..Default::default()
            })
        });

        let fetcher = ArtifactFetcher::new(Arc::new(metadata), Client::new());
        let registry = TempDirRegistry::new();

        let result = fetcher.fetch("pkg", "1.0", &registry).await;

        assert!(matches!(result, Err(RetrievalError::Download(_))));
        assert_eq!(registry.len(), 1);
        registry.cleanup();
    }
}
