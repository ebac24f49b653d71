//! Version-control retrieval through the `git` CLI
//!
//! A release diff is produced by cloning the project's repository without
//! blobs, resolving both versions to tags and running `git diff` between them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::config::GIT_TEMP_PREFIX;
use crate::retrieval::error::RetrievalError;
use crate::retrieval::tracker::TempDirTracker;

static REPOSITORY_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(https?)://((?:www\.)?(?:github\.com|gitlab\.com|bitbucket\.org))/([^/?#\s]+)/([^/?#\s]+)",
    )
    .expect("valid regex")
});

/// Extracts a clonable repository URL from a project homepage.
///
/// Only GitHub, GitLab and Bitbucket URLs are accepted. Deeper paths, query
/// strings and fragments are dropped and a single `.git` suffix is ensured.
pub fn extract_repository_url(homepage: &str) -> Option<String> {
    let caps = REPOSITORY_URL_REGEX.captures(homepage.trim())?;
    let scheme = &caps[1];
    let host = &caps[2];
    let owner = &caps[3];
    let repo = caps[4].trim_end_matches(".git");
    if repo.is_empty() {
        return None;
    }
    Some(format!("{scheme}://{host}/{owner}/{repo}.git"))
}

/// Picks the tag for `version`: an exact match first, then the `v`-prefixed form.
pub fn select_tag<S: AsRef<str>>(tags: &[S], version: &str) -> Option<String> {
    let has = |candidate: &str| tags.iter().any(|t| t.as_ref() == candidate);

    if has(version) {
        return Some(version.to_string());
    }
    let prefixed = format!("v{version}");
    has(&prefixed).then_some(prefixed)
}

/// A local git repository
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clones `url` history-only into a fresh temporary directory.
    ///
    /// The directory is registered with `tracker` before git runs, so a failed
    /// clone is still removed on cleanup.
    pub async fn clone_blobless(
        url: &str,
        tracker: &dyn TempDirTracker,
    ) -> Result<Self, RetrievalError> {
        let dir = tempfile::Builder::new()
            .prefix(GIT_TEMP_PREFIX)
            .tempdir()?
            .keep();
        tracker.track_temp_dir(&dir);

        debug!("Cloning {} into {:?}", url, dir);
        let dir_arg = dir.to_string_lossy();
        run_git(
            &[
                "clone",
                "--filter=blob:none",
                "--no-checkout",
                "--quiet",
                url,
                &dir_arg,
            ],
            None,
        )
        .await?;

        Ok(Self::open(dir))
    }

    pub async fn tags(&self) -> Result<Vec<String>, RetrievalError> {
        let stdout = run_git(&["tag", "--list"], Some(&self.path)).await?;
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Resolves `version` to a tag name. Failing to list tags counts as no match.
    pub async fn resolve_tag(&self, version: &str) -> Option<String> {
        let tags = self
            .tags()
            .await
            .inspect_err(|e| debug!("Listing tags in {:?} failed: {}", self.path, e))
            .ok()?;
        select_tag(&tags, version)
    }

    pub async fn diff(&self, old_ref: &str, new_ref: &str) -> Result<String, RetrievalError> {
        run_git(&["diff", old_ref, new_ref, "--"], Some(&self.path)).await
    }
}

async fn run_git(args: &[&str], cwd: Option<&Path>) -> Result<String, RetrievalError> {
    let mut command = Command::new("git");
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .await
        .map_err(|e| RetrievalError::Vcs(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RetrievalError::Vcs(format!(
            "git {} failed: {}",
            args.first().copied().unwrap_or_default(),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
