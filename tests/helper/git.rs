//! Local git repositories built with the `git` CLI

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// A throwaway repository with a linear history
pub struct GitFixture {
    _dir: TempDir,
    path: PathBuf,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upstream");
        std::fs::create_dir(&path).unwrap();
        let fixture = Self { _dir: dir, path };
        fixture.git(&["init", "--quiet"]);
        fixture
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let file = self.path.join(relative);
        if let Some(parent) = file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(file, content).unwrap();
        self
    }

    pub fn commit(&self, message: &str) -> &Self {
        self.git(&["add", "--all"]);
        self.git(&[
            "-c",
            "user.name=depdiff",
            "-c",
            "user.email=depdiff@example.com",
            "commit",
            "--quiet",
            "-m",
            message,
        ]);
        self
    }

    pub fn tag(&self, name: &str) -> &Self {
        self.git(&["tag", name]);
        self
    }

    fn git(&self, args: &[&str]) {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
