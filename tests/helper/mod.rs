#![allow(dead_code, unused_imports)]

pub mod archive;
pub mod git;
pub mod registry;

pub use archive::{tar_gz, zip_bytes};
pub use git::{GitFixture, git_available};
pub use registry::FakeMetadataClient;
