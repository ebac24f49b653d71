//! depdiff: recover the source-code change behind dependency version bumps
//!
//! Given a unified diff of a `requirements.txt`-style manifest, every package whose
//! pinned version changed is retrieved twice (old and new release) and compared:
//! first through the project's version-control history, then, when that is not
//! possible, by downloading and comparing the published release artifacts.
//!
//! # Modules
//!
//! - [`parser`]: Extracts dependency changes from a manifest diff
//! - [`registry`]: Package metadata lookup (PyPI)
//! - [`diff`]: Binary detection, line diff and directory comparison
//! - [`retrieval`]: Version-control and artifact retrieval strategies
//! - [`orchestrator`]: Parallel retrieval, cleanup and report generation
//! - [`config`]: Constants and file-based configuration
//! - [`logging`]: Tracing subscriber setup for the binary

pub mod config;
pub mod diff;
pub mod logging;
pub mod orchestrator;
pub mod parser;
pub mod registry;
pub mod retrieval;
