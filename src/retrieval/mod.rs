//! Retrieval strategies for one dependency change
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  try first   ┌─────────────┐
//! │ HybridRetriever  │─────────────▶│     vcs     │ clone + tag diff
//! │   (get_diff)     │              └─────────────┘
//! │                  │  fallback    ┌─────────────┐     ┌──────────────────┐
//! │                  │─────────────▶│  artifact   │────▶│ SourceComparator │
//! └──────────────────┘              └─────────────┘     └──────────────────┘
//!          │ registers temp dirs
//!          ▼
//! ┌──────────────────┐
//! │  TempDirTracker  │
//! └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`hybrid`]: Version-control first, artifact comparison as fallback
//! - [`vcs`]: Repository URL extraction, blobless clone, tag resolution, tag diff
//! - [`artifact`]: Release archive selection, download and extraction
//! - [`tracker`]: Registration and cleanup of temporary directories
//! - [`error`]: Error type for retrieval operations

pub mod artifact;
pub mod error;
pub mod hybrid;
pub mod tracker;
pub mod vcs;

pub use artifact::{ArchiveKind, ArtifactFetcher};
pub use error::RetrievalError;
pub use hybrid::{DiffRetriever, HybridRetriever, RepositoryResolver, RetrieverOptions};
pub use tracker::{TempDirRegistry, TempDirTracker};
