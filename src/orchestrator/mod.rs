//! Fan-out of retrievals across all dependency changes
//!
//! - [`parallel`]: Bounded worker pool with timeouts and temp directory cleanup
//! - [`report`]: Plain-text report of per-package results
//! - [`pipeline`]: Manifest diff in, report out

pub mod parallel;
pub mod pipeline;
pub mod report;

pub use parallel::{PackageDiff, ParallelRetriever};
pub use pipeline::{DependencyDiffPipeline, NO_CHANGES_MESSAGE};
pub use report::ReportGenerator;
