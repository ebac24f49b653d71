//! Diff engine used by the artifact fallback
//!
//! - `binary`: null-byte sniffing to exclude non-text files
//! - `myers`: Myers' line diff and unified hunk rendering
//! - `comparator`: directory tree comparison producing one unified diff
//!
//! Everything here is stateless and safe to share between workers.

pub mod binary;
pub mod comparator;
pub mod myers;

pub use binary::is_binary;
pub use comparator::SourceComparator;
pub use myers::{Edit, Hunk, MyersDiff, unified_diff};
