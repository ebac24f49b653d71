//! Parser layer
//! - types.rs: DependencyChange and its classification
//! - requirements.rs: requirements.txt diff parser

pub mod requirements;
pub mod types;

pub use requirements::RequirementsDiffParser;
pub use types::{ChangeKind, DependencyChange};
