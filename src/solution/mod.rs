//! In-memory solution model and the fluent builder that populates it.

mod builder;
mod entry;
pub mod path;

pub use builder::{FolderBuilder, SolutionBuilder, SolutionError};
pub use entry::{Entry, FolderEntry};
