//! In-memory adapters for task lifecycle tests and embedding.

mod registry;
mod vcs;

pub use registry::InMemoryTaskRegistry;
pub use vcs::{InMemoryVersionControl, VcsCall, VcsOperation};
