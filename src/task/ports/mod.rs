//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services: the
//! version-control adapter that mutates the working repository and the
//! registry that persists task records.

pub mod registry;
pub mod vcs;

pub use registry::{TaskRegistry, TaskRegistryError, TaskRegistryResult};
pub use vcs::{VcsError, VcsResult, VersionControl};

#[cfg(test)]
pub use vcs::MockVersionControl;
