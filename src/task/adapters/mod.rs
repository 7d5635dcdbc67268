//! Adapter implementations for the version-control and registry ports.

pub mod file;
pub mod git;
pub mod memory;
