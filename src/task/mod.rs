//! Task lifecycle management.
//!
//! Tasks are created on dedicated branches, committed to, integrated into
//! their base branch or abandoned, and finally pruned. Every lifecycle
//! operation runs as an ordered chain of version-control calls with the
//! registry kept in step. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
