//! Codesnap: short-lived task branches on top of git.
//!
//! A task is one isolated unit of work: a dedicated branch forked from a base
//! branch plus a small registry record tracking its status and activity. The
//! crate starts tasks, commits on them, integrates them back (applied,
//! merge-committed or squashed), abandons them and prunes stale ones.
//!
//! # Architecture
//!
//! Codesnap follows hexagonal architecture principles:
//!
//! - **Domain**: task records, status machine and branch naming
//! - **Ports**: version control and registry contracts
//! - **Adapters**: `git` command line, JSON file registry, in-memory fakes
//!
//! # Modules
//!
//! - [`task`]: task lifecycle management
//! - [`config`]: layered configuration

pub mod config;
pub mod task;
