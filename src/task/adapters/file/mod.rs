//! JSON file adapter for task record persistence.

mod models;
mod registry;

pub use registry::JsonFileTaskRegistry;
