//! Adapters for external services.

pub mod blob;
