//! Shared module - Common types and utilities
//!
//! Types here are used across features and have no dependency on them.

pub mod models;

pub use models::*;
