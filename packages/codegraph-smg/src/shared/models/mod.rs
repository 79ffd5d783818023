//! Shared models

mod non_empty;

pub use non_empty::NonEmpty;
