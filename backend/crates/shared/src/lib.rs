//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - The canonical error taxonomy and result aliases
//! - The raw, uninterpreted store error
//! - Common primitive value objects (ID types, etc.)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
    pub mod store;
}
pub mod id;
