//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64)
//! - Client and credential extraction from HTTP headers
//! - Fixed-window rate limiting infrastructure
//! - Environment configuration helpers

pub mod client;
pub mod config;
pub mod crypto;
pub mod rate_limit;
