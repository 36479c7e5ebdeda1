//! Core data models for the bucket gateway.
//!
//! These types describe objects as the gateway hands them to callers. They
//! carry no storage logic and serialize naturally as JSON via `serde`.

pub mod object;
pub mod signed_url;
