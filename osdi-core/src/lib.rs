//! Core types for the osdi adaptor ecosystem.
//!
//! This crate provides shared types used by every CRM adaptor:
//! - `StandardEvent` and related types for OSDI events
//! - `OsdiError` / `OsdiResult` for failures surfaced to callers

pub mod error;
pub mod event;

pub use error::{OsdiError, OsdiResult};
// Re-export all event types at crate root for convenience
pub use event::*;
