//! Escape analysis infrastructure

pub mod escape_tracker;

pub use escape_tracker::{CallSiteRecord, EscapeSummary};
