//! Escape analysis for local memory
//!
//! Decides, per program point, which locations may be written by callees
//! and opaque operations.

pub mod domain;
pub mod infrastructure;

pub use domain::{EscapeSet, EscapeState};
pub use infrastructure::{CallSiteRecord, EscapeSummary};
