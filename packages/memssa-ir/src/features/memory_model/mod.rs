//! Memory location model
//!
//! Canonical abstract locations, their overlap classification, resolution
//! of lvalue expressions to locations and the per-procedure location table.

pub mod domain;
pub mod infrastructure;

pub use domain::{classify, AbstractLocation, IndexKind, LocationRoot, Overlap, PathElem};
pub use infrastructure::{Access, AccessResolver, LocationTable};
