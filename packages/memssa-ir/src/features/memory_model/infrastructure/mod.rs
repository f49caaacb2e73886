//! Location model infrastructure

pub mod access_resolver;
pub mod location_table;

pub use access_resolver::{Access, AccessResolver};
pub use location_table::LocationTable;
