//! Location model domain (pure, no dependencies on the flow graph)

pub mod location;
pub mod overlap;

pub use location::{AbstractLocation, IndexKind, LocationRoot, PathElem};
pub use overlap::{classify, Overlap};
