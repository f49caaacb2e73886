//! Dense identifiers shared by the flow graph, location table and SSA graph
//!
//! All ids are indices into per-procedure vectors; they are only meaningful
//! together with the procedure they were produced for.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// Basic block identifier
    BlockId,
    "bb"
);

dense_id!(
    /// Abstract location identifier (index into the location table)
    LocId,
    "loc"
);

dense_id!(
    /// Definition identifier (Top, entry, write, copy, Phi or Chi)
    DefId,
    "def"
);

dense_id!(
    /// Use identifier (one per load operation)
    UseId,
    "use"
);

/// Position of an operation inside a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProgramPoint {
    pub block: BlockId,
    pub index: usize,
}

impl ProgramPoint {
    pub fn new(block: BlockId, index: usize) -> Self {
        Self { block, index }
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(BlockId(3).to_string(), "bb3");
        assert_eq!(DefId(0).to_string(), "def0");
        assert_eq!(ProgramPoint::new(BlockId(2), 5).to_string(), "bb2:5");
    }

    #[test]
    fn test_ordering_follows_index() {
        assert!(DefId::new(1) < DefId::new(2));
        assert_eq!(UseId::new(7).index(), 7);
    }
}
