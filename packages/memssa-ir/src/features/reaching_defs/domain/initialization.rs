//! Initialization verdict for a use

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initialization {
    /// Every path writes the location (or it holds a value on entry)
    Initialized,
    /// Defined on every path, but some value comes from a call, an opaque
    /// operation or another may-write
    InitializedUnknownValue,
    /// A may-write (partial or through an alias) landed on a never-defined
    /// value; some bytes may still be undefined
    PartiallyInitialized,
    /// Some path reaches the use without any write
    MaybeUninitialized,
    /// No path writes the location
    Uninitialized,
    /// The use sits in an unreachable block
    Unreachable,
    /// Nothing is known (procedure not analyzed, or no such use)
    Unknown,
}

impl Initialization {
    pub fn is_definitely_initialized(&self) -> bool {
        matches!(
            self,
            Initialization::Initialized | Initialization::InitializedUnknownValue
        )
    }

    /// Some path may read a never-written value
    pub fn may_be_uninitialized(&self) -> bool {
        matches!(
            self,
            Initialization::MaybeUninitialized | Initialization::Uninitialized
        )
    }
}

impl fmt::Display for Initialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Initialization::Initialized => "initialized",
            Initialization::InitializedUnknownValue => "initialized (unknown value)",
            Initialization::PartiallyInitialized => "partially initialized",
            Initialization::MaybeUninitialized => "maybe uninitialized",
            Initialization::Uninitialized => "uninitialized",
            Initialization::Unreachable => "unreachable",
            Initialization::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
