//! Precision notes
//!
//! Modelling degradations are not errors: the analysis resolves them
//! conservatively and leaves a note so consumers can tell a weak answer
//! from a precise one.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ProgramPoint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteReason {
    /// Field access on a type without that field (or without a layout)
    UnknownField(String),
    /// Re-derived pointer indexes past the object it was derived from
    OutOfRange,
    /// Reinterpretation whose sizes are unknown or do not fit
    Reinterpretation,
    /// Pointer value too complex to name its target
    UnknownPointerBase,
    /// A call or opaque operation may write a location that has no prior
    /// definition; the location keeps its never-defined state
    PossibleWriteOverUndefined,
}

impl fmt::Display for NoteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteReason::UnknownField(field) => write!(f, "unknown field '{}'", field),
            NoteReason::OutOfRange => write!(f, "re-derived access out of range"),
            NoteReason::Reinterpretation => write!(f, "unsized reinterpretation"),
            NoteReason::UnknownPointerBase => write!(f, "unnamed pointer target"),
            NoteReason::PossibleWriteOverUndefined => {
                write!(f, "possible indirect write to a never-defined location")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionNote {
    /// Operation the note is about (`None` while the operation is not placed yet)
    pub point: Option<ProgramPoint>,
    /// Display form of the affected location
    pub location: String,
    pub reason: NoteReason,
}

impl fmt::Display for PrecisionNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.point {
            Some(point) => write!(f, "{} at {}: {}", self.location, point, self.reason),
            None => write!(f, "{}: {}", self.location, self.reason),
        }
    }
}
