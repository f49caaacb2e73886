//! Shared models

mod ids;
mod precision;

pub use ids::{BlockId, DefId, LocId, ProgramPoint, UseId};
pub use precision::{NoteReason, PrecisionNote};
