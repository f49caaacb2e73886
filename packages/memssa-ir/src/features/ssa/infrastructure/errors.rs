/*
 * SSA Error Types
 *
 * Raised only for internal inconsistencies between the flow graph and the
 * location table; modelling degradations are precision notes instead.
 */

use thiserror::Error;

use crate::shared::models::{ProgramPoint, UseId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SsaError {
    /// Flow graph without its entry block
    #[error("Invalid CFG: {reason}")]
    InvalidCfg { reason: String },

    /// An operation names a location the table never interned
    #[error("Location '{location}' at {point} is not in the location table")]
    UnknownLocation { location: String, point: ProgramPoint },

    /// A load whose use id has no use site
    #[error("Use {use_id} has no use site")]
    UnknownUse { use_id: UseId },
}

/// Result type for SSA operations
pub type SsaResult<T> = Result<T, SsaError>;
