//! Error types for memssa-ir
//!
//! Provides unified error handling across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::flow_graph::infrastructure::CfgError;
use crate::features::ssa::infrastructure::SsaError;

/// Main error type for memssa-ir operations
#[derive(Debug, Error)]
pub enum MemssaError {
    /// Statement tree could not be lowered to a flow graph
    #[error("CFG construction failed: {0}")]
    Cfg(#[from] CfgError),

    /// Flow graph and location table disagree
    #[error("SSA construction failed: {0}")]
    Ssa(#[from] SsaError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Thread pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for memssa operations
pub type Result<T> = std::result::Result<T, MemssaError>;
