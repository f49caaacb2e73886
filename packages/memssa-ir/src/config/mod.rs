//! Configuration system
//!
//! ```rust,ignore
//! use memssa_ir::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default().pure_callee("strlen");
//! let config = AnalysisConfig::from_yaml_file("memssa.yaml")?;
//! ```

pub mod analysis_config;
pub mod error;
pub mod validation;

pub use analysis_config::AnalysisConfig;
pub use error::{ConfigError, ConfigResult};
pub use validation::Validatable;
