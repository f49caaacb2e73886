//! Analysis configuration
//!
//! One flat config drives the whole per-procedure pipeline. Every field has a
//! default, so a YAML file only needs to name what it overrides.

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_BLOCKS_LIMIT: usize = 10_000_000;
const MAX_THREADS_LIMIT: usize = 1024;

/// Memory SSA analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Analyze independent procedures on the rayon pool
    pub parallel: bool,

    /// Worker threads for batch analysis (0 = one per CPU)
    pub num_threads: usize,

    /// Procedures lowering to more blocks than this are reported unanalyzable (1..=10000000)
    pub max_blocks: usize,

    /// Prune the infeasible edge of literal-constant conditions (`while (0)`, `if (1)`)
    pub fold_constant_conditions: bool,

    /// Callees known not to write through their arguments
    ///
    /// Calls carrying the front-end purity flag are pure regardless of this list.
    pub pure_callees: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            num_threads: 0,
            max_blocks: 100_000,
            fold_constant_conditions: true,
            pure_callees: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Parse from a YAML document and validate
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file and validate
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builder: Set parallel
    pub fn parallel(mut self, v: bool) -> Self {
        self.parallel = v;
        self
    }

    /// Builder: Set num_threads
    pub fn num_threads(mut self, v: usize) -> Self {
        self.num_threads = v;
        self
    }

    /// Builder: Set max_blocks
    pub fn max_blocks(mut self, v: usize) -> Self {
        self.max_blocks = v;
        self
    }

    /// Builder: Set fold_constant_conditions
    pub fn fold_constant_conditions(mut self, v: bool) -> Self {
        self.fold_constant_conditions = v;
        self
    }

    /// Builder: Add a pure callee name
    pub fn pure_callee(mut self, name: impl Into<String>) -> Self {
        self.pure_callees.push(name.into());
        self
    }

    /// Thread count after resolving the `0 = all CPUs` default
    pub fn effective_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    pub fn is_pure_callee(&self, callee: &str) -> bool {
        self.pure_callees.iter().any(|name| name == callee)
    }
}

impl Validatable for AnalysisConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_blocks == 0 || self.max_blocks > MAX_BLOCKS_LIMIT {
            return Err(ConfigError::range_with_hint(
                "max_blocks",
                self.max_blocks,
                1,
                MAX_BLOCKS_LIMIT,
                "A procedure needs at least its entry block",
            ));
        }

        if self.num_threads > MAX_THREADS_LIMIT {
            return Err(ConfigError::range_with_hint(
                "num_threads",
                self.num_threads,
                0,
                MAX_THREADS_LIMIT,
                "Use 0 to size the pool from the CPU count",
            ));
        }

        if let Some(empty) = self.pure_callees.iter().position(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "pure_callees[{}] is empty",
                empty
            )));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "AnalysisConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.parallel);
        assert!(config.fold_constant_conditions);
        assert!(config.effective_threads() >= 1);
    }

    #[test]
    fn test_yaml_partial_override() {
        let config = AnalysisConfig::from_yaml_str(
            "max_blocks: 64\npure_callees:\n  - strlen\n  - printf\n",
        )
        .unwrap();
        assert_eq!(config.max_blocks, 64);
        assert!(config.parallel, "unspecified fields keep their defaults");
        assert!(config.is_pure_callee("strlen"));
        assert!(!config.is_pure_callee("memset"));
    }

    #[test]
    fn test_yaml_range_violation() {
        let err = AnalysisConfig::from_yaml_str("max_blocks: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "max_blocks"));
    }

    #[test]
    fn test_empty_pure_callee_rejected() {
        let config = AnalysisConfig::default().pure_callee("  ");
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let config = AnalysisConfig::default()
            .parallel(false)
            .num_threads(2)
            .pure_callee("strcmp");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();

        let loaded = AnalysisConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.effective_threads(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AnalysisConfig::from_yaml_file("/nonexistent/memssa.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
