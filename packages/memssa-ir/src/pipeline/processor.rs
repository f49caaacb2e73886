//! Procedure and batch entry points

use std::time::Instant;

use rayon::prelude::*;

use super::outcome::ProcedureOutcome;
use crate::config::{AnalysisConfig, Validatable};
use crate::errors::Result;
use crate::features::escape_analysis::EscapeSummary;
use crate::features::flow_graph::infrastructure::build_cfg;
use crate::features::memory_model::infrastructure::LocationTable;
use crate::features::procedure::domain::{Procedure, TypeTable};
use crate::features::ssa::infrastructure::{build_memory_ssa, MemorySsa};

/// Analyze one procedure; structural errors make it unanalyzable, never panic
pub fn analyze_procedure(
    proc: &Procedure,
    types: &TypeTable,
    config: &AnalysisConfig,
) -> ProcedureOutcome {
    match build(proc, types, config) {
        Ok(ssa) => ProcedureOutcome::Analyzed(ssa),
        Err(error) => {
            tracing::warn!(procedure = %proc.name, error = %error, "procedure is unanalyzable");
            ProcedureOutcome::Unanalyzable {
                name: proc.name.clone(),
                error,
            }
        }
    }
}

fn build(proc: &Procedure, types: &TypeTable, config: &AnalysisConfig) -> Result<MemorySsa> {
    let cfg = build_cfg(proc, types, config)?;

    // Both only read the flow graph
    let (locations, escape) = if config.parallel {
        rayon::join(|| LocationTable::build(&cfg), || EscapeSummary::analyze(&cfg))
    } else {
        (LocationTable::build(&cfg), EscapeSummary::analyze(&cfg))
    };

    Ok(build_memory_ssa(cfg, locations, escape)?)
}

/// Analyze independent procedures, in input order
///
/// Fails only on an invalid config or when the worker pool cannot be built;
/// per-procedure failures are [`ProcedureOutcome::Unanalyzable`].
pub fn analyze_batch(
    procedures: &[Procedure],
    types: &TypeTable,
    config: &AnalysisConfig,
) -> Result<Vec<ProcedureOutcome>> {
    config.validate()?;
    let start = Instant::now();

    let outcomes: Vec<ProcedureOutcome> = if config.parallel && cfg!(feature = "parallel") {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_threads())
            .build()?;
        pool.install(|| {
            procedures
                .par_iter()
                .map(|proc| analyze_procedure(proc, types, config))
                .collect()
        })
    } else {
        procedures
            .iter()
            .map(|proc| analyze_procedure(proc, types, config))
            .collect()
    };

    let analyzed = outcomes.iter().filter(|o| o.is_analyzed()).count();
    tracing::info!(
        procedures = procedures.len(),
        analyzed,
        unanalyzable = procedures.len() - analyzed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch analysis finished"
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MemssaError;
    use crate::features::procedure::domain::{Expr, Stmt, Type};
    use crate::features::reaching_defs::{Initialization, ReachingDefinitions};
    use crate::shared::models::UseId;

    #[test]
    fn test_structural_error_is_unanalyzable() {
        let proc = Procedure::new("bad").body(vec![Stmt::Break]);
        let outcome = analyze_procedure(&proc, &TypeTable::new(), &AnalysisConfig::default());

        assert!(!outcome.is_analyzed());
        assert_eq!(outcome.name(), "bad");
        assert!(matches!(outcome.error(), Some(MemssaError::Cfg(_))));
        assert_eq!(outcome.initialization(UseId(0)), Initialization::Unknown);
        assert!(outcome.definitions_reaching(UseId(0)).is_empty());
    }

    #[test]
    fn test_invalid_config_fails_batch() {
        let config = AnalysisConfig::default().max_blocks(0);
        let err = analyze_batch(&[], &TypeTable::new(), &config).unwrap_err();
        assert!(matches!(err, MemssaError::Config(_)));
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let procs: Vec<Procedure> = (0..8)
            .map(|i| {
                Procedure::new(format!("p{}", i))
                    .param("c", Type::bool())
                    .body(vec![
                        Stmt::decl("x", Type::int()),
                        Stmt::if_then(
                            Expr::var("c"),
                            vec![Stmt::assign(Expr::var("x"), Expr::int(i))],
                        ),
                        Stmt::ret(Expr::var("x")),
                    ])
            })
            .collect();
        let types = TypeTable::new();

        let parallel =
            analyze_batch(&procs, &types, &AnalysisConfig::default().num_threads(2)).unwrap();
        let sequential =
            analyze_batch(&procs, &types, &AnalysisConfig::default().parallel(false)).unwrap();

        assert_eq!(parallel.len(), 8);
        for (a, b) in parallel.iter().zip(&sequential) {
            assert_eq!(a.name(), b.name());
            let use_a = *a.ssa().unwrap().uses_of("x").last().unwrap();
            let use_b = *b.ssa().unwrap().uses_of("x").last().unwrap();
            assert_eq!(a.definitions_reaching(use_a), b.definitions_reaching(use_b));
            assert_eq!(a.initialization(use_a), Initialization::MaybeUninitialized);
        }
    }
}
