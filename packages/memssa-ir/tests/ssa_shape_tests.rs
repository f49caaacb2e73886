//! Phi and Chi placement on small procedures
//!
//! Checks the shape of the SSA graph directly: which definitions exist for a
//! location, what a use resolves to and how copies and calls are modelled.

mod common;

use common::*;
use memssa_ir::features::procedure::{Expr, Stmt, Type};
use memssa_ir::{
    AnalysisConfig, ChiCause, DefKind, Definition, Initialization, LocId, MemorySsa, Procedure,
    ReachingDefinitions,
};

fn loc(ssa: &MemorySsa, name: &str) -> LocId {
    let ids = ssa.locations().find_by_name(name);
    assert_eq!(ids.len(), 1, "{} should be tracked once in {}", name, ssa.name());
    ids[0]
}

fn defs<'a>(ssa: &'a MemorySsa, name: &str) -> Vec<&'a Definition> {
    ssa.graph().defs_of(loc(ssa, name)).collect()
}

fn chi_causes(ssa: &MemorySsa, name: &str) -> Vec<ChiCause> {
    defs(ssa, name)
        .into_iter()
        .filter_map(|d| match d.kind {
            DefKind::Chi { cause, .. } => Some(cause),
            _ => None,
        })
        .collect()
}

fn has_phi(ssa: &MemorySsa, name: &str) -> bool {
    defs(ssa, name).iter().any(|d| d.is_phi())
}

// ============================================================================
// Merges and loops
// ============================================================================

#[test]
fn test_chi_phi_node() {
    let ssa = analyze(&ssa_chi_phi_node());

    let use_id = last_use(&ssa, "(*p)[0].x");
    let reaching = ssa.reaching_definitions(use_id);
    assert_eq!(reaching.len(), 3);
    assert_eq!(reaching.iter().filter(|d| d.kind == DefKind::Entry).count(), 1);
    assert_eq!(
        reaching
            .iter()
            .filter(|d| matches!(d.kind, DefKind::Write { .. }))
            .count(),
        2
    );
    assert_eq!(ssa.initialization(use_id), Initialization::Initialized);

    // Writes to `x` leave `y` alone
    assert!(has_phi(&ssa, "(*p)[0].x"));
    assert!(chi_causes(&ssa, "(*p)[0].y").is_empty());
}

#[test]
fn test_unreachable_via_goto() {
    let ssa = analyze(&ssa_unreachable_via_goto());

    let dead: Vec<_> = ssa.cfg().blocks.iter().filter(|b| !b.reachable).collect();
    assert!(!dead.is_empty());
    for block in dead {
        assert!(!ssa.is_block_reachable(block.id));
        assert!(ssa.graph().phis_at(block.id).is_empty());
    }
    assert!(ssa.is_block_reachable(ssa.cfg().exit()));
}

#[test]
fn test_unreachable_if() {
    let ssa = analyze(&ssa_unreachable_if());

    for site in &ssa.cfg().uses {
        assert!(ssa.is_block_reachable(site.point.block));
        assert_eq!(ssa.initialization(site.id), Initialization::Initialized);
    }
    assert_reported(&ssa, &[]);
}

#[test]
fn test_do_while_false_has_no_back_edge() {
    let ssa = analyze(&ssa_do_while_false());

    let use_id = last_use(&ssa, "i");
    let reaching = ssa.reaching_definitions(use_id);
    assert_eq!(reaching.len(), 1);
    assert!(matches!(reaching[0].kind, DefKind::Write { .. }));
    assert!(!has_phi(&ssa, "i"));
}

#[test]
fn test_do_while_false_without_folding() {
    let config = AnalysisConfig::default().fold_constant_conditions(false);
    let ssa = analyze_with(&ssa_do_while_false(), &config);

    assert!(has_phi(&ssa, "i"));
    assert_eq!(
        ssa.initialization(last_use(&ssa, "i")),
        Initialization::Initialized
    );
}

#[test]
fn test_chi_node_at_end_of_loop() {
    let ssa = analyze(&ssa_chi_node_at_end_of_loop());

    let through_p: Vec<LocId> = ssa
        .locations()
        .iter()
        .filter(|(_, location)| location.to_string().starts_with("(*p)[?"))
        .map(|(id, _)| id)
        .collect();
    assert_eq!(through_p.len(), 1);

    let defs: Vec<_> = ssa.graph().defs_of(through_p[0]).collect();
    assert!(defs
        .iter()
        .any(|d| matches!(d.kind, DefKind::Chi { cause: ChiCause::Retarget, .. })));
    assert!(defs.iter().any(|d| d.is_phi()));
    assert!(has_phi(&ssa, "p"));
    assert!(has_phi(&ssa, "n"));
}

// ============================================================================
// Overlap between aggregates and their fields
// ============================================================================

#[test]
fn test_must_exactly_overlap() {
    let ssa = analyze(&ssa_must_exactly_overlap(false));

    let copy = defs(&ssa, "b")
        .into_iter()
        .find_map(|d| match d.kind {
            DefKind::Copy { source } => source,
            _ => None,
        })
        .expect("b should be defined by the copy");
    let source = ssa.definition(copy).unwrap();
    assert_eq!(source.location, loc(&ssa, "a"));
    assert_eq!(source.kind, DefKind::Entry);
    assert!(chi_causes(&ssa, "a").is_empty());
}

#[test]
fn test_must_exactly_overlap_escaped() {
    let ssa = analyze(&ssa_must_exactly_overlap(true));

    assert_eq!(chi_causes(&ssa, "a"), vec![ChiCause::Call]);
    assert!(chi_causes(&ssa, "b").is_empty());
}

#[test]
fn test_must_totally_overlap() {
    let ssa = analyze(&ssa_must_totally_overlap(false));

    assert_initialization(&ssa, "a.x", Initialization::Initialized);
    assert_initialization(&ssa, "a.y", Initialization::Initialized);
    let reaching = ssa.reaching_definitions(last_use(&ssa, "a.x"));
    assert_eq!(reaching[0].kind, DefKind::Entry);
}

#[test]
fn test_must_totally_overlap_escaped() {
    let ssa = analyze(&ssa_must_totally_overlap(true));

    for name in ["a", "a.x", "a.y"] {
        assert_eq!(chi_causes(&ssa, name), vec![ChiCause::Call], "{}", name);
    }
    assert!(chi_causes(&ssa, "x").is_empty());
}

#[test]
fn test_may_partially_overlap() {
    let ssa = analyze(&ssa_may_partially_overlap(false));

    let reaching = ssa.reaching_definitions(last_use(&ssa, "a"));
    assert_eq!(reaching.len(), 1);
    assert!(matches!(reaching[0].kind, DefKind::Write { .. }));
    assert!(defs(&ssa, "b")
        .iter()
        .any(|d| matches!(d.kind, DefKind::Copy { source: Some(_) })));
}

#[test]
fn test_may_partially_overlap_escaped() {
    let ssa = analyze(&ssa_may_partially_overlap(true));

    assert_eq!(chi_causes(&ssa, "a"), vec![ChiCause::Call]);
    assert!(chi_causes(&ssa, "b").is_empty());
}

// ============================================================================
// Copies and calls
// ============================================================================

#[test]
fn test_field_of_copy_reads_mirrored_source() {
    let proc = Procedure::new("copy_then_read").body(vec![
        Stmt::decl_init("a", point(), Expr::InitList(vec![int(1), int(2)])),
        Stmt::decl_init("b", point(), var("a")),
        use_value(Expr::field(var("b"), "x")),
    ]);
    let ssa = analyze(&proc);

    let use_id = last_use(&ssa, "b.x");
    let reaching = ssa.reaching_definitions(use_id);
    assert_eq!(reaching.len(), 1);
    let DefKind::Copy {
        source: Some(source),
    } = reaching[0].kind
    else {
        panic!("b.x should be defined by the copy, got {:?}", reaching[0].kind);
    };
    let source = ssa.definition(source).unwrap();
    assert_eq!(source.location, loc(&ssa, "a.x"));
    assert!(matches!(source.kind, DefKind::Write { .. }));
    assert_eq!(ssa.initialization(use_id), Initialization::Initialized);
}

#[test]
fn test_call_chi_needs_a_prior_definition() {
    let written = Procedure::new("written").body(vec![
        Stmt::decl_init("x", Type::int(), int(1)),
        call("g", vec![Expr::addr_of(var("x"))]),
        use_value(var("x")),
    ]);
    let ssa = analyze(&written);
    let reaching = ssa.reaching_definitions(last_use(&ssa, "x"));
    assert_eq!(reaching.len(), 1);
    assert!(matches!(
        reaching[0].kind,
        DefKind::Chi {
            cause: ChiCause::Call,
            ..
        }
    ));
    assert_initialization(&ssa, "x", Initialization::InitializedUnknownValue);

    let fresh = Procedure::new("fresh").body(vec![
        Stmt::decl("x", Type::int()),
        call("g", vec![Expr::addr_of(var("x"))]),
        use_value(var("x")),
    ]);
    let ssa = analyze(&fresh);
    assert!(chi_causes(&ssa, "x").is_empty());
    assert_initialization(&ssa, "x", Initialization::Uninitialized);
}

#[test]
fn test_opaque_operands_get_chis() {
    let proc = Procedure::new("asm").body(vec![
        Stmt::decl_init("x", Type::int(), int(1)),
        Stmt::Asm {
            operands: vec![var("x")],
        },
        use_value(var("x")),
    ]);
    let ssa = analyze(&proc);

    // The trailing `use(x)` call clobbers `x` again once it has escaped
    assert_eq!(chi_causes(&ssa, "x"), vec![ChiCause::Opaque, ChiCause::Call]);
    let reaching = ssa.reaching_definitions(last_use(&ssa, "x"));
    assert!(matches!(
        reaching[0].kind,
        DefKind::Chi {
            cause: ChiCause::Opaque,
            ..
        }
    ));
    assert_initialization(&ssa, "x", Initialization::InitializedUnknownValue);
}

#[test]
fn test_pure_callee_writes_nothing() {
    let proc = Procedure::new("pure").body(vec![
        Stmt::decl_init("x", Type::int(), int(1)),
        call("strlen", vec![Expr::addr_of(var("x"))]),
        use_value(var("x")),
    ]);
    let config = AnalysisConfig::default().pure_callee("strlen");
    let ssa = analyze_with(&proc, &config);

    // `use` is still an unknown callee, but it runs after the load
    let reaching = ssa.reaching_definitions(last_use(&ssa, "x"));
    assert!(matches!(reaching[0].kind, DefKind::Write { .. }));
}

#[test]
fn test_calls_over_merged_never_written_values_keep_top() {
    let init_x = || call("init", vec![Expr::addr_of(var("x"))]);
    let in_loop = Procedure::new("init_in_loop").param("c", Type::bool()).body(vec![
        Stmt::decl("x", Type::int()),
        Stmt::While {
            cond: var("c"),
            body: vec![init_x(), use_value(var("x"))],
        },
    ]);
    let after_branch = Procedure::new("init_after_branch")
        .param("c", Type::bool())
        .body(vec![
            Stmt::decl("x", Type::int()),
            Stmt::if_then(var("c"), vec![init_x()]),
            init_x(),
            use_value(var("x")),
        ]);

    for proc in [in_loop, after_branch] {
        let ssa = analyze(&proc);
        let use_id = last_use(&ssa, "x");
        assert!(chi_causes(&ssa, "x").is_empty(), "{}", proc.name);
        assert!(ssa.reaching_definitions(use_id).iter().all(|d| d.is_top()));
        assert_eq!(ssa.initialization(use_id), Initialization::Uninitialized);
        assert!(!ssa.notes().is_empty());
    }
}
