//! Procedures under test
//!
//! `uninit_*` cover reads of possibly never-written locals; `ssa_*` cover
//! Phi/Chi placement, unreachable code and overlap between whole aggregates
//! and their fields. Names follow the C functions they were transcribed from.

use memssa_ir::features::procedure::{BinaryOp, Expr, Stmt, Storage, Type, VarDecl};
use memssa_ir::Procedure;

use super::builders::*;

fn decl_with(name: &str, ty: Type, storage: Storage) -> Stmt {
    Stmt::Decl {
        var: VarDecl::new(name, ty).storage(storage),
        init: None,
    }
}

/// `for (int i = 0; i < bound; i++) foo = i;`
fn counting_loop(bound: Expr) -> Stmt {
    Stmt::For {
        init: Some(Box::new(Stmt::decl_init("i", Type::int(), int(0)))),
        cond: Some(bin(BinaryOp::Lt, var("i"), bound)),
        step: Some(Expr::update(var("i"))),
        body: vec![assign("foo", var("i"))],
    }
}

pub fn uninit_test1() -> Procedure {
    Procedure::new("test1").body(vec![
        Stmt::decl_init("foo", Type::int(), int(1)),
        use_value(var("foo")),
    ])
}

pub fn uninit_test2() -> Procedure {
    Procedure::new("test2").body(vec![
        Stmt::decl("foo", Type::int()),
        use_value(var("foo")),
    ])
}

pub fn uninit_test3() -> Procedure {
    Procedure::new("test3").param("b", Type::bool()).body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::if_else(var("b"), vec![assign("foo", int(1))], vec![assign("foo", int(2))]),
        use_value(var("foo")),
    ])
}

pub fn uninit_test4() -> Procedure {
    Procedure::new("test4").param("b", Type::bool()).body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::if_then(var("b"), vec![assign("foo", int(1))]),
        use_value(var("foo")),
    ])
}

/// Constant trip count; telling it runs at least once needs numeric reasoning
pub fn uninit_test5_constant() -> Procedure {
    Procedure::new("test5").body(vec![
        Stmt::decl("foo", Type::int()),
        counting_loop(int(10)),
        use_value(var("foo")),
    ])
}

pub fn uninit_test5_count() -> Procedure {
    Procedure::new("test5_count").param("count", Type::int()).body(vec![
        Stmt::decl("foo", Type::int()),
        counting_loop(var("count")),
        use_value(var("foo")),
    ])
}

/// Correlated branches
pub fn uninit_test6() -> Procedure {
    Procedure::new("test6").param("b", Type::bool()).body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::if_then(var("b"), vec![assign("foo", int(42))]),
        Stmt::if_then(var("b"), vec![use_value(var("foo"))]),
    ])
}

pub fn uninit_test7() -> Procedure {
    Procedure::new("test7").param("b", Type::bool()).body(vec![
        Stmt::decl_init("set", Type::bool(), int(0)),
        Stmt::decl("foo", Type::int()),
        Stmt::if_then(
            var("b"),
            vec![assign("foo", int(42)), assign("set", int(1))],
        ),
        Stmt::if_then(var("set"), vec![use_value(var("foo"))]),
    ])
}

pub fn uninit_test8() -> Procedure {
    Procedure::new("test8").body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::decl_init("count", Type::int(), int(1)),
        Stmt::While {
            cond: bin(BinaryOp::Gt, var("count"), int(0)),
            body: vec![assign("foo", int(42)), incr(var("count"))],
        },
        use_value(var("foo")),
    ])
}

pub fn uninit_test9() -> Procedure {
    Procedure::new("test9").param("count", Type::int()).body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::decl_init("set", Type::bool(), int(0)),
        Stmt::While {
            cond: bin(BinaryOp::Gt, var("count"), int(0)),
            body: vec![
                assign("foo", int(42)),
                assign("set", int(1)),
                incr(var("count")),
            ],
        },
        Stmt::if_then(not(var("set")), vec![assign("foo", int(42))]),
        use_value(var("foo")),
    ])
}

pub fn uninit_test10() -> Procedure {
    Procedure::new("test10").body(vec![
        decl_with("i", Type::int(), Storage::Extern),
        use_value(var("i")),
    ])
}

pub fn uninit_test11() -> Procedure {
    Procedure::new("test11").body(vec![
        decl_with("i", Type::int(), Storage::Static),
        use_value(var("i")),
    ])
}

pub fn uninit_test12() -> Procedure {
    Procedure::new("test12").body(vec![
        decl_with("i", Type::array_of(Type::int(), Some(10)), Storage::Static),
        use_value(Expr::index(var("i"), int(0))),
    ])
}

/// Address taken but never handed to anyone
pub fn uninit_test13() -> Procedure {
    Procedure::new("test13").body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::expr(Expr::addr_of(var("foo"))),
        use_value(var("foo")),
    ])
}

/// `void init(int* p) { *p = 1; }`
pub fn init_through_pointer() -> Procedure {
    Procedure::new("init")
        .param("p", Type::pointer_to(Type::int()))
        .body(vec![Stmt::assign(Expr::deref(var("p")), int(1))])
}

pub fn uninit_test14() -> Procedure {
    Procedure::new("test14").body(vec![
        Stmt::decl("foo", Type::int()),
        call("init", vec![Expr::addr_of(var("foo"))]),
        use_value(var("foo")),
    ])
}

pub fn uninit_test15() -> Procedure {
    Procedure::new("test15").body(vec![
        Stmt::decl("foo", Type::int()),
        call("init", vec![int(42), Expr::addr_of(var("foo")), int(0)]),
        use_value(var("foo")),
    ])
}

/// Variadic callee that never writes through its arguments
pub fn uninit_test16() -> Procedure {
    Procedure::new("test16").body(vec![
        Stmt::decl("foo", Type::int()),
        call("nonInit", vec![int(42), Expr::addr_of(var("foo")), int(0)]),
        use_value(var("foo")),
    ])
}

/// Only the address of `foo` is compared
pub fn uninit_test17() -> Procedure {
    Procedure::new("test17").param("b", Type::bool()).body(vec![
        Stmt::decl("foo", Type::int()),
        Stmt::decl_init(
            "p",
            Type::pointer_to(Type::int()),
            Expr::cast(Type::pointer_to(Type::int()), int(0)),
        ),
        Stmt::if_then(var("b"), vec![assign("p", Expr::addr_of(var("foo")))]),
        Stmt::ret(bin(BinaryOp::Eq, var("p"), Expr::addr_of(var("foo")))),
    ])
}

pub fn uninit_test18() -> Procedure {
    Procedure::new("test18").body(vec![
        Stmt::decl("x", Type::int()),
        Stmt::assign(Expr::deref(Expr::addr_of(var("x"))), int(1)),
        use_value(var("x")),
    ])
}

/// `((char*)(void*)&x)[0] = 0;` writes only the first byte
pub fn uninit_test19() -> Procedure {
    let first_byte = Expr::index(
        Expr::cast(
            Type::pointer_to(Type::char()),
            Expr::cast(Type::pointer_to(Type::Void), Expr::addr_of(var("x"))),
        ),
        int(0),
    );
    Procedure::new("test19").body(vec![
        Stmt::decl("x", Type::int()),
        Stmt::assign(first_byte, int(0)),
        use_value(var("x")),
    ])
}

pub fn uninit_test20() -> Procedure {
    Procedure::new("test20").body(vec![
        Stmt::decl("x", Type::int()),
        Stmt::expr(Expr::compound_assign(BinaryOp::Add, var("x"), int(0))),
        use_value(var("x")),
    ])
}

/// Overloaded `>>` lowered to a call; both operands are read
pub fn uninit_test21() -> Procedure {
    Procedure::new("test21").body(vec![
        Stmt::decl_init("v1", point(), Expr::InitList(vec![int(1), int(1)])),
        Stmt::decl("v2", point()),
        Stmt::decl("v3", point()),
        Stmt::decl("i", Type::int()),
        Stmt::expr(Expr::call("shr", vec![var("v1"), var("i")])),
        Stmt::expr(Expr::call("shr", vec![var("v2"), int(1)])),
    ])
}

fn abs_body(j_init: Option<Expr>, else_zero: bool) -> Vec<Stmt> {
    let negative = vec![assign("j", neg(var("i")))];
    let inner = if else_zero {
        Stmt::if_else(
            bin(BinaryOp::Lt, var("i"), int(0)),
            negative,
            vec![assign("j", int(0))],
        )
    } else {
        Stmt::if_then(bin(BinaryOp::Lt, var("i"), int(0)), negative)
    };
    vec![
        Stmt::Decl {
            var: VarDecl::new("j", Type::int()),
            init: j_init,
        },
        Stmt::if_else(
            bin(BinaryOp::Gt, var("i"), int(0)),
            vec![assign("j", var("i"))],
            vec![inner],
        ),
        Stmt::ret(var("j")),
    ]
}

pub fn abs_wrong() -> Procedure {
    Procedure::new("absWrong")
        .param("i", Type::int())
        .body(abs_body(None, false))
}

pub fn abs_correct1() -> Procedure {
    Procedure::new("absCorrect1")
        .param("i", Type::int())
        .body(abs_body(Some(int(0)), false))
}

pub fn abs_correct2() -> Procedure {
    Procedure::new("absCorrect2")
        .param("i", Type::int())
        .body(abs_body(None, true))
}

// ---------------------------------------------------------------------------
// SSA shapes
// ---------------------------------------------------------------------------

pub fn ssa_chi_phi_node() -> Procedure {
    let bump = |field: &str| incr(Expr::arrow(var("p"), field));
    Procedure::new("ChiPhiNode")
        .param("p", Type::pointer_to(point()))
        .param("which1", Type::bool())
        .param("which2", Type::bool())
        .body(vec![
            Stmt::if_else(var("which1"), vec![bump("x")], vec![bump("y")]),
            Stmt::if_else(var("which2"), vec![bump("x")], vec![bump("y")]),
            Stmt::ret(bin(
                BinaryOp::Add,
                Expr::arrow(var("p"), "x"),
                Expr::arrow(var("p"), "y"),
            )),
        ])
}

pub fn ssa_unreachable_via_goto() -> Procedure {
    Procedure::new("UnreachableViaGoto").body(vec![
        Stmt::Goto("skip".to_string()),
        Stmt::ret(int(1)),
        Stmt::Label("skip".to_string()),
        Stmt::ret(int(0)),
    ])
}

pub fn ssa_unreachable_if() -> Procedure {
    let pick = |cond: Expr, first: i64, second: i64| {
        Stmt::if_else(cond, vec![Stmt::ret(int(first))], vec![Stmt::ret(int(second))])
    };
    Procedure::new("UnreachableIf").param("b", Type::bool()).body(vec![
        Stmt::decl_init("x", Type::int(), int(5)),
        Stmt::decl_init("y", Type::int(), int(10)),
        Stmt::if_else(
            var("b"),
            vec![pick(bin(BinaryOp::Eq, var("x"), var("y")), 1, 0)],
            vec![pick(bin(BinaryOp::Lt, var("x"), var("y")), 0, 1)],
        ),
    ])
}

pub fn ssa_do_while_false() -> Procedure {
    Procedure::new("DoWhileFalse").body(vec![
        Stmt::decl_init("i", Type::int(), int(0)),
        Stmt::DoWhile {
            body: vec![incr(var("i"))],
            cond: int(0),
        },
        Stmt::ret(var("i")),
    ])
}

/// `while (n-- > 0) *p++ = 0;`
pub fn ssa_chi_node_at_end_of_loop() -> Procedure {
    Procedure::new("chiNodeAtEndOfLoop")
        .param("n", Type::int())
        .param("p", Type::pointer_to(Type::char()))
        .body(vec![Stmt::While {
            cond: bin(BinaryOp::Gt, Expr::update(var("n")), int(0)),
            body: vec![Stmt::assign(
                Expr::deref(Expr::update(var("p"))),
                int(0),
            )],
        }])
}

fn escape_a() -> Stmt {
    call("Escape", vec![Expr::addr_of(var("a"))])
}

pub fn ssa_must_exactly_overlap(escaped: bool) -> Procedure {
    let mut body = vec![Stmt::decl_init("b", point(), var("a"))];
    if escaped {
        body.push(escape_a());
    }
    Procedure::new("MustExactlyOverlap").param("a", point()).body(body)
}

pub fn ssa_must_totally_overlap(escaped: bool) -> Procedure {
    let mut body = vec![
        Stmt::decl_init("x", Type::int(), Expr::field(var("a"), "x")),
        Stmt::decl_init("y", Type::int(), Expr::field(var("a"), "y")),
    ];
    if escaped {
        body.push(escape_a());
    }
    Procedure::new("MustTotallyOverlap").param("a", point()).body(body)
}

pub fn ssa_may_partially_overlap(escaped: bool) -> Procedure {
    let mut body = vec![
        Stmt::decl_init("a", point(), Expr::InitList(vec![var("x"), var("y")])),
        Stmt::decl_init("b", point(), var("a")),
    ];
    if escaped {
        body.push(escape_a());
    }
    Procedure::new("MayPartiallyOverlap")
        .param("x", Type::int())
        .param("y", Type::int())
        .body(body)
}

/// Every fixture, for batch runs
pub fn all_fixtures() -> Vec<Procedure> {
    vec![
        uninit_test1(),
        uninit_test2(),
        uninit_test3(),
        uninit_test4(),
        uninit_test5_constant(),
        uninit_test5_count(),
        uninit_test6(),
        uninit_test7(),
        uninit_test8(),
        uninit_test9(),
        uninit_test10(),
        uninit_test11(),
        uninit_test12(),
        uninit_test13(),
        init_through_pointer(),
        uninit_test14(),
        uninit_test15(),
        uninit_test16(),
        uninit_test17(),
        uninit_test18(),
        uninit_test19(),
        uninit_test20(),
        uninit_test21(),
        abs_wrong(),
        abs_correct1(),
        abs_correct2(),
        ssa_chi_phi_node(),
        ssa_unreachable_via_goto(),
        ssa_unreachable_if(),
        ssa_do_while_false(),
        ssa_chi_node_at_end_of_loop(),
        ssa_must_exactly_overlap(false),
        ssa_must_exactly_overlap(true),
        ssa_must_totally_overlap(false),
        ssa_must_totally_overlap(true),
        ssa_may_partially_overlap(false),
        ssa_may_partially_overlap(true),
    ]
}
