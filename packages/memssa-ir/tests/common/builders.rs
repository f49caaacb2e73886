//! Test data builders
//!
//! Shorthand for the statement trees the fixtures are written in, plus the
//! one-call analysis every test starts from.

use memssa_ir::features::procedure::{BinaryOp, Expr, Stmt, StructDef, Type, TypeTable, UnaryOp};
use memssa_ir::{analyze_procedure, AnalysisConfig, MemorySsa, Procedure};

/// `struct Point { int x; int y; }` and `struct Rect { Point topLeft; Point bottomRight; }`
pub fn shape_types() -> TypeTable {
    TypeTable::new()
        .with_struct(
            StructDef::new("Point")
                .field("x", Type::int())
                .field("y", Type::int()),
        )
        .with_struct(
            StructDef::new("Rect")
                .field("topLeft", Type::named_struct("Point"))
                .field("bottomRight", Type::named_struct("Point")),
        )
}

pub fn point() -> Type {
    Type::named_struct("Point")
}

pub fn analyze(proc: &Procedure) -> MemorySsa {
    analyze_with(proc, &AnalysisConfig::default())
}

pub fn analyze_with(proc: &Procedure, config: &AnalysisConfig) -> MemorySsa {
    analyze_procedure(proc, &shape_types(), config)
        .into_ssa()
        .unwrap_or_else(|err| panic!("{} should be analyzable: {}", proc.name, err))
}

pub fn var(name: &str) -> Expr {
    Expr::var(name)
}

pub fn int(value: i64) -> Expr {
    Expr::int(value)
}

/// `use(e);`
pub fn use_value(value: Expr) -> Stmt {
    Stmt::expr(Expr::call("use", vec![value]))
}

pub fn call(callee: &str, args: Vec<Expr>) -> Stmt {
    Stmt::expr(Expr::call(callee, args))
}

pub fn assign(name: &str, value: Expr) -> Stmt {
    Stmt::assign(var(name), value)
}

pub fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::binary(op, lhs, rhs)
}

pub fn neg(value: Expr) -> Expr {
    Expr::unary(UnaryOp::Neg, value)
}

pub fn not(value: Expr) -> Expr {
    Expr::unary(UnaryOp::Not, value)
}

/// `x++` as a statement
pub fn incr(target: Expr) -> Stmt {
    Stmt::expr(Expr::update(target))
}
