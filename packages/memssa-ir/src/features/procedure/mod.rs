//! Procedure input model
//!
//! Statement tree and resolved types produced by the front-end. Everything
//! downstream (flow graph, locations, SSA) is derived from these values.

pub mod domain;

pub use domain::{
    BinaryOp, Expr, FieldDef, LogicalOp, Procedure, Scope, Stmt, Storage, StructDef, Type,
    TypeTable, UnaryOp, VarDecl, VarInfo, VarOrigin,
};
