//! Procedure domain model

pub mod ast;
pub mod scope;
pub mod types;

pub use ast::{BinaryOp, Expr, LogicalOp, Procedure, Stmt, Storage, UnaryOp, VarDecl};
pub use scope::{Scope, VarInfo, VarOrigin};
pub use types::{FieldDef, StructDef, Type, TypeTable};
