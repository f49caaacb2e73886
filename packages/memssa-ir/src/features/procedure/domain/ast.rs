//! Procedure statement/expression tree
//!
//! This is the boundary with the (external) front-end: names are already
//! resolved to unique per-procedure variables and every declaration carries
//! its type. The tree is C-shaped: assignments are expressions, `case` and
//! labels are statements inside a body, `goto` is allowed.

use serde::{Deserialize, Serialize};

use super::types::Type;

/// Storage class of a declared variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Automatic (stack) storage: starts uninitialized
    #[default]
    Auto,
    /// Function- or file-level static: zero-initialized before entry
    Static,
    /// Defined in another translation unit
    Extern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub storage: Storage,
}

impl VarDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            storage: Storage::Auto,
        }
    }

    /// Builder: Set storage class
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Short-circuit operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Int(i64),
    Str(String),
    Var(String),
    /// `base.field`, or `base->field` when `arrow` is set
    Member {
        base: Box<Expr>,
        field: String,
        arrow: bool,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Deref(Box<Expr>),
    AddrOf(Box<Expr>),
    Cast {
        ty: Type,
        expr: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `lhs = rhs`, or `lhs op= rhs` when `op` is set
    Assign {
        op: Option<BinaryOp>,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `++x`, `x++`, `--x`, `x--`
    Update(Box<Expr>),
    Call {
        callee: String,
        args: Vec<Expr>,
        /// Front-end knows the callee never writes through its arguments
        #[serde(default)]
        pure: bool,
    },
    /// Brace initializer `{ a, b }`
    InitList(Vec<Expr>),
}

impl Expr {
    pub fn int(value: i64) -> Self {
        Expr::Int(value)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn field(base: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            field: field.into(),
            arrow: false,
        }
    }

    pub fn arrow(base: Expr, field: impl Into<String>) -> Self {
        Expr::Member {
            base: Box::new(base),
            field: field.into(),
            arrow: true,
        }
    }

    pub fn index(base: Expr, index: Expr) -> Self {
        Expr::Index {
            base: Box::new(base),
            index: Box::new(index),
        }
    }

    pub fn deref(expr: Expr) -> Self {
        Expr::Deref(Box::new(expr))
    }

    pub fn addr_of(expr: Expr) -> Self {
        Expr::AddrOf(Box::new(expr))
    }

    pub fn cast(ty: Type, expr: Expr) -> Self {
        Expr::Cast {
            ty,
            expr: Box::new(expr),
        }
    }

    pub fn unary(op: UnaryOp, expr: Expr) -> Self {
        Expr::Unary {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::And,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Expr::Logical {
            op: LogicalOp::Or,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn conditional(cond: Expr, then_expr: Expr, else_expr: Expr) -> Self {
        Expr::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Expr::Assign {
            op: None,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn compound_assign(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Assign {
            op: Some(op),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn update(target: Expr) -> Self {
        Expr::Update(Box::new(target))
    }

    pub fn call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            pure: false,
        }
    }

    pub fn pure_call(callee: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.into(),
            args,
            pure: true,
        }
    }

    /// Integer literal value, if this is one
    pub fn as_constant(&self) -> Option<i64> {
        match self {
            Expr::Int(v) => Some(*v),
            Expr::Cast { expr, .. } => expr.as_constant(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Decl {
        var: VarDecl,
        init: Option<Expr>,
    },
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Vec<Stmt>,
    },
    /// `switch (scrutinee) { body }` with `Case`/`Default` labels in the body
    Switch {
        scrutinee: Expr,
        body: Vec<Stmt>,
    },
    Case(i64),
    Default,
    Break,
    Continue,
    Return(Option<Expr>),
    Goto(String),
    Label(String),
    /// Inline assembly: opaque, may read or write every operand
    Asm {
        operands: Vec<Expr>,
    },
}

impl Stmt {
    pub fn decl(name: impl Into<String>, ty: Type) -> Self {
        Stmt::Decl {
            var: VarDecl::new(name, ty),
            init: None,
        }
    }

    pub fn decl_init(name: impl Into<String>, ty: Type, init: Expr) -> Self {
        Stmt::Decl {
            var: VarDecl::new(name, ty),
            init: Some(init),
        }
    }

    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn assign(lhs: Expr, rhs: Expr) -> Self {
        Stmt::Expr(Expr::assign(lhs, rhs))
    }

    pub fn if_then(cond: Expr, then_branch: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch,
            else_branch: None,
        }
    }

    pub fn if_else(cond: Expr, then_branch: Vec<Stmt>, else_branch: Vec<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch,
            else_branch: Some(else_branch),
        }
    }

    pub fn ret(expr: Expr) -> Self {
        Stmt::Return(Some(expr))
    }
}

/// One procedure as handed over by the front-end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    #[serde(default)]
    pub params: Vec<VarDecl>,
    pub body: Vec<Stmt>,
}

impl Procedure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Builder: Add a parameter
    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(VarDecl::new(name, ty));
        self
    }

    /// Builder: Set the body
    pub fn body(mut self, body: Vec<Stmt>) -> Self {
        self.body = body;
        self
    }

    /// Every local declaration in the body, in source order
    pub fn local_decls(&self) -> Vec<&VarDecl> {
        let mut decls = Vec::new();
        collect_decls(&self.body, &mut decls);
        decls
    }
}

fn collect_decls<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a VarDecl>) {
    for stmt in stmts {
        match stmt {
            Stmt::Decl { var, .. } => out.push(var),
            Stmt::Block(body)
            | Stmt::While { body, .. }
            | Stmt::DoWhile { body, .. }
            | Stmt::Switch { body, .. } => collect_decls(body, out),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                collect_decls(then_branch, out);
                if let Some(else_branch) = else_branch {
                    collect_decls(else_branch, out);
                }
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    collect_decls(std::slice::from_ref(init.as_ref()), out);
                }
                collect_decls(body, out);
            }
            _ => {}
        }
    }
}
