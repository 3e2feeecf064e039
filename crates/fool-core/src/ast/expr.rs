//! Expression nodes.
//!
//! Use sites (`Ident`, `Call`, `NewExpr`, `MethodCall`, `FieldAccess`) carry
//! empty resolution slots that the scope resolver fills in.

use std::fmt;

use super::{Resolution, SymbolEntry};

/// An expression with the source line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Integer literal.
    Int(i32),
    /// Boolean literal.
    Bool(bool),
    /// Identifier use: variable, parameter, or field when inside a method.
    Id(Ident),
    /// Call of a function, or of a sibling method from inside a method body.
    Call(Call),
    /// Arithmetic, boolean and comparison operators.
    Binary(BinaryExpr),
    /// `not e`
    Not(Box<Expr>),
    /// `if c then t else e`
    If(IfExpr),
    /// `print(e)`; evaluates to `e`.
    Print(Box<Expr>),
    /// `new C(args)`
    New(NewExpr),
    /// `object.method(args)`
    MethodCall(MethodCall),
    /// `object.field`
    Field(FieldAccess),
    /// `null`
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
    Eq,
    LessEq,
    GreaterEq,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::LessEq | BinaryOp::GreaterEq)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Eq => "==",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub resolution: Option<Resolution>,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resolution: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Box<Expr>,
    pub rhs: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub class: String,
    pub args: Vec<Expr>,
    /// The class's global entry.
    pub entry: Option<SymbolEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub object: Ident,
    pub method: String,
    pub args: Vec<Expr>,
    /// The method's entry in the receiver class's virtual table.
    pub member: Option<SymbolEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccess {
    pub object: Ident,
    pub field: String,
    /// The field's entry in the receiver class's virtual table.
    pub member: Option<SymbolEntry>,
}

// ============================================================================
// Construction helpers
// ============================================================================

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self { kind, line: 0 }
    }

    /// Attach a source line.
    pub fn at(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    pub fn int(value: i32) -> Self {
        Self::new(ExprKind::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::Bool(value))
    }

    pub fn null() -> Self {
        Self::new(ExprKind::Null)
    }

    pub fn id(name: impl Into<String>) -> Self {
        Self::new(ExprKind::Id(Ident::new(name)))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(Call {
            name: name.into(),
            args,
            resolution: None,
        }))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary(BinaryExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Div, lhs, rhs)
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn less_eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::LessEq, lhs, rhs)
    }

    pub fn greater_eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::GreaterEq, lhs, rhs)
    }

    pub fn not(operand: Expr) -> Self {
        Self::new(ExprKind::Not(Box::new(operand)))
    }

    pub fn if_then_else(cond: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Self::new(ExprKind::If(IfExpr {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }))
    }

    pub fn print(operand: Expr) -> Self {
        Self::new(ExprKind::Print(Box::new(operand)))
    }

    pub fn new_object(class: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::New(NewExpr {
            class: class.into(),
            args,
            entry: None,
        }))
    }

    pub fn method_call(
        object: impl Into<String>,
        method: impl Into<String>,
        args: Vec<Expr>,
    ) -> Self {
        Self::new(ExprKind::MethodCall(MethodCall {
            object: Ident::new(object),
            method: method.into(),
            args,
            member: None,
        }))
    }

    pub fn field(object: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(ExprKind::Field(FieldAccess {
            object: Ident::new(object),
            field: field.into(),
            member: None,
        }))
    }
}
