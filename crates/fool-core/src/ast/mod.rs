//! Tree model.
//!
//! The raw tree handed over by the parser and the enriched tree produced by
//! the scope resolver share these node types: resolution slots and member
//! offsets start out empty and are filled in place.
//!
//! - [`decl`]: declarations and the program root
//! - [`expr`]: expressions
//! - [`types`]: type nodes
//! - [`symbol`]: resolved-symbol records

mod decl;
mod expr;
mod symbol;
mod types;

pub use decl::{ClassDecl, Declaration, FieldDecl, FunDecl, MethodDecl, Param, Program, VarDecl};
pub use expr::{
    BinaryExpr, BinaryOp, Call, Expr, ExprKind, FieldAccess, Ident, IfExpr, MethodCall, NewExpr,
};
pub use symbol::{Resolution, SymbolEntry};
pub use types::{ArrowType, ClassType, Type};
