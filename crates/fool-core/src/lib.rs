//! Shared model for the FOOL compiler and virtual machine.
//!
//! ## Modules
//!
//! - [`ast`]: tree nodes, types and resolved-symbol records
//! - [`hierarchy`]: the single-inheritance class map
//! - [`bytecode`]: opcodes and encoded programs
//! - [`diagnostics`]: the per-phase error report
//! - [`error`]: error enums for every phase

pub mod ast;
pub mod bytecode;
pub mod diagnostics;
pub mod error;
pub mod hierarchy;

pub use ast::{
    ArrowType, BinaryOp, ClassDecl, ClassType, Declaration, Expr, ExprKind, FieldDecl, FunDecl,
    MethodDecl, Param, Program, Resolution, SymbolEntry, Type, VarDecl,
};
pub use bytecode::{Bytecode, Instruction, OpCode};
pub use diagnostics::{Diagnostic, Diagnostics, Phase};
pub use error::{BytecodeError, CodegenError, DeclKind, ResolveError, TypeError};
pub use hierarchy::ClassHierarchy;

/// Words of machine memory, shared by stack and heap.
pub const DEFAULT_MEMORY_SIZE: usize = 10_000;

/// Maximum program length in words.
pub const DEFAULT_CODE_SIZE: usize = 10_000;

/// Value used for `null`: an address no object pointer can have.
pub const NULL_POINTER: i32 = -1;
