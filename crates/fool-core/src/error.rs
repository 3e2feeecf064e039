//! Error types for each phase of the pipeline.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ResolveError   - scope resolution (duplicate / undeclared names, bad overrides)
//! TypeError      - type checking (subtype violations, arity, non-callables)
//! CodegenError   - code generation over a tree that was not fully resolved
//! BytecodeError  - decoding malformed encoded programs
//! ```
//!
//! Resolve and type errors are non-fatal: the phases report them and keep
//! walking. Every variant carries the source line it was reported for.

use thiserror::Error;

use crate::bytecode::OpCode;

// ============================================================================
// Scope Resolution Errors
// ============================================================================

/// Kind of declaration, used in resolver messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Var,
    Fun,
    Par,
    Class,
    Field,
    Method,
}

impl std::fmt::Display for DeclKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DeclKind::Var => "Var",
            DeclKind::Fun => "Fun",
            DeclKind::Par => "Par",
            DeclKind::Class => "Class",
            DeclKind::Field => "Field",
            DeclKind::Method => "Method",
        })
    }
}

/// Errors reported by the scope resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// A name declared twice in the same scope. The first declaration stays.
    #[error("{kind} id {name} at line {line} already declared")]
    DuplicateDeclaration {
        kind: DeclKind,
        name: String,
        line: u32,
    },

    /// A use with no visible declaration.
    #[error("{kind} id {name} at line {line} not declared")]
    Undeclared {
        kind: DeclKind,
        name: String,
        line: u32,
    },

    /// A class name that is not declared (in `new`, `extends` or a type).
    #[error("Class {name} at line {line} not declared")]
    UndeclaredClass { name: String, line: u32 },

    /// `object.member` where the class has no such member.
    #[error("Class {class} has no member {member} at line {line}")]
    UndeclaredMember {
        class: String,
        member: String,
        line: u32,
    },

    /// `object.member` where `object` is not of class type.
    #[error("Id {name} at line {line} is not an object")]
    NotAnObject { name: String, line: u32 },

    /// A field overriding a method or the reverse.
    #[error("Cannot override {inherited} {member} of class {class} with a {kind} at line {line}")]
    InvalidOverride {
        class: String,
        member: String,
        inherited: DeclKind,
        kind: DeclKind,
        line: u32,
    },

    /// A class declared anywhere but the global scope.
    #[error("Class {name} at line {line} must be declared at global scope")]
    NestedClass { name: String, line: u32 },
}

impl ResolveError {
    pub fn line(&self) -> u32 {
        match self {
            ResolveError::DuplicateDeclaration { line, .. }
            | ResolveError::Undeclared { line, .. }
            | ResolveError::UndeclaredClass { line, .. }
            | ResolveError::UndeclaredMember { line, .. }
            | ResolveError::NotAnObject { line, .. }
            | ResolveError::InvalidOverride { line, .. }
            | ResolveError::NestedClass { line, .. } => *line,
        }
    }
}

// ============================================================================
// Type Errors
// ============================================================================

/// Errors reported by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Operand types that an operator does not accept.
    #[error("{message} at line {line}")]
    Mismatch { message: String, line: u32 },

    #[error("Wrong number of parameters in the invocation of {callee} at line {line}: expected {expected}, found {found}")]
    WrongArity {
        callee: String,
        expected: usize,
        found: usize,
        line: u32,
    },

    /// First argument that is not a subtype of its parameter (1-based).
    #[error("Wrong type for {index}-th parameter in the invocation of {callee} at line {line}")]
    WrongArgument {
        callee: String,
        index: usize,
        line: u32,
    },

    #[error("Invocation of a non-function/method {name} at line {line}")]
    NotCallable { name: String, line: u32 },

    #[error("Wrong return type for {name} at line {line}")]
    WrongReturnType { name: String, line: u32 },

    #[error("Incompatible value for variable {name} at line {line}")]
    IncompatibleValue { name: String, line: u32 },

    #[error("Incompatible types in then-else branches at line {line}")]
    IncompatibleBranches { line: u32 },

    /// An inherited member redeclared with a type that is not a subtype of
    /// the inherited one.
    #[error("Wrong type for overriding {member} in class {class} at line {line}")]
    BadOverride {
        class: String,
        member: String,
        line: u32,
    },

    /// An identifier used in a position its declaration does not allow.
    #[error("Wrong usage of {what} {name} at line {line}")]
    IllegalUse {
        what: &'static str,
        name: String,
        line: u32,
    },

    /// `new` applied to something that is not a class.
    #[error("Inconsistent type {name} at line {line}")]
    NotAClass { name: String, line: u32 },
}

impl TypeError {
    pub fn mismatch(message: impl Into<String>, line: u32) -> Self {
        TypeError::Mismatch {
            message: message.into(),
            line,
        }
    }

    pub fn line(&self) -> u32 {
        match self {
            TypeError::Mismatch { line, .. }
            | TypeError::WrongArity { line, .. }
            | TypeError::WrongArgument { line, .. }
            | TypeError::NotCallable { line, .. }
            | TypeError::WrongReturnType { line, .. }
            | TypeError::IncompatibleValue { line, .. }
            | TypeError::IncompatibleBranches { line }
            | TypeError::BadOverride { line, .. }
            | TypeError::IllegalUse { line, .. }
            | TypeError::NotAClass { line, .. } => *line,
        }
    }
}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// Errors from running the code generator on a tree that still has gaps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("{name} at line {line} has no resolved declaration")]
    Unresolved { name: String, line: u32 },

    #[error("{name} at line {line} is not a class")]
    NotAClass { name: String, line: u32 },

    /// A jump or call target that was never placed.
    #[error("label {label} was never bound")]
    UnboundLabel { label: u32 },
}

// ============================================================================
// Bytecode Errors
// ============================================================================

/// Errors decoding an encoded program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    #[error("invalid opcode {word} at address {address}")]
    InvalidOpcode { word: i32, address: usize },

    #[error("missing operand for {op:?} at address {address}")]
    MissingOperand { op: OpCode, address: usize },

    #[error("address {address} is outside the program")]
    OutOfBounds { address: usize },
}
