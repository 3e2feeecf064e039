//! FOOL compiler.
//!
//! Three passes over a tree built by an external parser:
//!
//! - **Scope resolution** ([`resolve`]): levels, offsets and resolved symbols
//! - **Type checking** ([`typeck`]): subtyping, joins and override checks
//! - **Code generation** ([`codegen`]): static chains and dispatch tables
//!
//! ## Modules
//!
//! - [`resolve`]: scope tables and the resolver
//! - [`typeck`]: type relations and the checker
//! - [`emit`]: label-based bytecode emitter
//! - [`codegen`]: tree to bytecode

pub mod codegen;
pub mod emit;
pub mod resolve;
pub mod typeck;

pub use codegen::{CodeGenerator, CodegenOptions, generate};
pub use emit::{BytecodeEmitter, Label};
pub use resolve::{ResolveOutput, Resolver, ScopeStack, SymbolTable, VirtualTable, resolve};
pub use typeck::{CheckOutput, TypeChecker, check, is_subtype, join};

// Re-export the errors from core for convenience
pub use fool_core::{CodegenError, ResolveError, TypeError};
