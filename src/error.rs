//! Errors of the whole pipeline.

use fool_core::{CodegenError, Diagnostics};
use fool_vm::VmError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Scope or type errors; no code was generated.
    #[error("{0}")]
    Compilation(Diagnostics),

    #[error(transparent)]
    Codegen(#[from] CodegenError),

    #[error(transparent)]
    Vm(#[from] VmError),
}

impl Error {
    /// The diagnostics, if compilation failed.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Error::Compilation(diagnostics) => Some(diagnostics),
            _ => None,
        }
    }

    pub fn is_compilation_error(&self) -> bool {
        matches!(self, Error::Compilation(_))
    }
}
