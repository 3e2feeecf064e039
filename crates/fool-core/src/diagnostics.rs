//! Diagnostics collected across the semantic phases.
//!
//! Scope resolution and type checking report into two independent channels.
//! Compilation fails if either channel is non-empty, but both phases always
//! run to completion so every independent error gets reported.

use std::fmt;

use crate::error::{ResolveError, TypeError};

/// The phase that reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ScopeResolution,
    TypeCheck,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::ScopeResolution => "scope",
            Phase::TypeCheck => "type",
        })
    }
}

/// A single reported error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    /// Source line (0 when the tree carried none).
    pub line: u32,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.phase, self.message)
    }
}

impl From<&ResolveError> for Diagnostic {
    fn from(err: &ResolveError) -> Self {
        Self {
            phase: Phase::ScopeResolution,
            message: err.to_string(),
            line: err.line(),
        }
    }
}

impl From<&TypeError> for Diagnostic {
    fn from(err: &TypeError) -> Self {
        Self {
            phase: Phase::TypeCheck,
            message: err.to_string(),
            line: err.line(),
        }
    }
}

/// Ordered list of diagnostics with per-phase counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_resolve<'a>(&mut self, errors: impl IntoIterator<Item = &'a ResolveError>) {
        self.items.extend(errors.into_iter().map(Diagnostic::from));
    }

    pub fn extend_type<'a>(&mut self, errors: impl IntoIterator<Item = &'a TypeError>) {
        self.items.extend(errors.into_iter().map(Diagnostic::from));
    }

    /// Number of scope-resolution errors.
    pub fn scope_errors(&self) -> usize {
        self.count(Phase::ScopeResolution)
    }

    /// Number of type errors.
    pub fn type_errors(&self) -> usize {
        self.count(Phase::TypeCheck)
    }

    fn count(&self, phase: Phase) -> usize {
        self.items.iter().filter(|d| d.phase == phase).count()
    }

    pub fn has_errors(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Diagnostics from one phase, in report order.
    pub fn by_phase(&self, phase: Phase) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.phase == phase)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.items {
            writeln!(f, "{diagnostic}")?;
        }
        write!(
            f,
            "You had {} symbol table errors and {} type checking errors.",
            self.scope_errors(),
            self.type_errors()
        )
    }
}
