//! FOOL: a small statically typed object-oriented language.
//!
//! The pipeline takes a tree built by an external parser through
//!
//! 1. scope resolution,
//! 2. type checking,
//! 3. code generation,
//! 4. execution on the stack machine.
//!
//! Resolution and type checking always both run, so a failed compilation
//! reports every independent error. Code is generated only for programs
//! without errors.
//!
//! ```ignore
//! use fool::{Options, ast::{Declaration, Expr, Program, Type}};
//!
//! let program = Program::new(
//!     vec![Declaration::var("x", Type::Int, Expr::int(5))],
//!     Expr::add(Expr::id("x"), Expr::int(3)),
//! );
//! let outcome = fool::run(program, &Options::default())?;
//! assert_eq!(outcome.stack_top, Some(8));
//! ```

mod error;

pub use error::{Error, Result};

pub use fool_compiler::{CodegenOptions, check, generate, resolve};
pub use fool_core::{
    Bytecode, ClassHierarchy, DEFAULT_CODE_SIZE, DEFAULT_MEMORY_SIZE, Diagnostic, Diagnostics,
    Instruction, OpCode, Phase, Program, Type,
};
pub use fool_vm::{Outcome, VmConfig, VmError, VmFlags};

/// Tree constructors and node types.
pub mod ast {
    pub use fool_core::ast::*;
}

/// Settings shared by the code generator and the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Words of machine memory.
    pub memory_size: usize,
    pub vm_flags: VmFlags,
    pub max_steps: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            vm_flags: VmFlags::empty(),
            max_steps: None,
        }
    }
}

impl Options {
    pub fn codegen_options(&self) -> CodegenOptions {
        CodegenOptions {
            memory_size: self.memory_size,
        }
    }

    pub fn vm_config(&self) -> VmConfig {
        VmConfig {
            memory_size: self.memory_size,
            code_size: DEFAULT_CODE_SIZE,
            flags: self.vm_flags,
            max_steps: self.max_steps,
        }
    }
}

/// Everything the front half of the pipeline produced.
#[derive(Debug)]
pub struct CompilationResult {
    /// The enriched tree.
    pub program: Program,
    pub diagnostics: Diagnostics,
    /// Present only when there were no diagnostics.
    pub bytecode: Option<Bytecode>,
    /// Type of the program body, if it could be computed.
    pub ty: Option<Type>,
}

impl CompilationResult {
    pub fn is_ok(&self) -> bool {
        !self.diagnostics.has_errors()
    }

    /// The bytecode, or the diagnostics as an error.
    pub fn into_bytecode(self) -> Result<Bytecode> {
        match self.bytecode {
            Some(bytecode) if !self.diagnostics.has_errors() => Ok(bytecode),
            _ => Err(Error::Compilation(self.diagnostics)),
        }
    }
}

/// Resolve, check and, if both passes are clean, generate code.
///
/// Returns an error only if code generation itself fails.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile(program: Program, options: &Options) -> Result<CompilationResult> {
    let resolved = resolve(program);
    let checked = check(&resolved.program, &resolved.hierarchy);

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend_resolve(&resolved.errors);
    diagnostics.extend_type(&checked.errors);
    log::debug!(
        "{} scope errors, {} type errors",
        diagnostics.scope_errors(),
        diagnostics.type_errors()
    );

    let bytecode = if diagnostics.has_errors() {
        None
    } else {
        Some(generate(&resolved.program, &options.codegen_options())?)
    };

    Ok(CompilationResult {
        program: resolved.program,
        diagnostics,
        bytecode,
        ty: checked.ty,
    })
}

/// Compile and execute a program.
pub fn run(program: Program, options: &Options) -> Result<Outcome> {
    let bytecode = compile(program, options)?.into_bytecode()?;
    Ok(fool_vm::execute(&bytecode, options.vm_config())?)
}
