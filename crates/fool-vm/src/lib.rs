//! Stack machine for FOOL bytecode.
//!
//! ```ignore
//! let outcome = fool_vm::execute(&bytecode, VmConfig::default())?;
//! println!("{:?}", outcome.stack_top);
//! ```

mod config;
mod error;
mod machine;

pub use config::{VmConfig, VmFlags};
pub use error::VmError;
pub use machine::{Machine, Outcome, execute};
