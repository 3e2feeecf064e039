//! Bytecode model shared by the code generator and the virtual machine.
//!
//! - [`OpCode`] - the instruction set
//! - [`Instruction`] - a decoded opcode with its operand
//! - [`Bytecode`] - a finished, label-free program

mod opcode;
mod program;

pub use opcode::OpCode;
pub use program::{Bytecode, Instruction};
