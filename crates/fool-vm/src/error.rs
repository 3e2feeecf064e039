//! Runtime errors.

use thiserror::Error;

/// Conditions that stop the machine before `halt`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("program of {len} words exceeds the code size of {capacity}")]
    ProgramTooLarge { len: usize, capacity: usize },

    #[error("invalid opcode {word} at address {ip}")]
    InvalidOpcode { word: i32, ip: usize },

    #[error("memory address {address} out of bounds at instruction {ip}")]
    MemoryOutOfBounds { address: i64, ip: usize },

    #[error("code address {address} out of bounds")]
    CodeOutOfBounds { address: i64 },

    #[error("division by zero at instruction {ip}")]
    DivisionByZero { ip: usize },

    /// Only reported with [`VmFlags::CHECK_COLLISION`](crate::VmFlags::CHECK_COLLISION).
    #[error("heap pointer {hp} reached stack pointer {sp} at instruction {ip}")]
    HeapStackCollision { hp: i32, sp: i32, ip: usize },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}
