//! Machine configuration.

use bitflags::bitflags;
use fool_core::{DEFAULT_CODE_SIZE, DEFAULT_MEMORY_SIZE};

bitflags! {
    /// Optional runtime checks and output.
    ///
    /// ```rust
    /// use fool_vm::VmFlags;
    ///
    /// // Strict testing setup
    /// let strict = VmFlags::CHECK_COLLISION | VmFlags::TRACE;
    /// assert!(strict.contains(VmFlags::TRACE));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VmFlags: u32 {
        /// Fail when the heap pointer reaches the stack pointer.
        const CHECK_COLLISION = 1 << 0;
        /// Log every executed instruction at trace level.
        const TRACE = 1 << 1;
        /// Write every `print` to standard output as well as recording it.
        const ECHO = 1 << 2;
    }
}

/// Machine sizes and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Words of memory shared by stack and heap.
    pub memory_size: usize,
    /// Longest program accepted, in words.
    pub code_size: usize,
    pub flags: VmFlags,
    /// Stop with an error after this many instructions.
    pub max_steps: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            code_size: DEFAULT_CODE_SIZE,
            flags: VmFlags::empty(),
            max_steps: None,
        }
    }
}

impl VmConfig {
    pub fn with_flags(mut self, flags: VmFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = Some(max_steps);
        self
    }
}
