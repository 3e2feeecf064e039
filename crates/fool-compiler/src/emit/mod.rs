//! Bytecode emitter.
//!
//! The [`BytecodeEmitter`] collects symbolic instructions whose jump and call
//! targets are [`Label`]s. Function and method bodies are emitted into their
//! own buffers while the enclosing code is being generated and are placed
//! after the main program when the emitter is finished. Labels are resolved
//! to absolute addresses in two passes over the final layout.
//!
//! # Example
//!
//! ```ignore
//! let mut emitter = BytecodeEmitter::new();
//! let done = emitter.fresh_label();
//! emitter.emit_push(1);
//! emitter.emit_push(1);
//! emitter.emit_branch(OpCode::BranchEq, done);
//! emitter.bind_label(done);
//! emitter.emit(OpCode::Halt);
//! let code = emitter.finish()?;
//! ```

mod labels;

pub use labels::{Label, LabelTable};

use fool_core::{Bytecode, CodegenError, Instruction, OpCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    None,
    Value(i32),
    Label(Label),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Item {
    Op { op: OpCode, operand: Operand, line: u32 },
    Mark(Label),
}

impl Item {
    fn width(&self) -> usize {
        match self {
            Item::Op { op, .. } => op.width(),
            Item::Mark(_) => 0,
        }
    }
}

/// Emits symbolic instructions and lays them out into [`Bytecode`].
#[derive(Debug)]
pub struct BytecodeEmitter {
    labels: LabelTable,
    /// Open buffers; the first is the main program, the last receives
    /// instructions.
    buffers: Vec<Vec<Item>>,
    /// Finished function and method bodies, in completion order.
    deferred: Vec<Vec<Item>>,
    current_line: u32,
}

impl Default for BytecodeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl BytecodeEmitter {
    pub fn new() -> Self {
        Self {
            labels: LabelTable::new(),
            buffers: vec![Vec::new()],
            deferred: Vec::new(),
            current_line: 0,
        }
    }

    /// Set the source line recorded for subsequent instructions.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    fn push_item(&mut self, item: Item) {
        if let Some(buffer) = self.buffers.last_mut() {
            buffer.push(item);
        }
    }

    fn push_op(&mut self, op: OpCode, operand: Operand) {
        let line = self.current_line;
        self.push_item(Item::Op { op, operand, line });
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit an instruction without an operand.
    pub fn emit(&mut self, op: OpCode) {
        debug_assert!(!op.has_operand(), "{op:?} needs an operand");
        self.push_op(op, Operand::None);
    }

    /// `push value`
    pub fn emit_push(&mut self, value: i32) {
        self.push_op(OpCode::Push, Operand::Value(value));
    }

    /// `push label`, pushing the code address the label is bound to.
    pub fn emit_push_label(&mut self, label: Label) {
        self.push_op(OpCode::Push, Operand::Label(label));
    }

    /// A branch instruction to `label`.
    pub fn emit_branch(&mut self, op: OpCode, label: Label) {
        debug_assert!(op.is_branch(), "{op:?} is not a branch");
        self.push_op(op, Operand::Label(label));
    }

    // ==========================================================================
    // Common Sequences
    // ==========================================================================

    /// Replace the address on top of the stack with the word at
    /// `address + offset`.
    pub fn emit_load_offset(&mut self, offset: i32) {
        self.emit_push(offset);
        self.emit(OpCode::Add);
        self.emit(OpCode::LoadW);
    }

    /// Follow `hops` access links starting from the current frame.
    pub fn emit_frame_walk(&mut self, hops: u32) {
        self.emit(OpCode::LoadFp);
        for _ in 0..hops {
            self.emit(OpCode::LoadW);
        }
    }

    /// Exchange the two top stack words through TM and RA. RA is scratch
    /// here: a body saves its return address on entry.
    pub fn emit_swap(&mut self) {
        self.emit(OpCode::StoreTm);
        self.emit(OpCode::StoreRa);
        self.emit(OpCode::LoadTm);
        self.emit(OpCode::LoadRa);
    }

    /// Pop the top of the stack into the next free heap word and advance the
    /// heap pointer.
    pub fn emit_heap_store(&mut self) {
        self.emit(OpCode::LoadHp);
        self.emit(OpCode::StoreW);
        self.emit_heap_bump();
    }

    /// Advance the heap pointer by one word.
    pub fn emit_heap_bump(&mut self) {
        self.emit(OpCode::LoadHp);
        self.emit_push(1);
        self.emit(OpCode::Add);
        self.emit(OpCode::StoreHp);
    }

    /// Jump to the code address on top of the stack after duplicating the
    /// access link kept in TM: `stm; ltm; ltm; <address>; js`. The caller
    /// passes the sequence that computes the target address.
    pub fn emit_call_through(&mut self, target: impl FnOnce(&mut Self)) {
        self.emit(OpCode::StoreTm);
        self.emit(OpCode::LoadTm);
        self.emit(OpCode::LoadTm);
        target(self);
        self.emit(OpCode::Js);
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    pub fn fresh_label(&mut self) -> Label {
        self.labels.fresh()
    }

    /// Place `label` at the current position.
    pub fn bind_label(&mut self, label: Label) {
        self.push_item(Item::Mark(label));
    }

    // ==========================================================================
    // Deferred Bodies
    // ==========================================================================

    /// Start a body that is laid out after the main program.
    pub fn begin_deferred(&mut self) {
        self.buffers.push(Vec::new());
    }

    /// Finish the body opened by the matching [`begin_deferred`].
    ///
    /// [`begin_deferred`]: Self::begin_deferred
    pub fn end_deferred(&mut self) {
        if self.buffers.len() > 1 {
            if let Some(body) = self.buffers.pop() {
                self.deferred.push(body);
            }
        }
    }

    // ==========================================================================
    // Finish
    // ==========================================================================

    /// Lay out the main program followed by the deferred bodies and resolve
    /// every label.
    pub fn finish(mut self) -> Result<Bytecode, CodegenError> {
        // Any body still open is closed in nesting order.
        while self.buffers.len() > 1 {
            self.end_deferred();
        }
        let items: Vec<Item> = self
            .buffers
            .into_iter()
            .chain(self.deferred)
            .flatten()
            .collect();

        let mut address = 0;
        for item in &items {
            if let Item::Mark(label) = item {
                self.labels.bind(*label, address);
            }
            address += item.width();
        }

        let mut code = Bytecode::new();
        for item in items {
            let Item::Op { op, operand, line } = item else {
                continue;
            };
            let instruction = match operand {
                Operand::None => Instruction::new(op),
                Operand::Value(value) => Instruction::with_operand(op, value),
                Operand::Label(label) => {
                    let target = self
                        .labels
                        .address(label)
                        .ok_or(CodegenError::UnboundLabel { label: label.id() })?;
                    Instruction::with_operand(op, target as i32)
                }
            };
            code.write(instruction, line);
        }
        Ok(code)
    }
}
