//! Encoded programs.

use std::fmt;

use super::OpCode;
use crate::error::BytecodeError;

/// A decoded instruction: an opcode and its operand, if it takes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: OpCode,
    pub operand: Option<i32>,
}

impl Instruction {
    pub fn new(op: OpCode) -> Self {
        Self { op, operand: None }
    }

    pub fn with_operand(op: OpCode, operand: i32) -> Self {
        Self {
            op,
            operand: Some(operand),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Some(operand) => write!(f, "{} {}", self.op.mnemonic(), operand),
            None => f.write_str(self.op.mnemonic()),
        }
    }
}

/// A finished program: flat words with every label resolved to an absolute
/// code address.
///
/// `lines` runs parallel to `code` and records the source line each word was
/// generated for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytecode {
    code: Vec<i32>,
    lines: Vec<u32>,
}

impl Bytecode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(code: Vec<i32>, lines: Vec<u32>) -> Self {
        Self { code, lines }
    }

    /// Append an instruction.
    pub fn write(&mut self, instruction: Instruction, line: u32) {
        self.code.push(instruction.op.into());
        self.lines.push(line);
        if let Some(operand) = instruction.operand {
            self.code.push(operand);
            self.lines.push(line);
        }
    }

    pub fn code(&self) -> &[i32] {
        &self.code
    }

    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    pub fn line_at(&self, address: usize) -> Option<u32> {
        self.lines.get(address).copied()
    }

    /// Length in words.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Decode the instruction starting at `address`.
    pub fn decode_at(&self, address: usize) -> Result<Instruction, BytecodeError> {
        let word = *self
            .code
            .get(address)
            .ok_or(BytecodeError::OutOfBounds { address })?;
        let op = OpCode::try_from(word).map_err(|_| BytecodeError::InvalidOpcode { word, address })?;
        if !op.has_operand() {
            return Ok(Instruction::new(op));
        }
        let operand = *self
            .code
            .get(address + 1)
            .ok_or(BytecodeError::MissingOperand { op, address })?;
        Ok(Instruction::with_operand(op, operand))
    }

    /// Decode every instruction along with its address.
    pub fn instructions(&self) -> Result<Vec<(usize, Instruction)>, BytecodeError> {
        let mut out = Vec::new();
        let mut address = 0;
        while address < self.code.len() {
            let instruction = self.decode_at(address)?;
            out.push((address, instruction));
            address += instruction.op.width();
        }
        Ok(out)
    }

    /// Just the opcodes, in order.
    pub fn opcodes(&self) -> Result<Vec<OpCode>, BytecodeError> {
        Ok(self.instructions()?.into_iter().map(|(_, i)| i.op).collect())
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instructions() {
            Ok(instructions) => {
                for (address, instruction) in instructions {
                    writeln!(f, "{address:5}: {instruction}")?;
                }
                Ok(())
            }
            Err(e) => write!(f, "<{e}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Bytecode {
        let mut code = Bytecode::new();
        code.write(Instruction::with_operand(OpCode::Push, 5), 1);
        code.write(Instruction::with_operand(OpCode::Push, 3), 1);
        code.write(Instruction::new(OpCode::Add), 1);
        code.write(Instruction::new(OpCode::Halt), 2);
        code
    }

    #[test]
    fn operands_are_inline() {
        let code = sample();
        assert_eq!(code.len(), 6);
        assert_eq!(code.code()[1], 5);
        assert_eq!(code.line_at(5), Some(2));
    }

    #[test]
    fn decode_all() {
        let code = sample();
        let ops = code.opcodes().unwrap();
        assert_eq!(ops, vec![OpCode::Push, OpCode::Push, OpCode::Add, OpCode::Halt]);

        let instructions = code.instructions().unwrap();
        assert_eq!(instructions[2].0, 4);
    }

    #[test]
    fn disassembly() {
        let text = sample().to_string();
        assert!(text.contains("0: push 5"));
        assert!(text.contains("4: add"));
    }

    #[test]
    fn truncated_operand_is_reported() {
        let code = Bytecode::from_parts(vec![OpCode::Push.into()], vec![0]);
        assert!(matches!(
            code.instructions(),
            Err(BytecodeError::MissingOperand { .. })
        ));
    }

    #[test]
    fn invalid_opcode_is_reported() {
        let code = Bytecode::from_parts(vec![77], vec![0]);
        assert!(matches!(
            code.decode_at(0),
            Err(BytecodeError::InvalidOpcode { word: 77, .. })
        ));
    }
}
