//! Machine operation codes.
//!
//! Encoded programs are flat `i32` words: an opcode word, followed by one
//! operand word for the opcodes that take one.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Operation codes of the stack machine.
///
/// Binary operations pop `first` (the top) and then `second`, and push
/// `second ⊕ first`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum OpCode {
    /// Push the operand.
    Push = 0,
    /// Discard the top of the stack.
    Pop,
    Add,
    Sub,
    Mult,
    Div,
    /// Pop an address, pop a value, store the value at the address.
    StoreW,
    /// Pop an address, push the word stored there.
    LoadW,
    /// Jump to the operand.
    Branch,
    /// Pop two values; jump to the operand if they are equal.
    BranchEq,
    /// Pop two values; jump to the operand if `second <= first`.
    BranchLessEq,
    /// Pop an address, save the address of the next instruction in RA, jump.
    Js,
    /// Pop into RA.
    StoreRa,
    /// Push RA.
    LoadRa,
    /// Pop into TM.
    StoreTm,
    /// Push TM.
    LoadTm,
    /// Push FP.
    LoadFp,
    /// Pop into FP.
    StoreFp,
    /// FP := SP.
    CopyFp,
    /// Pop into HP.
    StoreHp,
    /// Push HP.
    LoadHp,
    /// Output the top of the stack without popping it.
    Print,
    Halt,
}

impl OpCode {
    /// Whether an operand word follows the opcode.
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            OpCode::Push | OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        )
    }

    /// Whether the operand is a code address.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            OpCode::Branch | OpCode::BranchEq | OpCode::BranchLessEq
        )
    }

    /// Number of words the instruction occupies.
    pub fn width(self) -> usize {
        if self.has_operand() { 2 } else { 1 }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Push => "push",
            OpCode::Pop => "pop",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mult => "mult",
            OpCode::Div => "div",
            OpCode::StoreW => "storew",
            OpCode::LoadW => "loadw",
            OpCode::Branch => "branch",
            OpCode::BranchEq => "brancheq",
            OpCode::BranchLessEq => "branchlesseq",
            OpCode::Js => "js",
            OpCode::StoreRa => "storera",
            OpCode::LoadRa => "loadra",
            OpCode::StoreTm => "storetm",
            OpCode::LoadTm => "loadtm",
            OpCode::LoadFp => "loadfp",
            OpCode::StoreFp => "storefp",
            OpCode::CopyFp => "copyfp",
            OpCode::StoreHp => "storehp",
            OpCode::LoadHp => "loadhp",
            OpCode::Print => "print",
            OpCode::Halt => "halt",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_words() {
        for op in [OpCode::Push, OpCode::Js, OpCode::Halt] {
            let word: i32 = op.into();
            assert_eq!(OpCode::try_from(word).ok(), Some(op));
        }
        assert!(OpCode::try_from(999).is_err());
        assert!(OpCode::try_from(-1).is_err());
    }

    #[test]
    fn operand_opcodes() {
        assert!(OpCode::Push.has_operand());
        assert!(OpCode::BranchLessEq.has_operand());
        assert!(!OpCode::Js.has_operand());
        assert_eq!(OpCode::Push.width(), 2);
        assert_eq!(OpCode::Add.width(), 1);
    }
}
