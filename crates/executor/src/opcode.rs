//! Opcodes understood by the execution engine.

use std::fmt::Display;

use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// An opcode (short for "operation code") specifies the operation to be performed by the machine.
///
/// Opcodes are decoded from the low two decimal digits of an instruction word; the remaining
/// digits carry the addressing modes of the operands. The machine is deliberately small: three
/// arithmetic/comparison operations that write through a destination operand, two jumps, one
/// input, one output, a relative-base adjustment, and halt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Enum,
)]
pub enum Opcode {
    /// dest ← a + b
    Add = 1,
    /// dest ← a * b
    Mul = 2,
    /// dest ← next queued input value; suspends the machine when the queue is empty
    Input = 3,
    /// last_output ← a; yields the value to the caller
    Output = 4,
    /// if a != 0: pc ← b
    JumpIfTrue = 5,
    /// if a == 0: pc ← b
    JumpIfFalse = 6,
    /// dest ← (a < b) as integer
    LessThan = 7,
    /// dest ← (a == b) as integer
    Equals = 8,
    /// relative_base ← relative_base + a
    AdjustBase = 9,
    /// Stop the machine permanently.
    Halt = 99,
}

impl Opcode {
    /// Get the mnemonic for the opcode.
    #[must_use]
    pub const fn mnemonic(&self) -> &str {
        match self {
            Opcode::Add => "add",
            Opcode::Mul => "mul",
            Opcode::Input => "input",
            Opcode::Output => "output",
            Opcode::JumpIfTrue => "jump-if-true",
            Opcode::JumpIfFalse => "jump-if-false",
            Opcode::LessThan => "less-than",
            Opcode::Equals => "equals",
            Opcode::AdjustBase => "adjust-base",
            Opcode::Halt => "halt",
        }
    }

    /// Decode an opcode from the low two decimal digits of an instruction word.
    ///
    /// Returns `None` for any word outside the known set.
    #[must_use]
    pub const fn from_word(word: i64) -> Option<Self> {
        match word {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Mul),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            9 => Some(Opcode::AdjustBase),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
