//! Instruction decoding.

use serde::{Deserialize, Serialize};

use crate::{ExecutionError, Opcode};

/// The addressing discipline of a single operand.
///
/// Each operand of an instruction carries its own mode, encoded as one decimal digit of the
/// instruction word above the opcode digits. Missing digits default to [`AddressingMode::Position`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressingMode {
    /// The operand is a memory offset; dereference it.
    #[default]
    Position,
    /// The operand is the value itself. Invalid for write operands.
    Immediate,
    /// The operand is an offset from the relative base; dereference `relative_base + operand`.
    Relative,
}

/// A decoded instruction: the operation to perform and the addressing mode of each operand.
///
/// Decoding consumes only the first word of the instruction. Operand words are fetched by the
/// executor as the operation resolves them, so self-modifying programs always observe current
/// memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// Addressing modes for up to three operands, in operand order.
    pub modes: [AddressingMode; 3],
}

impl Instruction {
    /// Decode an instruction word fetched at `pc`.
    ///
    /// The opcode is the word modulo 100; successive decimal digits of the quotient give the
    /// modes of operands 1 through 3, least significant first.
    pub fn decode(word: i64, pc: i64) -> Result<Self, ExecutionError> {
        let opcode =
            Opcode::from_word(word % 100).ok_or(ExecutionError::UnknownOpcode { word, pc })?;

        let mut modes = [AddressingMode::Position; 3];
        let mut digits = word / 100;
        for mode in &mut modes {
            *mode = match digits % 10 {
                0 => AddressingMode::Position,
                1 => AddressingMode::Immediate,
                2 => AddressingMode::Relative,
                digit => return Err(ExecutionError::UnknownAddressingMode { digit, pc }),
            };
            digits /= 10;
        }

        Ok(Self { opcode, modes })
    }
}
