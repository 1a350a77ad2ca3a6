use std::{
    collections::VecDeque,
    fs::File,
    io::{BufReader, Seek, Write},
};

use serde::{Deserialize, Serialize};

use crate::{Memory, Program};

/// Holds data describing the current state of a machine's execution.
///
/// The state is the machine's entire resolvable condition: serializing it and restoring it later
/// resumes execution exactly where it left off, pending inputs included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionState {
    /// The program counter. Always non-negative when an instruction is fetched; a jump to a
    /// negative offset faults on the following fetch.
    pub pc: i64,

    /// The relative base register, added to Relative-mode operands to form effective addresses.
    pub relative_base: i64,

    /// The global clock keeps track of how many instructions have been executed.
    pub global_clk: u64,

    /// The memory which instructions operate over, seeded from the program image.
    pub memory: Memory,

    /// Queued input values, consumed in FIFO order by input instructions.
    pub input: VecDeque<i64>,

    /// The value produced by the most recent output instruction, if not yet drained.
    pub last_output: Option<i64>,

    /// Whether the machine has executed a halt instruction.
    pub halted: bool,
}

impl ExecutionState {
    /// Create a new [`ExecutionState`] with memory seeded from a program image.
    #[must_use]
    pub fn new(program: &Program) -> Self {
        Self {
            pc: 0,
            relative_base: 0,
            global_clk: 0,
            memory: Memory::from_image(&program.image),
            input: VecDeque::new(),
            last_output: None,
            halted: false,
        }
    }

    /// Save the execution state to a file.
    pub fn save(&self, file: &mut File) -> std::io::Result<()> {
        let mut writer = std::io::BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).unwrap();
        writer.flush()?;
        writer.seek(std::io::SeekFrom::Start(0))?;
        Ok(())
    }

    /// Restore an execution state previously written with [`ExecutionState::save`].
    pub fn restore(file: &File) -> eyre::Result<Self> {
        let reader = BufReader::new(file);
        Ok(bincode::deserialize_from(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionState;
    use crate::Program;

    #[test]
    fn state_round_trips_through_a_file() {
        let program = Program::new(vec![3, 0, 4, 0, 99]);
        let mut state = ExecutionState::new(&program);
        state.pc = 2;
        state.relative_base = -7;
        state.input.push_back(11);
        state.input.push_back(12);
        state.last_output = Some(5);

        let mut file = tempfile::tempfile().unwrap();
        state.save(&mut file).unwrap();
        let restored = ExecutionState::restore(&file).unwrap();

        assert_eq!(restored.pc, 2);
        assert_eq!(restored.relative_base, -7);
        assert_eq!(restored.input, [11, 12]);
        assert_eq!(restored.last_output, Some(5));
        assert_eq!(restored.memory, state.memory);
        assert!(!restored.halted);
    }
}
