use std::{fs::File, path::Path};

use thiserror::Error;

use crate::{
    AddressingMode, ExecutionReport, ExecutionState, Instruction, Opcode, Program, VmContext,
};

/// The outcome of executing one instruction.
///
/// Every step reports exactly one of these; there is no overloaded "no value" return, so an
/// output of 0 is never mistaken for a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction completed and the machine is ready for the next one.
    Continue,
    /// The machine reached an input instruction with an empty queue. The program counter was
    /// reverted to the start of the instruction; feed a value and step again.
    NeedsInput,
    /// The machine produced an output value. The value is also held in `last_output` until
    /// drained.
    Output(i64),
    /// The machine executed a halt instruction and must not be stepped again.
    Halted,
}

/// Errors that retire a machine instance.
///
/// Suspension for input is *not* among these: an empty input queue is reported through
/// [`StepOutcome::NeedsInput`] and is retry-safe. [`ExecutionError::EmptyInputQueue`] only
/// arises from run-to-completion drivers that have no way to supply more input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    /// A resolved memory offset was negative.
    #[error("attempted to access memory at negative offset {0}")]
    InvalidAddress(i64),
    /// A fetched instruction word did not decode to a known operation.
    #[error("unrecognized opcode word {word} at pc {pc}")]
    UnknownOpcode {
        /// The offending instruction word.
        word: i64,
        /// The program counter it was fetched from.
        pc: i64,
    },
    /// An operand mode digit was outside the known set.
    #[error("unknown addressing mode digit {digit} at pc {pc}")]
    UnknownAddressingMode {
        /// The offending mode digit.
        digit: i64,
        /// The program counter of the instruction word.
        pc: i64,
    },
    /// A write operand was decoded in immediate mode.
    #[error("write operand decoded in immediate mode at pc {pc}")]
    ImmediateWrite {
        /// The program counter of the instruction word.
        pc: i64,
    },
    /// An input instruction was reached with nothing queued and no way to supply more.
    #[error("input requested but the input queue was empty")]
    EmptyInputQueue,
    /// The configured step limit was reached before the machine halted.
    #[error("exceeded step limit of {0} instructions")]
    ExceededStepLimit(u64),
}

/// The execution engine: a fetch/decode/execute loop over one [`ExecutionState`].
///
/// The machine is event-driven. [`Executor::step`] executes one instruction and reports a
/// [`StepOutcome`]; the caller decides whether to keep stepping, supply input, or consume the
/// pending output. This is the suspend/resume seam that lets instances compose into pipelines
/// and networks without a coroutine primitive.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    /// The state of the machine.
    pub state: ExecutionState,

    /// Per-instance configuration.
    pub context: VmContext,

    /// Counts of executed instructions.
    pub report: ExecutionReport,
}

impl Executor {
    /// Create a machine seeded from a program image.
    #[must_use]
    pub fn new(program: &Program) -> Self {
        Self::with_context(program, VmContext::default())
    }

    /// Create a machine seeded from a program image, with per-instance configuration.
    ///
    /// # Panics
    ///
    /// Panics if a patch targets a negative offset; patch offsets are fixed by the host and a
    /// negative one is a driver bug, not a runtime condition.
    #[must_use]
    pub fn with_context(program: &Program, context: VmContext) -> Self {
        let mut state = ExecutionState::new(program);
        for &(offset, value) in &context.patches {
            state.memory.write(offset, value).expect("patch offsets must be non-negative");
        }
        Self { state, context, report: ExecutionReport::default() }
    }

    /// Whether the machine has halted.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.state.halted
    }

    /// Execute one instruction.
    ///
    /// # Panics
    ///
    /// Panics if called after the machine halted. Resuming a halted machine is a host driver
    /// bug; it is asserted rather than reported.
    pub fn step(&mut self) -> Result<StepOutcome, ExecutionError> {
        assert!(!self.state.halted, "attempted to step a halted machine");

        if let Some(limit) = self.context.max_steps {
            if self.state.global_clk >= limit {
                return Err(ExecutionError::ExceededStepLimit(limit));
            }
        }

        let pc = self.state.pc;
        let word = self.state.memory.read(pc)?;
        let instruction = Instruction::decode(word, pc)?;
        self.state.pc = pc + 1;

        let outcome = self.execute(&instruction, pc)?;
        if !matches!(outcome, StepOutcome::NeedsInput) {
            self.state.global_clk += 1;
            self.report.opcode_counts[instruction.opcode] += 1;
        }
        Ok(outcome)
    }

    /// Step until the machine suspends, produces an output, or halts.
    pub fn next_event(&mut self) -> Result<StepOutcome, ExecutionError> {
        loop {
            match self.step()? {
                StepOutcome::Continue => {}
                outcome => return Ok(outcome),
            }
        }
    }

    /// Run to halt, collecting the entire output stream.
    ///
    /// Reaching an input instruction with an empty queue is an [`ExecutionError::EmptyInputQueue`]
    /// error here: a run-to-completion driver has no later opportunity to feed the machine.
    pub fn run(&mut self) -> Result<Vec<i64>, ExecutionError> {
        let mut outputs = Vec::new();
        loop {
            match self.next_event()? {
                StepOutcome::Output(value) => outputs.push(value),
                StepOutcome::NeedsInput => return Err(ExecutionError::EmptyInputQueue),
                StepOutcome::Halted => return Ok(outputs),
                StepOutcome::Continue => unreachable!("next_event never yields Continue"),
            }
        }
    }

    /// Save the machine's entire resolvable state to a file at `path`.
    ///
    /// The report and context are not part of a snapshot; only the [`ExecutionState`] is.
    pub fn checkpoint(&self, path: impl AsRef<Path>) -> eyre::Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)?;
        self.state.save(&mut file)?;
        tracing::trace!("checkpointed machine state to {}", path.display());
        Ok(())
    }

    /// Restore a machine from a checkpoint written by [`Executor::checkpoint`].
    ///
    /// The restored machine carries a fresh report and default context.
    pub fn restore(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let file = File::open(path.as_ref())?;
        let state = ExecutionState::restore(&file)?;
        Ok(Self { state, context: VmContext::default(), report: ExecutionReport::default() })
    }

    /// Log the per-opcode instruction counts at debug level.
    pub fn print_stats(&self) {
        if tracing::event_enabled!(tracing::Level::DEBUG) {
            tracing::debug!("total instructions: {}", self.report.total_instruction_count());
            for (opcode, count) in self.report.opcode_counts.iter().filter(|(_, &c)| c > 0) {
                tracing::debug!("  {opcode}: {count}");
            }
        }
    }

    fn execute(
        &mut self,
        instruction: &Instruction,
        pc: i64,
    ) -> Result<StepOutcome, ExecutionError> {
        match instruction.opcode {
            Opcode::Add => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                let dest = self.write_operand(instruction, 2, pc)?;
                self.state.memory.write(dest, a + b)?;
            }
            Opcode::Mul => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                let dest = self.write_operand(instruction, 2, pc)?;
                self.state.memory.write(dest, a * b)?;
            }
            Opcode::Input => {
                let Some(value) = self.state.input.pop_front() else {
                    // Revert to the start of the instruction so stepping is retry-safe.
                    self.state.pc = pc;
                    return Ok(StepOutcome::NeedsInput);
                };
                let dest = self.write_operand(instruction, 0, pc)?;
                self.state.memory.write(dest, value)?;
            }
            Opcode::Output => {
                let a = self.read_operand(instruction, 0)?;
                self.state.last_output = Some(a);
                return Ok(StepOutcome::Output(a));
            }
            Opcode::JumpIfTrue => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                if a != 0 {
                    self.state.pc = b;
                }
            }
            Opcode::JumpIfFalse => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                if a == 0 {
                    self.state.pc = b;
                }
            }
            Opcode::LessThan => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                let dest = self.write_operand(instruction, 2, pc)?;
                self.state.memory.write(dest, i64::from(a < b))?;
            }
            Opcode::Equals => {
                let a = self.read_operand(instruction, 0)?;
                let b = self.read_operand(instruction, 1)?;
                let dest = self.write_operand(instruction, 2, pc)?;
                self.state.memory.write(dest, i64::from(a == b))?;
            }
            Opcode::AdjustBase => {
                let a = self.read_operand(instruction, 0)?;
                self.state.relative_base += a;
            }
            Opcode::Halt => {
                self.state.halted = true;
                return Ok(StepOutcome::Halted);
            }
        }
        Ok(StepOutcome::Continue)
    }

    /// Consume the next operand word and resolve it to a value per its addressing mode.
    fn read_operand(
        &mut self,
        instruction: &Instruction,
        operand: usize,
    ) -> Result<i64, ExecutionError> {
        let word = self.state.memory.read(self.state.pc)?;
        self.state.pc += 1;
        match instruction.modes[operand] {
            AddressingMode::Position => self.state.memory.read(word),
            AddressingMode::Immediate => Ok(word),
            AddressingMode::Relative => self.state.memory.read(self.state.relative_base + word),
        }
    }

    /// Consume the next operand word and resolve it to a destination offset.
    ///
    /// Immediate mode has no meaningful destination and is a defined fault.
    fn write_operand(
        &mut self,
        instruction: &Instruction,
        operand: usize,
        pc: i64,
    ) -> Result<i64, ExecutionError> {
        let word = self.state.memory.read(self.state.pc)?;
        self.state.pc += 1;
        match instruction.modes[operand] {
            AddressingMode::Position => Ok(word),
            AddressingMode::Immediate => Err(ExecutionError::ImmediateWrite { pc }),
            AddressingMode::Relative => Ok(self.state.relative_base + word),
        }
    }
}
