use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    ops::{Add, AddAssign},
};

use enum_map::EnumMap;

use crate::Opcode;

/// An execution report: how many instructions a machine executed, broken down by opcode.
///
/// Reports are per-instance. They merge with `+`, so a driver running many instances can expose
/// one aggregate view.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// The opcode counts.
    pub opcode_counts: EnumMap<Opcode, u64>,
}

impl ExecutionReport {
    /// Compute the total number of instructions run during the execution.
    #[must_use]
    pub fn total_instruction_count(&self) -> u64 {
        self.opcode_counts.values().sum()
    }
}

impl AddAssign for ExecutionReport {
    fn add_assign(&mut self, rhs: Self) {
        for (opcode, count) in rhs.opcode_counts {
            self.opcode_counts[opcode] += count;
        }
    }
}

impl Add for ExecutionReport {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Display for ExecutionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "opcode counts ({} total instructions):", self.total_instruction_count())?;
        for (opcode, count) in self.opcode_counts.iter().filter(|(_, &count)| count > 0) {
            writeln!(f, "  {opcode}: {count}")?;
        }
        Ok(())
    }
}
