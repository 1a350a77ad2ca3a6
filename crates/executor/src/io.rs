//! Channel adapters: feeding machines, draining them, and composing them.

use crate::{ExecutionError, Executor, StepOutcome};

impl Executor {
    /// Append one value to the input queue.
    pub fn feed(&mut self, value: i64) -> &mut Self {
        self.state.input.push_back(value);
        self
    }

    /// Append a line of text to the input queue as character codes, terminated by a newline.
    ///
    /// Interactive console programs read their commands this way.
    pub fn feed_line(&mut self, line: &str) -> &mut Self {
        for byte in line.bytes() {
            self.state.input.push_back(i64::from(byte));
        }
        self.state.input.push_back(i64::from(b'\n'));
        self
    }

    /// Return and clear the most recent output value, if one is pending.
    pub fn drain_output(&mut self) -> Option<i64> {
        self.state.last_output.take()
    }

    /// Run until the machine suspends for input or halts, collecting every output on the way.
    pub fn run_until_input(&mut self) -> Result<Vec<i64>, ExecutionError> {
        let mut outputs = Vec::new();
        loop {
            match self.next_event()? {
                StepOutcome::Output(value) => outputs.push(value),
                StepOutcome::NeedsInput | StepOutcome::Halted => return Ok(outputs),
                StepOutcome::Continue => unreachable!("next_event never yields Continue"),
            }
        }
    }

    /// Run until suspension or halt, rendering the output stream as text.
    ///
    /// Values in the byte range are emitted as characters; anything larger is printed as a
    /// decimal number on its own line, the way console programs report final scores alongside
    /// their ASCII frames.
    pub fn run_ascii(&mut self) -> Result<String, ExecutionError> {
        let mut text = String::new();
        for value in self.run_until_input()? {
            match u8::try_from(value) {
                Ok(byte) => text.push(char::from(byte)),
                Err(_) => {
                    text.push_str(&value.to_string());
                    text.push('\n');
                }
            }
        }
        Ok(text)
    }
}

/// A feedback ring of machines.
///
/// The output of stage `i` becomes the input of stage `(i + 1) % N`. Stages have no awareness of
/// each other; the pipeline owns the routing. The run ends when a stage halts, and yields the
/// last value forwarded around the ring.
#[derive(Debug, Default)]
pub struct Pipeline {
    /// The machines in ring order.
    pub stages: Vec<Executor>,
}

impl Pipeline {
    /// Create a pipeline over the given stages, in ring order.
    #[must_use]
    pub fn new(stages: Vec<Executor>) -> Self {
        Self { stages }
    }

    /// Run the ring until a stage halts, returning the last forwarded value.
    ///
    /// A full cycle in which every stage is starved means no stage can ever make progress again;
    /// that deadlock is reported as [`ExecutionError::EmptyInputQueue`].
    pub fn run(&mut self) -> Result<Option<i64>, ExecutionError> {
        let mut last = None;
        let mut starved = 0usize;
        let mut stage = 0usize;
        loop {
            match self.stages[stage].next_event()? {
                StepOutcome::Output(value) => {
                    starved = 0;
                    last = Some(value);
                    let next = (stage + 1) % self.stages.len();
                    self.stages[next].feed(value);
                    stage = next;
                }
                StepOutcome::Halted => return Ok(last),
                StepOutcome::NeedsInput => {
                    starved += 1;
                    if starved == self.stages.len() {
                        return Err(ExecutionError::EmptyInputQueue);
                    }
                    stage = (stage + 1) % self.stages.len();
                }
                StepOutcome::Continue => unreachable!("next_event never yields Continue"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Pipeline;
    use crate::{programs, ExecutionError, Executor, Program, StepOutcome};

    fn ring(image: &[i64], phases: &[i64]) -> Pipeline {
        let program = Program::new(image.to_vec());
        let mut stages: Vec<Executor> = phases
            .iter()
            .map(|&phase| {
                let mut vm = Executor::new(&program);
                vm.feed(phase);
                vm
            })
            .collect();
        stages[0].feed(0);
        Pipeline::new(stages)
    }

    #[test]
    fn serial_chain_forwards_each_stage_output() {
        let mut pipeline = ring(programs::tests::SERIAL_CHAIN, &[4, 3, 2, 1, 0]);
        assert_eq!(pipeline.run().unwrap(), Some(43210));
    }

    #[test]
    fn feedback_ring_loops_until_the_first_stage_halts() {
        let mut pipeline = ring(programs::tests::FEEDBACK_RING_A, &[9, 8, 7, 6, 5]);
        assert_eq!(pipeline.run().unwrap(), Some(139_629_729));

        let mut pipeline = ring(programs::tests::FEEDBACK_RING_B, &[9, 7, 8, 5, 6]);
        assert_eq!(pipeline.run().unwrap(), Some(18216));
    }

    #[test]
    fn fully_starved_ring_is_a_deadlock() {
        let program = Program::new(vec![3, 0, 99]);
        let mut pipeline =
            Pipeline::new(vec![Executor::new(&program), Executor::new(&program)]);
        assert!(matches!(pipeline.run(), Err(ExecutionError::EmptyInputQueue)));
    }

    #[test]
    fn drain_output_clears_the_slot() {
        let mut vm = Executor::new(&Program::new(vec![104, 7, 99]));
        assert_eq!(vm.next_event().unwrap(), StepOutcome::Output(7));
        assert_eq!(vm.drain_output(), Some(7));
        assert_eq!(vm.drain_output(), None);
    }

    #[test]
    fn ascii_output_renders_as_text() {
        let mut vm = Executor::new(&Program::new(vec![104, 72, 104, 105, 104, 10, 99]));
        assert_eq!(vm.run_ascii().unwrap(), "Hi\n");
    }

    #[test]
    fn large_values_render_as_decimal_lines() {
        let mut vm = Executor::new(&Program::new(vec![104, 72, 104, 10, 104, 9544, 99]));
        assert_eq!(vm.run_ascii().unwrap(), "H\n9544\n");
    }

    #[test]
    fn fed_lines_echo_through_a_console_program() {
        let mut vm = Executor::new(&Program::new(programs::tests::ECHO_LINE.to_vec()));
        vm.feed_line("Hi");
        assert_eq!(vm.run_ascii().unwrap(), "Hi\n");
        assert!(vm.is_halted());
    }
}
