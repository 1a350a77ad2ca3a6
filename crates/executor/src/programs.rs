//! Reference program images used for testing.

#[allow(missing_docs)]
pub mod tests {
    use crate::Program;

    /// Adds the cell at offset 0 to itself, in place. Exercises self-modifying reads.
    pub const SELF_MODIFYING_ADD: &[i64] = &[1, 0, 0, 0, 99];

    /// Adds two immediates into cell 4, turning the final cell into a halt instruction.
    /// Produces no output.
    pub const ADD_THEN_HALT: &[i64] = &[1101, 100, -1, 4, 0];

    /// Copies its own image to the output stream, one word at a time.
    pub const SELF_COPY: &[i64] =
        &[109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];

    /// Outputs one 16-digit immediate. Exercises the full 64-bit value range.
    pub const LARGE_IMMEDIATE: &[i64] = &[104, 1_125_899_906_842_624, 99];

    /// Multiplies two large immediates. The product needs more than 32 bits.
    pub const LARGE_PRODUCT: &[i64] = &[1102, 34_915_192, 34_915_192, 7, 4, 7, 99, 0];

    /// Reads one value and outputs 999, 1000 or 1001 for inputs below, at or above 8.
    pub const COMPARE_TO_EIGHT: &[i64] = &[
        3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0, 0,
        1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4, 20,
        1105, 1, 46, 98, 99,
    ];

    /// A five-stage amplifier: reads a phase and one value, outputs `value * 10 + phase`, halts.
    /// Chained serially with phases 4,3,2,1,0 the last stage emits 43210.
    pub const SERIAL_CHAIN: &[i64] =
        &[3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];

    /// A feedback amplifier ring; with phases 9,8,7,6,5 the final forwarded value is 139629729.
    pub const FEEDBACK_RING_A: &[i64] = &[
        3, 26, 1001, 26, -4, 26, 3, 27, 1002, 27, 2, 27, 1, 27, 26, 27, 4, 27, 1001, 28, -1, 28,
        1005, 28, 6, 99, 0, 0, 5,
    ];

    /// A feedback amplifier ring; with phases 9,7,8,5,6 the final forwarded value is 18216.
    pub const FEEDBACK_RING_B: &[i64] = &[
        3, 52, 1001, 52, -5, 52, 3, 53, 1, 52, 56, 54, 1007, 54, 5, 55, 1005, 55, 26, 1001, 54,
        -5, 54, 1105, 1, 12, 1, 53, 54, 53, 1008, 54, 0, 55, 1001, 55, 1, 55, 2, 53, 55, 53, 4,
        53, 1001, 56, -1, 56, 1005, 56, 6, 99, 0, 0, 0, 0, 10,
    ];

    /// Echoes input characters to the output until it has echoed a newline, then halts.
    pub const ECHO_LINE: &[i64] = &[3, 20, 4, 20, 1008, 20, 10, 21, 1006, 21, 0, 99];

    #[must_use]
    pub fn self_copy_program() -> Program {
        Program::new(SELF_COPY.to_vec())
    }

    #[must_use]
    pub fn compare_to_eight_program() -> Program {
        Program::new(COMPARE_TO_EIGHT.to_vec())
    }
}
