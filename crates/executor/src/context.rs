use core::mem::take;

/// Per-instance configuration for a machine.
///
/// Everything that used to be ambient — which cells to patch before the first instruction, how
/// long the machine may run — is passed at construction so that instances never share mutable
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct VmContext {
    /// Memory cells to overwrite after the image is loaded, as `(offset, value)` pairs.
    ///
    /// Cells 1 and 2 are the conventional parameter slots for image-parameterized programs, but
    /// any cell may be patched.
    pub patches: Vec<(i64, i64)>,

    /// The maximum number of instructions to execute, if bounded.
    pub max_steps: Option<u64>,
}

/// A builder for [`VmContext`].
#[derive(Debug, Clone, Default)]
pub struct VmContextBuilder {
    patches: Vec<(i64, i64)>,
    max_steps: Option<u64>,
}

impl VmContext {
    /// Create a new context builder. See [`VmContextBuilder`] for more details.
    #[must_use]
    pub fn builder() -> VmContextBuilder {
        VmContextBuilder::default()
    }
}

impl VmContextBuilder {
    /// Create a new [`VmContextBuilder`].
    ///
    /// Prefer using [`VmContext::builder`].
    #[must_use]
    pub fn new() -> Self {
        VmContextBuilder::default()
    }

    /// Build and return the [`VmContext`].
    ///
    /// Clears and resets the builder, allowing it to be reused.
    pub fn build(&mut self) -> VmContext {
        VmContext { patches: take(&mut self.patches), max_steps: take(&mut self.max_steps) }
    }

    /// Overwrite the memory cell at `offset` with `value` before execution starts.
    pub fn patch(&mut self, offset: i64, value: i64) -> &mut Self {
        self.patches.push((offset, value));
        self
    }

    /// Bound execution to at most `max_steps` instructions.
    pub fn max_steps(&mut self, max_steps: u64) -> &mut Self {
        self.max_steps = Some(max_steps);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::VmContext;

    #[test]
    fn defaults() {
        let VmContext { patches, max_steps } = VmContext::builder().build();
        assert!(patches.is_empty());
        assert!(max_steps.is_none());
    }

    #[test]
    fn with_patches_and_step_limit() {
        let context = VmContext::builder().patch(1, 12).patch(2, 2).max_steps(500).build();
        assert_eq!(context.patches, [(1, 12), (2, 2)]);
        assert_eq!(context.max_steps, Some(500));
    }
}
