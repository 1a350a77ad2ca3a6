/// Observes packets addressed to the reserved monitor address.
///
/// The monitor keeps only the most recent signal; when the network goes idle the scheduler
/// injects that signal into address 0 as a wake-up packet. The monitor also remembers the first
/// signal it ever saw and the last value it injected, which together decide convergence.
#[derive(Debug, Default)]
pub struct Monitor {
    signal: Option<(i64, i64)>,
    first_signal: Option<(i64, i64)>,
    last_injected_y: Option<i64>,
}

impl Monitor {
    /// Record a signal, replacing the previous one.
    pub fn record(&mut self, x: i64, y: i64) {
        if self.first_signal.is_none() {
            self.first_signal = Some((x, y));
        }
        self.signal = Some((x, y));
    }

    /// The most recently recorded signal.
    #[must_use]
    pub fn signal(&self) -> Option<(i64, i64)> {
        self.signal
    }

    /// The first signal ever recorded.
    #[must_use]
    pub fn first_signal(&self) -> Option<(i64, i64)> {
        self.first_signal
    }

    /// Note that a signal with second component `y` was injected.
    ///
    /// Returns true when `y` repeats the previous injection, the network's convergence
    /// condition.
    pub fn note_injection(&mut self, y: i64) -> bool {
        let repeated = self.last_injected_y == Some(y);
        self.last_injected_y = Some(y);
        repeated
    }
}
