use ivm_executor::{ExecutionError, ExecutionReport, Program, StepOutcome};
use thiserror::Error;

use crate::{Monitor, NetworkNode, Packet};

/// The value fed to a node that requests input while nothing is queued for it.
///
/// Network programs poll for packets; the sentinel lets them observe an empty network and keep
/// running instead of blocking forever.
pub const NO_PACKET: i64 = -1;

/// Configuration for a simulated network run.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Address whose packets are recorded by the monitor instead of routed.
    pub monitor_address: i64,

    /// Consecutive idle rounds before the monitor wakes address 0.
    ///
    /// The default of 100 is a tuned constant, kept as configuration rather than re-derived.
    pub idle_threshold: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { monitor_address: 255, idle_threshold: 100 }
    }
}

/// Errors that end a network run without convergence.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The only instance in the network faulted; with nothing left to schedule, the fault
    /// propagates to the caller.
    #[error("node {address} faulted: {source}")]
    NodeFault {
        /// The address of the faulting node.
        address: i64,
        /// The fault that retired it.
        #[source]
        source: ExecutionError,
    },
    /// Every node was retired before the network converged.
    #[error("every node has been retired without convergence")]
    AllNodesRetired,
    /// The idle threshold was reached before any packet arrived at the monitor.
    #[error("network went idle with no recorded monitor signal")]
    IdleWithoutSignal,
}

/// The result of a converged network run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convergence {
    /// The monitor signal whose repeated injection ended the run.
    pub signal: (i64, i64),
    /// The first signal the monitor ever recorded.
    pub first_signal: (i64, i64),
    /// The number of scheduling rounds executed.
    pub rounds: u64,
}

/// A simulated network of machine instances, scheduled cooperatively.
///
/// All instances execute on a single control thread in deterministic round-robin order. The
/// only state shared between instances is the per-address inbound queues, written by the
/// scheduler when routing and drained by the scheduler before stepping, so no locking is ever
/// involved.
#[derive(Debug)]
pub struct Network {
    /// The nodes, indexed by address.
    pub nodes: Vec<NetworkNode>,
    /// The observer for the reserved monitor address.
    pub monitor: Monitor,
    /// The run configuration.
    pub config: NetworkConfig,
    idle_rounds: u64,
}

impl Network {
    /// Create a network of `size` instances of `program`, addressed 0..size.
    #[must_use]
    pub fn new(program: &Program, size: usize) -> Self {
        Self::with_config(program, size, NetworkConfig::default())
    }

    /// Create a network with explicit configuration.
    #[must_use]
    pub fn with_config(program: &Program, size: usize, config: NetworkConfig) -> Self {
        let nodes =
            (0..size).map(|address| NetworkNode::new(program, address as i64)).collect();
        Self { nodes, monitor: Monitor::default(), config, idle_rounds: 0 }
    }

    /// Run scheduling rounds until the network converges.
    pub fn run(&mut self) -> Result<Convergence, NetworkError> {
        let mut rounds = 0u64;
        loop {
            let activity = self.round()?;
            rounds += 1;

            if self.nodes.iter().all(|node| node.retired) {
                return Err(NetworkError::AllNodesRetired);
            }

            if activity {
                self.idle_rounds = 0;
                continue;
            }

            self.idle_rounds += 1;
            if self.idle_rounds >= self.config.idle_threshold {
                let (x, y) = self.monitor.signal().ok_or(NetworkError::IdleWithoutSignal)?;
                tracing::debug!(x, y, "network idle; waking address 0");
                self.nodes[0].inbox.push_back(x);
                self.nodes[0].inbox.push_back(y);
                self.idle_rounds = 0;
                if self.monitor.note_injection(y) {
                    tracing::debug!(y, rounds, "monitor signal repeated; network converged");
                    return Ok(Convergence {
                        signal: (x, y),
                        first_signal: self.monitor.first_signal().unwrap_or((x, y)),
                        rounds,
                    });
                }
            }
        }
    }

    /// Execute one scheduling round.
    ///
    /// Queued inbound values are delivered to every live instance first, so all
    /// currently-queued input is visible before an instance is stepped. Each instance then runs
    /// until it suspends for input; completed packets are routed as they appear, and a starved
    /// instance is fed a single [`NO_PACKET`] before the round moves on.
    ///
    /// Returns whether the round saw any activity: inbound data delivered or output produced.
    pub fn round(&mut self) -> Result<bool, NetworkError> {
        let mut activity = false;

        for node in &mut self.nodes {
            if node.retired {
                continue;
            }
            if !node.inbox.is_empty() {
                activity = true;
            }
            while let Some(value) = node.inbox.pop_front() {
                node.vm.feed(value);
            }
        }

        for index in 0..self.nodes.len() {
            if self.nodes[index].retired {
                continue;
            }
            loop {
                match self.nodes[index].vm.next_event() {
                    Ok(StepOutcome::Output(value)) => {
                        activity = true;
                        self.nodes[index].vm.drain_output();
                        if let Some(packet) = self.nodes[index].collect(value) {
                            self.route(packet);
                        }
                    }
                    Ok(StepOutcome::NeedsInput) => {
                        self.nodes[index].vm.feed(NO_PACKET);
                        break;
                    }
                    Ok(StepOutcome::Halted) => {
                        tracing::debug!(address = self.nodes[index].address, "node halted");
                        self.nodes[index].retired = true;
                        break;
                    }
                    Ok(StepOutcome::Continue) => {
                        unreachable!("next_event never yields Continue")
                    }
                    Err(source) => {
                        if self.nodes.len() == 1 {
                            return Err(NetworkError::NodeFault {
                                address: self.nodes[index].address,
                                source,
                            });
                        }
                        tracing::warn!(
                            address = self.nodes[index].address,
                            %source,
                            "node faulted; retiring"
                        );
                        self.nodes[index].retired = true;
                        break;
                    }
                }
            }
        }

        Ok(activity)
    }

    /// Aggregate the execution reports of every node.
    #[must_use]
    pub fn report(&self) -> ExecutionReport {
        self.nodes
            .iter()
            .fold(ExecutionReport::default(), |report, node| report + node.vm.report.clone())
    }

    fn route(&mut self, packet: Packet) {
        if packet.destination == self.config.monitor_address {
            self.monitor.record(packet.x, packet.y);
            return;
        }
        match usize::try_from(packet.destination).ok().and_then(|d| self.nodes.get_mut(d)) {
            Some(node) => {
                node.inbox.push_back(packet.x);
                node.inbox.push_back(packet.y);
            }
            None => {
                tracing::warn!(
                    destination = packet.destination,
                    "dropping packet to unknown address"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Network, NetworkConfig, NetworkError};
    use ivm_executor::Program;

    /// Reads its address; address 0 sends `(1, 7, 8)` once, everyone then polls forever.
    const SEND_TO_ONE: &[i64] =
        &[3, 50, 1005, 50, 11, 104, 1, 104, 7, 104, 8, 3, 50, 1105, 1, 11];

    /// Reads its address; address 0 sends `(255, 0, 42)` once, everyone then polls forever.
    const SIGNAL_MONITOR: &[i64] =
        &[3, 50, 1005, 50, 11, 104, 255, 104, 0, 104, 42, 3, 50, 1105, 1, 11];

    /// Address 0 runs into an unknown opcode; everyone else sends `(255, 5, 9)` and polls.
    const FAULT_AT_ZERO: &[i64] =
        &[3, 50, 1006, 50, 16, 104, 255, 104, 5, 104, 9, 3, 50, 1105, 1, 11, 98];

    #[test]
    fn packets_are_queued_for_the_destination_in_order() {
        let mut network = Network::new(&Program::new(SEND_TO_ONE.to_vec()), 2);
        network.round().unwrap();
        assert_eq!(network.nodes[1].inbox, [7, 8]);
    }

    #[test]
    fn delivery_happens_before_stepping_on_the_next_round() {
        let mut network = Network::new(&Program::new(SEND_TO_ONE.to_vec()), 2);
        network.round().unwrap();
        network.round().unwrap();
        // The queue was drained into the machine at the start of round two, and the poll loop
        // consumed both values in order; the last one read sticks in the receive cell.
        assert!(network.nodes[1].inbox.is_empty());
        assert_eq!(network.nodes[1].vm.state.memory.peek(50), 8);
    }

    #[test]
    fn idle_network_converges_on_a_repeated_monitor_signal() {
        let config = NetworkConfig { idle_threshold: 2, ..NetworkConfig::default() };
        let mut network = Network::with_config(&Program::new(SIGNAL_MONITOR.to_vec()), 3, config);
        let convergence = network.run().unwrap();
        assert_eq!(convergence.signal, (0, 42));
        assert_eq!(convergence.first_signal, (0, 42));
        assert!(convergence.rounds > 0);
    }

    #[test]
    fn a_faulting_node_is_retired_and_the_rest_continue() {
        let config = NetworkConfig { idle_threshold: 2, ..NetworkConfig::default() };
        let mut network = Network::with_config(&Program::new(FAULT_AT_ZERO.to_vec()), 2, config);
        let convergence = network.run().unwrap();
        assert!(network.nodes[0].retired);
        assert!(!network.nodes[1].retired);
        assert_eq!(convergence.signal, (5, 9));
    }

    #[test]
    fn a_single_instance_fault_propagates() {
        let mut network = Network::new(&Program::new(vec![98]), 1);
        assert!(matches!(network.run(), Err(NetworkError::NodeFault { address: 0, .. })));
    }

    #[test]
    fn idle_without_a_signal_is_an_error() {
        // Nobody ever talks to the monitor; the wake-up has nothing to inject.
        let config = NetworkConfig { idle_threshold: 2, ..NetworkConfig::default() };
        let mut network =
            Network::with_config(&Program::new(vec![3, 50, 1105, 1, 0]), 2, config);
        assert!(matches!(network.run(), Err(NetworkError::IdleWithoutSignal)));
    }

    #[test]
    fn reports_aggregate_across_nodes() {
        let mut network = Network::new(&Program::new(SEND_TO_ONE.to_vec()), 2);
        network.round().unwrap();
        assert!(network.report().total_instruction_count() > 0);
    }
}
