//! Mining session state machine.
//!
//! `reset → load_parameters → start → poll… → stop`, with every illegal
//! sequence surfaced as a typed error instead of a garbage register read.
//! The session owns its register bus: one physical core, at most one live
//! session, enforced by the type system rather than a runtime lock.
//!
//! The session never blocks beyond the settle delays intrinsic to the
//! reset and nonce-latch protocols. The caller owns the polling cadence,
//! the deadline budget, and cancellation — `poll()` does not sleep, and
//! the elapsed poll count is exposed so a deadline policy can live
//! entirely outside the state machine.

use crate::bus::{RegisterAddress, RegisterBus};
use crate::error::{MinerError, Result};
use crate::params::MiningParameters;
use crate::programmer::ParameterProgrammer;
use crate::status::{StatusReporter, DEFAULT_SETTLE};
use miner_chip::regs;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Lifecycle state of a mining session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Clean; parameters not programmed.
    Idle,
    /// Parameter banks programmed; start not yet issued.
    ParametersLoaded,
    /// Core is sweeping nonces.
    Running,
    /// Golden nonce found.
    Found,
    /// Nonce space exhausted without a solution.
    Exhausted,
    /// Caller's deadline budget expired.
    TimedOut,
    /// A register access failed; hardware state is unknown. Dead end —
    /// only a process restart clears it.
    Faulted,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::ParametersLoaded => "ParametersLoaded",
            Self::Running => "Running",
            Self::Found => "Found",
            Self::Exhausted => "Exhausted",
            Self::TimedOut => "TimedOut",
            Self::Faulted => "Faulted",
        };
        f.write_str(name)
    }
}

/// Outcome of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still searching; carries the latched in-flight nonce.
    Pending {
        /// Latched in-flight nonce, for progress reporting.
        current_nonce: u32,
    },
    /// Golden nonce found; the session is now [`SessionState::Found`].
    Found {
        /// The proof-of-work solution.
        golden_nonce: u32,
    },
    /// Nonce space exhausted; the session is now [`SessionState::Exhausted`].
    Exhausted,
}

/// Exclusive handle over one mining core.
///
/// Owns the register bus by value, so a second session over the same bank
/// cannot be constructed while this one lives.
#[derive(Debug)]
pub struct MiningSession<B> {
    bus: B,
    state: SessionState,
    reporter: StatusReporter,
    settle: Duration,
    polls: u64,
}

impl<B: RegisterBus> MiningSession<B> {
    /// Take exclusive ownership of a register bank.
    pub fn new(bus: B) -> Self {
        Self::with_settle(bus, DEFAULT_SETTLE)
    }

    /// Override the settle interval (simulators, tests).
    pub fn with_settle(bus: B, settle: Duration) -> Self {
        Self {
            bus,
            state: SessionState::Idle,
            reporter: StatusReporter::with_settle(settle),
            settle,
            polls: 0,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Polls issued since the last `start()`, for caller deadline policy.
    #[must_use]
    pub const fn polls(&self) -> u64 {
        self.polls
    }

    /// Read-only view of the owned bus (inspection, tests).
    #[must_use]
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// Release the bank. Legal only from `Idle`; otherwise the session is
    /// handed back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` if the session is not `Idle`.
    pub fn into_inner(self) -> std::result::Result<B, Self> {
        if self.state == SessionState::Idle {
            Ok(self.bus)
        } else {
            Err(self)
        }
    }

    /// Pulse the core's reset line: assert, settle, deassert.
    ///
    /// Always legal from `Idle`; guarantees a clean starting state before
    /// loading parameters.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::InvalidTransition`] outside `Idle`, or
    /// [`MinerError::HardwareFault`] (session becomes `Faulted`) if a
    /// register write fails.
    pub fn reset(&mut self) -> Result<()> {
        self.require(&[SessionState::Idle], "reset")?;
        let pulse = self.reset_pulse();
        self.fatal(pulse)
    }

    /// Program a parameter triple.
    ///
    /// Legal only from `Idle`. A validation failure programs nothing and
    /// leaves the session `Idle`, so the caller can retry with corrected
    /// input.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::Validation`] on bad word counts (state
    /// unchanged), [`MinerError::InvalidTransition`] outside `Idle`, or
    /// [`MinerError::HardwareFault`] (session becomes `Faulted`).
    pub fn load_parameters(&mut self, params: &MiningParameters) -> Result<()> {
        self.require(&[SessionState::Idle], "load_parameters")?;
        let programmed = ParameterProgrammer::load(&mut self.bus, params);
        self.fatal(programmed)?;
        self.state = SessionState::ParametersLoaded;
        debug!("Parameters loaded");
        Ok(())
    }

    /// Issue the start signal.
    ///
    /// Legal only from `ParametersLoaded` — starting a core with stale or
    /// absent parameters is exactly the bug this machine exists to catch.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::InvalidTransition`] from any other state, or
    /// [`MinerError::HardwareFault`] (session becomes `Faulted`).
    pub fn start(&mut self) -> Result<()> {
        self.require(&[SessionState::ParametersLoaded], "start")?;
        let started = self.write_control(regs::START, regs::control::ASSERT);
        self.fatal(started)?;
        self.state = SessionState::Running;
        self.polls = 0;
        info!("Search started");
        Ok(())
    }

    /// Read the core's status once.
    ///
    /// Legal only while `Running`. Transitions to `Found` or `Exhausted`
    /// on a terminal flag; otherwise stays `Running` and reports the
    /// in-flight nonce. This call does not sleep — the inter-poll delay
    /// belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::InvalidTransition`] outside `Running`,
    /// [`MinerError::InconsistentStatus`] if the core asserts both
    /// terminal flags (session stays `Running`), or
    /// [`MinerError::HardwareFault`] (session becomes `Faulted`).
    pub fn poll(&mut self) -> Result<PollOutcome> {
        self.require(&[SessionState::Running], "poll")?;
        self.polls += 1;
        let snapshot = self.reporter.snapshot(&mut self.bus);
        let status = self.fatal(snapshot)?;

        if status.found {
            self.state = SessionState::Found;
            info!("Golden nonce found: {:#010x}", status.golden_nonce);
            Ok(PollOutcome::Found {
                golden_nonce: status.golden_nonce,
            })
        } else if status.not_found {
            self.state = SessionState::Exhausted;
            info!("Nonce space exhausted");
            Ok(PollOutcome::Exhausted)
        } else {
            Ok(PollOutcome::Pending {
                current_nonce: status.current_nonce,
            })
        }
    }

    /// Record that the caller's deadline budget expired.
    ///
    /// The machine never times itself out; the caller decides, from wall
    /// clock or [`polls`](Self::polls), and moves the session to
    /// `TimedOut` so `stop()` can clean up.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::InvalidTransition`] outside `Running`.
    pub fn mark_timed_out(&mut self) -> Result<()> {
        self.require(&[SessionState::Running], "mark_timed_out")?;
        self.state = SessionState::TimedOut;
        debug!("Deadline expired after {} polls", self.polls);
        Ok(())
    }

    /// Stop the core and return to `Idle` via a reset pulse.
    ///
    /// Legal from the terminal states and, as the cancellation path, from
    /// `Running` and `ParametersLoaded`. Re-enables a fresh
    /// `load_parameters` over the same bank.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::InvalidTransition`] from `Idle` or `Faulted`,
    /// or [`MinerError::HardwareFault`] (session becomes `Faulted`).
    pub fn stop(&mut self) -> Result<()> {
        self.require(
            &[
                SessionState::ParametersLoaded,
                SessionState::Running,
                SessionState::Found,
                SessionState::Exhausted,
                SessionState::TimedOut,
            ],
            "stop",
        )?;
        let pulse = self.reset_pulse();
        self.fatal(pulse)?;
        self.state = SessionState::Idle;
        info!("Session stopped");
        Ok(())
    }

    fn require(&self, allowed: &[SessionState], operation: &'static str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(MinerError::InvalidTransition {
                from: self.state,
                operation,
            })
        }
    }

    /// Route a protocol result, trapping transport faults in `Faulted`.
    ///
    /// Hardware state after a partial bus fault cannot be assumed, so no
    /// in-state recovery is attempted. Validation and status errors pass
    /// through with the state unchanged.
    fn fatal<T>(&mut self, result: Result<T>) -> Result<T> {
        if matches!(
            result,
            Err(MinerError::HardwareFault { .. } | MinerError::Io { .. })
        ) {
            self.state = SessionState::Faulted;
        }
        result
    }

    fn write_control(&mut self, offset: usize, value: u32) -> Result<()> {
        self.bus.write(RegisterAddress::control(offset)?, value)
    }

    fn reset_pulse(&mut self) -> Result<()> {
        self.write_control(regs::RESET, regs::control::ASSERT)?;
        thread::sleep(self.settle);
        self.write_control(regs::RESET, regs::control::DEASSERT)?;
        debug!("Reset pulse issued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::sim::SimulatedMiner;
    use crate::difficulty::Target;

    fn session(sim: SimulatedMiner) -> MiningSession<SimulatedMiner> {
        MiningSession::with_settle(sim, Duration::ZERO)
    }

    fn valid_params() -> MiningParameters {
        MiningParameters::new(vec![0x1234_5678; 8], vec![0, 0x8000_0000, 0x0140], Target::ZERO)
    }

    #[test]
    fn start_from_idle_is_rejected() {
        let mut s = session(SimulatedMiner::new());
        let err = s.start().unwrap_err();
        assert!(matches!(
            err,
            MinerError::InvalidTransition {
                from: SessionState::Idle,
                operation: "start"
            }
        ));
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn poll_before_start_is_rejected() {
        let mut s = session(SimulatedMiner::new());
        s.reset().unwrap();
        s.load_parameters(&valid_params()).unwrap();
        assert!(s.poll().is_err());
        assert_eq!(s.state(), SessionState::ParametersLoaded);
    }

    #[test]
    fn validation_failure_keeps_idle() {
        let mut s = session(SimulatedMiner::new());
        let short = MiningParameters::new(vec![0; 7], vec![0; 3], Target::ZERO);
        assert!(matches!(
            s.load_parameters(&short),
            Err(MinerError::Validation { .. })
        ));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.bus().write_count(), 0);
    }

    #[test]
    fn timeout_is_caller_driven() {
        let mut s = session(SimulatedMiner::new());
        assert!(s.mark_timed_out().is_err());

        s.reset().unwrap();
        s.load_parameters(&valid_params()).unwrap();
        s.start().unwrap();
        let _ = s.poll().unwrap();
        assert_eq!(s.polls(), 1);
        s.mark_timed_out().unwrap();
        assert_eq!(s.state(), SessionState::TimedOut);
        s.stop().unwrap();
        assert_eq!(s.state(), SessionState::Idle);
    }

    #[test]
    fn stop_cancels_a_running_search() {
        let mut s = session(SimulatedMiner::new());
        s.reset().unwrap();
        s.load_parameters(&valid_params()).unwrap();
        s.start().unwrap();
        s.stop().unwrap();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.bus().is_running());
    }

    #[test]
    fn bus_fault_dead_ends_the_session() {
        let mut sim = SimulatedMiner::new();
        sim.inject_fault();
        let mut s = session(sim);
        assert!(matches!(s.reset(), Err(MinerError::HardwareFault { .. })));
        assert_eq!(s.state(), SessionState::Faulted);
        // Nothing is legal from Faulted.
        assert!(s.reset().is_err());
        assert!(s.stop().is_err());
        assert!(s.load_parameters(&valid_params()).is_err());
    }

    #[test]
    fn into_inner_only_from_idle() {
        let mut s = session(SimulatedMiner::new());
        s.reset().unwrap();
        s.load_parameters(&valid_params()).unwrap();
        let mut s = s.into_inner().unwrap_err();
        s.stop().unwrap();
        assert!(s.into_inner().is_ok());
    }
}
