//! Simulated mining core.
//!
//! Implements [`RegisterBus`] over a register-accurate software model of
//! the SHA-256d core: reset and start semantics, nonce progression, golden
//! nonce detection, nonce-space exhaustion, and the clock-domain-crossing
//! latch protocol. Every test in this crate runs against it, so CI never
//! needs the FPGA.
//!
//! The model does not hash. The search is abstracted as a nonce counter
//! that advances by a configurable step on each `STATUS_FOUND` read (one
//! tick per status snapshot), and "finds" a preconfigured golden nonce
//! when the counter sweeps past it.

use crate::bus::{RegisterAddress, RegisterBus};
use crate::error::{MinerError, Result};
use miner_chip::banks::Bank;
use miner_chip::regs;

/// Software model of the mining core's register file and search engine.
#[derive(Debug)]
pub struct SimulatedMiner {
    in_reset: bool,
    running: bool,
    found: bool,
    exhausted: bool,
    current_nonce: u32,
    latched_nonce: u32,
    golden_nonce: Option<u32>,
    nonces_per_tick: u32,
    midstate: [u32; 8],
    residual: [u32; 3],
    target: [u32; 8],
    faulty: bool,
    writes: u64,
}

impl SimulatedMiner {
    /// Create an idle core with no golden nonce configured.
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_reset: false,
            running: false,
            found: false,
            exhausted: false,
            current_nonce: 0,
            latched_nonce: 0,
            golden_nonce: None,
            nonces_per_tick: 1,
            midstate: [0; 8],
            residual: [0; 3],
            target: [0; 8],
            faulty: false,
            writes: 0,
        }
    }

    /// Configure the nonce the simulated search will "find".
    ///
    /// Without one, the search runs until the nonce space wraps.
    #[must_use]
    pub fn with_golden_nonce(mut self, nonce: u32) -> Self {
        self.golden_nonce = Some(nonce);
        self
    }

    /// Nonces swept per status-read tick (default 1).
    #[must_use]
    pub fn with_nonces_per_tick(mut self, step: u32) -> Self {
        self.nonces_per_tick = step.max(1);
        self
    }

    /// Make every subsequent bus access fail with a hardware fault.
    pub fn inject_fault(&mut self) {
        self.faulty = true;
    }

    /// Total register writes accepted so far.
    #[must_use]
    pub const fn write_count(&self) -> u64 {
        self.writes
    }

    /// Programmed mid-state words.
    #[must_use]
    pub const fn midstate(&self) -> [u32; 8] {
        self.midstate
    }

    /// Programmed residual words.
    #[must_use]
    pub const fn residual(&self) -> [u32; 3] {
        self.residual
    }

    /// Programmed target words, most-significant first.
    #[must_use]
    pub const fn target_words(&self) -> [u32; 8] {
        self.target
    }

    /// True while the search engine is sweeping nonces.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn check_fault(&self) -> Result<()> {
        if self.faulty {
            return Err(MinerError::hardware_fault("simulated bus fault"));
        }
        Ok(())
    }

    fn enter_reset(&mut self) {
        self.in_reset = true;
        self.running = false;
        self.found = false;
        self.exhausted = false;
        self.current_nonce = 0;
        self.latched_nonce = 0;
    }

    fn control_write(&mut self, offset: usize, value: u32) {
        match offset {
            regs::RESET => {
                if value & 1 == 1 {
                    self.enter_reset();
                } else {
                    self.in_reset = false;
                }
            }
            regs::START => {
                if value & 1 == 1 && !self.in_reset && !self.found && !self.exhausted {
                    self.running = true;
                }
            }
            regs::CURRENT_HASH_REQ => {
                if value & 1 == 1 {
                    self.latched_nonce = self.current_nonce;
                }
            }
            // Writes to read-only registers fall through, as on hardware.
            _ => {}
        }
    }

    /// Advance the simulated search by one tick.
    fn tick(&mut self) {
        if !self.running {
            return;
        }
        let next = u64::from(self.current_nonce) + u64::from(self.nonces_per_tick);
        if let Some(golden) = self.golden_nonce {
            if u64::from(golden) >= u64::from(self.current_nonce) && u64::from(golden) < next {
                self.current_nonce = golden;
                self.found = true;
                self.running = false;
                return;
            }
        }
        if next > u64::from(u32::MAX) {
            self.current_nonce = u32::MAX;
            self.exhausted = true;
            self.running = false;
        } else {
            // Truncation cannot occur: next <= u32::MAX here.
            #[allow(clippy::cast_possible_truncation)]
            {
                self.current_nonce = next as u32;
            }
        }
    }
}

impl Default for SimulatedMiner {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedMiner {
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        self.check_fault()?;
        self.writes += 1;
        let index = addr.offset() / 4;
        match addr.bank() {
            Bank::Control => self.control_write(addr.offset(), value),
            Bank::MidState => self.midstate[index] = value,
            Bank::Residual => self.residual[index] = value,
            Bank::Target => self.target[index] = value,
        }
        Ok(())
    }

    fn read(&mut self, addr: RegisterAddress) -> Result<u32> {
        self.check_fault()?;
        if addr.bank() != Bank::Control {
            // Parameter banks are write-only on the real core.
            return Ok(0);
        }
        let value = match addr.offset() {
            regs::STATUS_FOUND => {
                self.tick();
                u32::from(self.found)
            }
            regs::STATUS_NOT_FOUND => u32::from(self.exhausted),
            regs::GOLDEN_NONCE => {
                if self.found {
                    self.golden_nonce.unwrap_or(self.current_nonce)
                } else {
                    0
                }
            }
            regs::CURRENT_NONCE => self.latched_nonce,
            _ => 0,
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctrl(offset: usize) -> RegisterAddress {
        RegisterAddress::control(offset).unwrap()
    }

    fn start(sim: &mut SimulatedMiner) {
        sim.write(ctrl(regs::RESET), 1).unwrap();
        sim.write(ctrl(regs::RESET), 0).unwrap();
        sim.write(ctrl(regs::START), 1).unwrap();
    }

    #[test]
    fn reset_clears_search_state() {
        let mut sim = SimulatedMiner::new().with_golden_nonce(0);
        start(&mut sim);
        let _ = sim.read(ctrl(regs::STATUS_FOUND)).unwrap();
        sim.write(ctrl(regs::RESET), 1).unwrap();
        assert_eq!(sim.read(ctrl(regs::STATUS_FOUND)).unwrap(), 0);
        assert!(!sim.is_running());
    }

    #[test]
    fn start_ignored_while_reset_asserted() {
        let mut sim = SimulatedMiner::new();
        sim.write(ctrl(regs::RESET), 1).unwrap();
        sim.write(ctrl(regs::START), 1).unwrap();
        assert!(!sim.is_running());
    }

    #[test]
    fn golden_nonce_found_when_swept() {
        let mut sim = SimulatedMiner::new()
            .with_golden_nonce(250)
            .with_nonces_per_tick(100);
        start(&mut sim);
        let mut polls = 0;
        while sim.read(ctrl(regs::STATUS_FOUND)).unwrap() == 0 {
            polls += 1;
            assert!(polls < 10, "golden nonce never found");
        }
        assert_eq!(sim.read(ctrl(regs::GOLDEN_NONCE)).unwrap(), 250);
        assert_eq!(sim.read(ctrl(regs::STATUS_NOT_FOUND)).unwrap(), 0);
    }

    #[test]
    fn nonce_space_exhausts_without_golden() {
        let mut sim = SimulatedMiner::new().with_nonces_per_tick(u32::MAX);
        start(&mut sim);
        let _ = sim.read(ctrl(regs::STATUS_FOUND)).unwrap();
        let _ = sim.read(ctrl(regs::STATUS_FOUND)).unwrap();
        assert_eq!(sim.read(ctrl(regs::STATUS_NOT_FOUND)).unwrap(), 1);
        assert_eq!(sim.read(ctrl(regs::STATUS_FOUND)).unwrap(), 0);
    }

    #[test]
    fn latch_request_captures_current_nonce() {
        let mut sim = SimulatedMiner::new().with_nonces_per_tick(7);
        start(&mut sim);
        let _ = sim.read(ctrl(regs::STATUS_FOUND)).unwrap();
        sim.write(ctrl(regs::CURRENT_HASH_REQ), 1).unwrap();
        sim.write(ctrl(regs::CURRENT_HASH_REQ), 0).unwrap();
        assert_eq!(sim.read(ctrl(regs::CURRENT_NONCE)).unwrap(), 7);
    }

    #[test]
    fn parameter_banks_store_words() {
        let mut sim = SimulatedMiner::new();
        sim.write(RegisterAddress::word(Bank::MidState, 3).unwrap(), 0xAA).unwrap();
        sim.write(RegisterAddress::word(Bank::Residual, 2).unwrap(), 0xBB).unwrap();
        sim.write(RegisterAddress::word(Bank::Target, 0).unwrap(), 0xCC).unwrap();
        assert_eq!(sim.midstate()[3], 0xAA);
        assert_eq!(sim.residual()[2], 0xBB);
        assert_eq!(sim.target_words()[0], 0xCC);
    }

    #[test]
    fn injected_fault_fails_every_access() {
        let mut sim = SimulatedMiner::new();
        sim.inject_fault();
        assert!(matches!(
            sim.read(ctrl(regs::STATUS_FOUND)),
            Err(MinerError::HardwareFault { .. })
        ));
        assert!(matches!(
            sim.write(ctrl(regs::RESET), 1),
            Err(MinerError::HardwareFault { .. })
        ));
    }
}
