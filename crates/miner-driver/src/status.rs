//! Status snapshots.
//!
//! The in-flight nonce lives in the hash clock domain; a direct read could
//! observe a metastable or torn value, so it is sampled through the
//! latch-request register: assert `CURRENT_HASH_REQ`, wait one settle
//! interval, deassert, then read the latched copy. The sequence is
//! mandatory even for best-effort progress reads.

use crate::bus::{RegisterAddress, RegisterBus};
use crate::error::{MinerError, Result};
use miner_chip::regs;
use std::thread;
use std::time::Duration;

/// Default settle interval for clock-domain-crossing latches.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(1);

/// One read-only snapshot of the core's search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MiningStatus {
    /// Golden nonce found.
    pub found: bool,
    /// Nonce space exhausted without a hit.
    pub not_found: bool,
    /// Latched in-flight nonce.
    pub current_nonce: u32,
    /// Golden nonce; meaningful only when `found` is set.
    pub golden_nonce: u32,
}

/// Read-only view over the core's status registers.
#[derive(Debug, Clone, Copy)]
pub struct StatusReporter {
    settle: Duration,
}

impl StatusReporter {
    /// Reporter with the default settle interval.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
        }
    }

    /// Reporter with an explicit settle interval (simulators, tests).
    #[must_use]
    pub const fn with_settle(settle: Duration) -> Self {
        Self { settle }
    }

    /// Take one snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::HardwareFault`] if a register access fails,
    /// or [`MinerError::InconsistentStatus`] if the core reports found and
    /// not-found simultaneously — never silently resolved in favour of
    /// either flag.
    pub fn snapshot<B: RegisterBus>(&self, bus: &mut B) -> Result<MiningStatus> {
        // Latch the in-flight nonce across the clock-domain boundary.
        bus.write(
            RegisterAddress::control(regs::CURRENT_HASH_REQ)?,
            regs::control::ASSERT,
        )?;
        thread::sleep(self.settle);
        bus.write(
            RegisterAddress::control(regs::CURRENT_HASH_REQ)?,
            regs::control::DEASSERT,
        )?;
        let current_nonce = bus.read(RegisterAddress::control(regs::CURRENT_NONCE)?)?;

        let raw_found = bus.read(RegisterAddress::control(regs::STATUS_FOUND)?)?;
        let raw_not_found = bus.read(RegisterAddress::control(regs::STATUS_NOT_FOUND)?)?;
        let found = raw_found & regs::status::FLAG != 0;
        let not_found = raw_not_found & regs::status::FLAG != 0;

        if found && not_found {
            return Err(MinerError::InconsistentStatus {
                raw_found,
                raw_not_found,
            });
        }

        let golden_nonce = if found {
            bus.read(RegisterAddress::control(regs::GOLDEN_NONCE)?)?
        } else {
            0
        };

        Ok(MiningStatus {
            found,
            not_found,
            current_nonce,
            golden_nonce,
        })
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
