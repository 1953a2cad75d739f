//! Parameter programming sequence.
//!
//! Writes a validated {midstate, residual, target} triple into the core's
//! banks: MidState words in ascending index order, then Residual, then
//! Target. All three banks must be complete before a start signal is
//! issued, and nothing here ever issues one — the session owns that.

use crate::bus::{RegisterAddress, RegisterBus};
use crate::error::{MinerError, Result};
use crate::params::{MiningParameters, MIDSTATE_WORDS, RESIDUAL_WORDS};
use miner_chip::banks::Bank;
use tracing::debug;

/// Programs mining parameters into the core's register banks.
#[derive(Debug, Default)]
pub struct ParameterProgrammer;

impl ParameterProgrammer {
    /// Validate and program a parameter triple.
    ///
    /// Validation runs before the first register write, so a word-count
    /// mismatch programs nothing — no partial-write rollback is ever
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::Validation`] on a word-count mismatch, or
    /// [`MinerError::HardwareFault`] if a register write fails.
    pub fn load<B: RegisterBus>(bus: &mut B, params: &MiningParameters) -> Result<()> {
        if params.midstate().len() != MIDSTATE_WORDS {
            return Err(MinerError::validation(format!(
                "midstate has {} words, core expects {MIDSTATE_WORDS}",
                params.midstate().len()
            )));
        }
        if params.residual().len() != RESIDUAL_WORDS {
            return Err(MinerError::validation(format!(
                "residual has {} words, core expects {RESIDUAL_WORDS}",
                params.residual().len()
            )));
        }

        write_bank(bus, Bank::MidState, params.midstate())?;
        write_bank(bus, Bank::Residual, params.residual())?;
        write_bank(bus, Bank::Target, &params.target().words())?;

        debug!("Programmed midstate, residual and target banks");
        Ok(())
    }
}

fn write_bank<B: RegisterBus>(bus: &mut B, bank: Bank, words: &[u32]) -> Result<()> {
    for (index, &word) in words.iter().enumerate() {
        bus.write(RegisterAddress::word(bank, index)?, word)?;
    }
    Ok(())
}
