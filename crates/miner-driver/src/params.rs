//! Block header and mining parameter types.
//!
//! Header preprocessing — computing the SHA-256 mid-state over the first
//! 512-bit chunk and packing the residual words — happens upstream. The
//! controller only transports the prepared words to the core; it never
//! parses raw header bytes.

use crate::difficulty::{self, Target};
use crate::error::Result;

/// Number of 32-bit mid-state words (SHA-256 chaining state).
pub const MIDSTATE_WORDS: usize = 8;

/// Number of 32-bit residual message words (tail, padding, length).
pub const RESIDUAL_WORDS: usize = 3;

/// Bitcoin block header, as delivered by the block source.
///
/// Immutable once constructed; one header per mining attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Block version.
    pub version: u32,
    /// Previous block hash.
    pub prev_block: [u8; 32],
    /// Merkle root.
    pub merkle_root: [u8; 32],
    /// Block timestamp (Unix seconds).
    pub timestamp: u32,
    /// Compact difficulty bits.
    pub bits: u32,
    /// Starting nonce.
    pub nonce: u32,
}

/// The triple the core is programmed with.
///
/// Word counts are validated at programming time (see
/// [`crate::ParameterProgrammer`]), not at construction — the programmer
/// reports a mismatch with zero registers written, which lets the
/// preprocessor's output flow through unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningParameters {
    midstate: Vec<u32>,
    residual: Vec<u32>,
    target: Target,
}

impl MiningParameters {
    /// Build parameters from preprocessed words and a full target.
    #[must_use]
    pub fn new(midstate: Vec<u32>, residual: Vec<u32>, target: Target) -> Self {
        Self {
            midstate,
            residual,
            target,
        }
    }

    /// Build parameters, deriving the target from a header's compact bits.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MinerError::InvalidDifficultyEncoding`] if `bits`
    /// does not denote a valid target.
    pub fn from_compact_bits(midstate: Vec<u32>, residual: Vec<u32>, bits: u32) -> Result<Self> {
        let target = difficulty::decode(bits)?;
        Ok(Self::new(midstate, residual, target))
    }

    /// Mid-state words.
    #[must_use]
    pub fn midstate(&self) -> &[u32] {
        &self.midstate
    }

    /// Residual words.
    #[must_use]
    pub fn residual(&self) -> &[u32] {
        &self.residual
    }

    /// Difficulty target.
    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_derived_from_header_bits() {
        let params =
            MiningParameters::from_compact_bits(vec![0; 8], vec![0; 3], 0x1D00_FFFF).unwrap();
        assert_eq!(params.target().words()[1], 0xFFFF_0000);
    }

    #[test]
    fn bad_bits_rejected_at_construction() {
        assert!(MiningParameters::from_compact_bits(vec![0; 8], vec![0; 3], 0x1D80_0000).is_err());
    }
}
