//! Compact difficulty ("nBits") codec.
//!
//! Block headers carry the 256-bit proof-of-work threshold as a 4-byte
//! floating-point-like encoding: one exponent byte (the number of
//! significant bytes) and a 3-byte mantissa, `target = mantissa ×
//! 256^(exponent − 3)`. The core needs the full 256-bit value to program
//! the Target bank, and an off-by-one exponent changes difficulty by a
//! factor of 256, so this codec is exact and rejects the encodings the
//! canonical form calls invalid.

// Byte extraction below truncates deliberately.
#![allow(clippy::cast_possible_truncation)]

use crate::error::{MinerError, Result};
use std::fmt;

/// Mantissa sign bit; set means a negative target in the canonical
/// encoding, which is invalid.
const MANTISSA_SIGN: u32 = 0x0080_0000;

/// 256-bit big-endian proof-of-work target.
///
/// `words()[0]` is the most significant word — the order the Target bank
/// is programmed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target([u32; 8]);

impl Target {
    /// The all-zero target (unreachable by any hash).
    pub const ZERO: Self = Self([0; 8]);

    /// Build from eight words, most-significant first.
    #[must_use]
    pub const fn from_words(words: [u32; 8]) -> Self {
        Self(words)
    }

    /// The eight target words, most-significant first.
    #[must_use]
    pub const fn words(&self) -> [u32; 8] {
        self.0
    }

    /// Big-endian byte representation.
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.0) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        bytes
    }

    /// Build from big-endian bytes.
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Self(words)
    }

    /// True for the all-zero target.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0; 8]
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.0 {
            write!(f, "{word:08x}")?;
        }
        Ok(())
    }
}

/// Decode a compact difficulty encoding into a full target.
///
/// The top byte is the exponent (significant byte count), the low three
/// bytes the mantissa. An exponent below 3 shifts the mantissa right
/// instead of left; a zero mantissa decodes to the zero target.
///
/// # Errors
///
/// Returns [`MinerError::InvalidDifficultyEncoding`] if the mantissa sign
/// bit is set, or the value does not fit in 256 bits.
pub fn decode(compact: u32) -> Result<Target> {
    let exponent = (compact >> 24) as usize;
    let mantissa = compact & 0x00FF_FFFF;

    if mantissa & MANTISSA_SIGN != 0 {
        return Err(MinerError::invalid_encoding(compact, "mantissa sign bit set"));
    }
    if mantissa == 0 {
        return Ok(Target::ZERO);
    }
    if exponent > 32 {
        return Err(MinerError::invalid_encoding(compact, "target exceeds 256 bits"));
    }

    let mut bytes = [0u8; 32];
    if exponent <= 3 {
        // Degenerate low exponents shift the mantissa right.
        let value = mantissa >> (8 * (3 - exponent));
        bytes[29] = (value >> 16) as u8;
        bytes[30] = (value >> 8) as u8;
        bytes[31] = value as u8;
    } else {
        // The three mantissa bytes occupy the top of an exponent-byte value.
        let top = 32 - exponent;
        bytes[top] = (mantissa >> 16) as u8;
        bytes[top + 1] = (mantissa >> 8) as u8;
        bytes[top + 2] = mantissa as u8;
    }
    Ok(Target::from_be_bytes(bytes))
}

/// Re-encode a target in canonical minimal-exponent compact form.
///
/// Targets wider than three significant bytes lose precision, as the
/// encoding itself does. The zero target encodes to `0`. The returned
/// form never has the mantissa sign bit set.
#[must_use]
pub fn encode(target: Target) -> u32 {
    let bytes = target.to_be_bytes();
    let Some(first) = bytes.iter().position(|&b| b != 0) else {
        return 0;
    };

    let mut exponent = 32 - first;
    let mut mantissa = u32::from(bytes[first]) << 16;
    if first + 1 < 32 {
        mantissa |= u32::from(bytes[first + 1]) << 8;
    }
    if first + 2 < 32 {
        mantissa |= u32::from(bytes[first + 2]);
    }

    // Canonical form keeps the sign bit clear by padding with a zero byte.
    if mantissa & MANTISSA_SIGN != 0 {
        mantissa >>= 8;
        exponent += 1;
    }

    // Exponent fits in a byte: at most 33 after the sign-bit adjustment.
    #[allow(clippy::cast_possible_truncation)]
    let exponent = exponent as u32;
    (exponent << 24) | mantissa
}
