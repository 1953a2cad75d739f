//! Control-bank register map for the SHA-256d mining core.
//!
//! Offsets are relative to the Control bank base. Write registers drive
//! the search; read registers report it. The in-flight nonce lives in the
//! hash clock domain, so it is read through a latch-request register
//! rather than directly (see `CURRENT_HASH_REQ`).
//!
//! ```text
//! 0x00  RESET             W  1=assert reset, 0=deassert
//! 0x04  START             W  1=begin hashing over the programmed parameters
//! 0x08  STATUS_FOUND      R  bit0 set once a golden nonce has been latched
//! 0x0C  GOLDEN_NONCE      R  valid only while STATUS_FOUND reads set
//! 0x10  CURRENT_HASH_REQ  W  pulse to latch the in-flight nonce across the CDC
//! 0x14  STATUS_NOT_FOUND  R  bit0 set once the nonce space wrapped without a hit
//! 0x18  CURRENT_NONCE     R  latched nonce, valid one settle interval after the pulse
//! ```

/// Reset control — write 1 to assert, 0 to deassert.
pub const RESET: usize = 0x00;

/// Start — write 1 to begin hashing over the programmed parameters.
pub const START: usize = 0x04;

/// Found flag — bit 0 set once a golden nonce has been latched.
pub const STATUS_FOUND: usize = 0x08;

/// Golden nonce — valid only while `STATUS_FOUND` reads set.
pub const GOLDEN_NONCE: usize = 0x0C;

/// Current-nonce latch request — pulse high, wait one settle interval,
/// then deassert before reading `CURRENT_NONCE`.
pub const CURRENT_HASH_REQ: usize = 0x10;

/// Exhausted flag — bit 0 set once the nonce space wrapped without a hit.
pub const STATUS_NOT_FOUND: usize = 0x14;

/// Latched in-flight nonce.
pub const CURRENT_NONCE: usize = 0x18;

/// Status register bit definitions.
pub mod status {
    /// Flag registers report in bit 0; the upper bits read as zero.
    pub const FLAG: u32 = 1 << 0;
}

/// Control register values.
pub mod control {
    /// Assert value for `RESET` / `START` / `CURRENT_HASH_REQ`.
    pub const ASSERT: u32 = 1;
    /// Deassert value.
    pub const DEASSERT: u32 = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::Bank;

    #[test]
    fn register_offsets_non_overlapping() {
        let offsets = [
            RESET,
            START,
            STATUS_FOUND,
            GOLDEN_NONCE,
            CURRENT_HASH_REQ,
            STATUS_NOT_FOUND,
            CURRENT_NONCE,
        ];
        for (i, a) in offsets.iter().enumerate() {
            for b in &offsets[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn registers_fit_the_control_bank() {
        assert!(CURRENT_NONCE + 4 <= Bank::Control.span());
    }

    #[test]
    fn registers_are_word_aligned() {
        for offset in [RESET, START, STATUS_FOUND, GOLDEN_NONCE, CURRENT_HASH_REQ, STATUS_NOT_FOUND, CURRENT_NONCE] {
            assert_eq!(offset % 4, 0);
        }
    }
}
