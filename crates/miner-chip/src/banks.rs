//! AXI bank layout for the SHA-256d mining core.
//!
//! The core decodes a 1 KB window on the PS→PL GP0 AXI interface, split
//! into four 256-byte banks:
//!
//! ```text
//! Bank  Base    Words  Purpose
//! ───── ─────── ────── ─────────────────────────────────────────
//!  0    0x000   8      Control and status registers
//!  1    0x100   8      SHA-256 mid-state (chaining state)
//!  2    0x200   3      Residual message words (tail + padding + length)
//!  3    0x300   8      256-bit difficulty target
//! ```
//!
//! All registers are 32-bit and word-aligned; the word stride inside a
//! bank is `index * 4`.

use std::fmt;

/// AXI base address of the core's register window (GP0, from the block design).
pub const BASE_ADDR: u64 = 0x43C0_0000;

/// Stride between bank bases.
pub const BANK_STRIDE: usize = 0x100;

/// Total decoded window (four banks).
pub const WINDOW_SIZE: usize = 0x400;

/// Register banks exposed by the mining core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Bank 0 — control and status registers.
    Control,
    /// Bank 1 — SHA-256 mid-state words.
    MidState,
    /// Bank 2 — residual message words.
    Residual,
    /// Bank 3 — 256-bit difficulty target, most-significant word first.
    Target,
}

impl Bank {
    /// All banks, in address order.
    pub const ALL: [Self; 4] = [Self::Control, Self::MidState, Self::Residual, Self::Target];

    /// Offset of this bank's base within the core's AXI window.
    #[must_use]
    pub const fn base(self) -> usize {
        match self {
            Self::Control => 0x000,
            Self::MidState => 0x100,
            Self::Residual => 0x200,
            Self::Target => 0x300,
        }
    }

    /// Number of 32-bit registers decoded in this bank.
    #[must_use]
    pub const fn word_count(self) -> usize {
        match self {
            Self::Control | Self::MidState | Self::Target => 8,
            Self::Residual => 3,
        }
    }

    /// Bytes decoded in this bank (word count × 4).
    #[must_use]
    pub const fn span(self) -> usize {
        self.word_count() * 4
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => write!(f, "Control"),
            Self::MidState => write!(f, "MidState"),
            Self::Residual => write!(f, "Residual"),
            Self::Target => write!(f, "Target"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_bases_fit_the_window() {
        for bank in Bank::ALL {
            assert!(bank.base() + bank.span() <= WINDOW_SIZE);
        }
    }

    #[test]
    fn banks_do_not_overlap() {
        for pair in Bank::ALL.windows(2) {
            assert_eq!(pair[0].base() + BANK_STRIDE, pair[1].base());
            assert!(pair[0].span() <= BANK_STRIDE);
        }
    }

    #[test]
    fn declared_word_counts() {
        assert_eq!(Bank::MidState.word_count(), 8);
        assert_eq!(Bank::Residual.word_count(), 3);
        assert_eq!(Bank::Target.word_count(), 8);
    }
}
