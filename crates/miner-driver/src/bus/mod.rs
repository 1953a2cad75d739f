//! Register bus abstraction for the mining core.
//!
//! All hardware interaction funnels through [`RegisterBus`]. Accesses are
//! issued one 32-bit register at a time, in caller order — register writes
//! carry protocol meaning (reset pulses, latch requests) and must never be
//! elided, coalesced, or reordered.

use crate::error::{MinerError, Result};
use miner_chip::banks::Bank;
use std::fmt;

pub mod mmio;
pub mod sim;

/// A single 32-bit register, addressed as a (bank, offset) pair.
///
/// Construction validates the offset against the bank's declared layout,
/// so a held `RegisterAddress` is always in bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterAddress {
    bank: Bank,
    offset: usize,
}

impl RegisterAddress {
    /// Create a register address.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::Validation`] if `offset` is not 32-bit aligned
    /// or falls outside the bank's decoded word count.
    pub fn new(bank: Bank, offset: usize) -> Result<Self> {
        if offset % 4 != 0 {
            return Err(MinerError::validation(format!(
                "offset {offset:#x} in {bank} bank is not 32-bit aligned"
            )));
        }
        if offset >= bank.span() {
            return Err(MinerError::validation(format!(
                "offset {offset:#x} exceeds {bank} bank ({} words)",
                bank.word_count()
            )));
        }
        Ok(Self { bank, offset })
    }

    /// Address of the `index`-th word of a bank.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::Validation`] if `index` exceeds the bank's
    /// word count.
    pub fn word(bank: Bank, index: usize) -> Result<Self> {
        Self::new(bank, index * 4)
    }

    /// Address of a Control-bank register.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::Validation`] if `offset` is outside the
    /// Control bank.
    pub fn control(offset: usize) -> Result<Self> {
        Self::new(Bank::Control, offset)
    }

    /// Bank this register belongs to.
    #[must_use]
    pub const fn bank(self) -> Bank {
        self.bank
    }

    /// Byte offset within the bank.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.offset
    }

    /// Byte offset within the core's AXI window.
    #[must_use]
    pub const fn window_offset(self) -> usize {
        self.bank.base() + self.offset
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:#04x}", self.bank, self.offset)
    }
}

/// Direction of a register access, for observability hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Register read.
    Read,
    /// Register write.
    Write,
}

/// Register-level access to the mining core.
///
/// Implementations issue exactly one bus transaction per call, in call
/// order. A transport failure is a fatal [`MinerError::HardwareFault`];
/// the bus layer never retries.
pub trait RegisterBus {
    /// Write one 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::HardwareFault`] on a transport failure.
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()>;

    /// Read one 32-bit register.
    ///
    /// # Errors
    ///
    /// Returns [`MinerError::HardwareFault`] on a transport failure.
    fn read(&mut self, addr: RegisterAddress) -> Result<u32>;
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        (**self).write(addr, value)
    }

    fn read(&mut self, addr: RegisterAddress) -> Result<u32> {
        (**self).read(addr)
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for Box<B> {
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        (**self).write(addr, value)
    }

    fn read(&mut self, addr: RegisterAddress) -> Result<u32> {
        (**self).read(addr)
    }
}

/// Per-access observability callback: `(address, value, direction)`.
pub type AccessHook = Box<dyn FnMut(RegisterAddress, u32, Direction)>;

/// Bus decorator that invokes a caller-supplied hook on every access.
///
/// The protocol core stays silent; the embedding decides what to do with
/// each access triple (console trace, capture log, nothing).
pub struct TracedBus<B> {
    inner: B,
    hook: AccessHook,
}

impl<B: RegisterBus> TracedBus<B> {
    /// Wrap a bus with an access hook.
    pub fn new(inner: B, hook: AccessHook) -> Self {
        Self { inner, hook }
    }

    /// Unwrap, discarding the hook.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: RegisterBus> fmt::Debug for TracedBus<B>
where
    B: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracedBus").field("inner", &self.inner).finish_non_exhaustive()
    }
}

impl<B: RegisterBus> RegisterBus for TracedBus<B> {
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        self.inner.write(addr, value)?;
        (self.hook)(addr, value, Direction::Write);
        Ok(())
    }

    fn read(&mut self, addr: RegisterAddress) -> Result<u32> {
        let value = self.inner.read(addr)?;
        (self.hook)(addr, value, Direction::Read);
        Ok(value)
    }
}
