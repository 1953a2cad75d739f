//! Memory-mapped register access over `/dev/mem`.
//!
//! The mining core sits behind the Zynq PS→PL GP0 AXI interface; its 1 KB
//! register window is mapped with `rustix` mmap and accessed with volatile
//! 32-bit loads and stores so no access is elided or reordered by the
//! compiler.

// MMIO registers are naturally aligned by the decoded window, so the
// pointer casts below are safe.
#![allow(clippy::cast_ptr_alignment)]

use crate::bus::{RegisterAddress, RegisterBus};
use crate::error::{MinerError, Result};
use miner_chip::banks::{BASE_ADDR, WINDOW_SIZE};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fmt;
use std::fs::OpenOptions;
use std::os::unix::io::AsFd;

/// Memory-mapped view of the mining core's register window.
///
/// Owns the mapping exclusively; dropping it unmaps the window.
pub struct MmioBank {
    ptr: *mut u8,
    size: usize,
    base_addr: u64,
    _file: std::fs::File,
}

impl fmt::Debug for MmioBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmioBank")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .field("base_addr", &format_args!("{:#010x}", self.base_addr))
            .finish()
    }
}

// SAFETY: MmioBank owns the mapped window exclusively. Moving it between
// threads does not invalidate the mapping (mmap'd memory is process-wide),
// and all access goes through &mut self.
unsafe impl Send for MmioBank {}

impl MmioBank {
    /// Map the core's register window from `/dev/mem` at `base_addr`.
    ///
    /// Requires read/write access to `/dev/mem` (root or a dedicated
    /// group), and `base_addr` must be the core's AXI window from the
    /// block design.
    ///
    /// # Errors
    ///
    /// Returns an error if `/dev/mem` cannot be opened or the mapping
    /// fails.
    pub fn map(base_addr: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open("/dev/mem")?;

        // SAFETY: mmap necessary for MMIO - maps the AXI window into the
        // process address space. fd just opened above; length is the fixed
        // window size; offset is the physical base from the block design;
        // SHARED so writes reach the device.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                WINDOW_SIZE,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                base_addr,
            )
            .map_err(|e| {
                MinerError::hardware_fault(format!(
                    "mmap of core window at {base_addr:#010x} failed: {e}"
                ))
            })?
        };

        tracing::info!(
            "Mapped mining core window at {:p} (phys {:#010x}, {} bytes)",
            ptr,
            base_addr,
            WINDOW_SIZE
        );

        Ok(Self {
            ptr: ptr.cast(),
            size: WINDOW_SIZE,
            base_addr,
            _file: file,
        })
    }

    /// Map at the block design's default base address.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`MmioBank::map`].
    pub fn map_default() -> Result<Self> {
        Self::map(BASE_ADDR)
    }

    /// Physical base address of the mapped window.
    #[must_use]
    pub const fn base_addr(&self) -> u64 {
        self.base_addr
    }
}

impl RegisterBus for MmioBank {
    fn write(&mut self, addr: RegisterAddress, value: u32) -> Result<()> {
        let offset = addr.window_offset();
        assert!(offset + 4 <= self.size, "register offset out of window");
        // SAFETY: write_volatile necessary for MMIO - every write has
        // protocol meaning and must reach the device. ptr valid for
        // self.size from map(); offset bounds-asserted; registers are
        // word-aligned by construction of RegisterAddress.
        unsafe {
            std::ptr::write_volatile(self.ptr.add(offset).cast::<u32>(), value);
        }
        tracing::trace!("W {addr} = {value:#010x}");
        Ok(())
    }

    fn read(&mut self, addr: RegisterAddress) -> Result<u32> {
        let offset = addr.window_offset();
        assert!(offset + 4 <= self.size, "register offset out of window");
        // SAFETY: read_volatile necessary for MMIO - the device can change
        // the value between reads. Same pointer invariants as write().
        let value = unsafe { std::ptr::read_volatile(self.ptr.add(offset).cast::<u32>()) };
        tracing::trace!("R {addr} = {value:#010x}");
        Ok(value)
    }
}

impl Drop for MmioBank {
    fn drop(&mut self) {
        // SAFETY: ptr/size are exactly what map() mapped; Drop runs at
        // most once and no other references to the window exist.
        unsafe {
            // Error ignored in Drop (nothing to propagate to).
            let _ = munmap(self.ptr.cast(), self.size);
        }
        tracing::debug!("Unmapped mining core window at {:#010x}", self.base_addr);
    }
}
