//! Host-side controller for an FPGA double-SHA-256 mining core.
//!
//! The core hashes entirely in programmable logic; this crate owns the
//! control protocol: bank/register access, compact-difficulty decoding,
//! the parameter-programming sequence, and the reset/start/poll/stop
//! session state machine.
//!
//! # Backend hierarchy
//!
//! ```text
//! Hardware:
//!   MmioBank       — /dev/mem mapping of the core's AXI register window
//!
//! Development / CI:
//!   SimulatedMiner — register-accurate software model, no hardware required
//! ```
//!
//! # Quick start
//!
//! ```no_run
//! use miner_driver::prelude::*;
//!
//! # fn main() -> miner_driver::Result<()> {
//! let bank = MmioBank::map_default()?;
//! let mut session = MiningSession::new(bank);
//!
//! let target = difficulty::decode(0x1D00_FFFF)?;
//! let params = MiningParameters::new(vec![0x1234_5678; 8], vec![0, 0x8000_0000, 0x0140], target);
//!
//! session.reset()?;
//! session.load_parameters(&params)?;
//! session.start()?;
//!
//! loop {
//!     match session.poll()? {
//!         PollOutcome::Found { golden_nonce } => {
//!             println!("golden nonce: {golden_nonce:#010x}");
//!             break;
//!         }
//!         PollOutcome::Exhausted => break,
//!         PollOutcome::Pending { .. } => std::thread::sleep(std::time::Duration::from_millis(100)),
//!     }
//! }
//! session.stop()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod bus;
pub mod difficulty;
mod error;
pub mod params;
pub mod programmer;
pub mod session;
pub mod status;

pub use bus::mmio::MmioBank;
pub use bus::sim::SimulatedMiner;
pub use bus::{Direction, RegisterAddress, RegisterBus, TracedBus};
pub use difficulty::Target;
pub use error::{MinerError, Result};
pub use params::{BlockHeader, MiningParameters};
pub use programmer::ParameterProgrammer;
pub use session::{MiningSession, PollOutcome, SessionState};
pub use status::{MiningStatus, StatusReporter};

/// Commonly used types.
pub mod prelude {
    pub use crate::difficulty;
    pub use crate::{
        MinerError, MiningParameters, MiningSession, MiningStatus, MmioBank, PollOutcome,
        RegisterBus, Result, SessionState, SimulatedMiner, StatusReporter, Target,
    };
}
