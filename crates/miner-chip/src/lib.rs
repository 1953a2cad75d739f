//! Silicon model for the Zynq-7000 SHA-256d mining core.
//!
//! This crate has **no dependencies** and **no hardware access** — it is a
//! pure model of the programmable logic: the AXI bank layout, the
//! control-bank register map, and the bit definitions of the double-SHA-256
//! proof-of-work core.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`banks`] | AXI window layout — four 256-byte banks and their word counts |
//! | [`regs`] | Control-bank register map — all offsets and bit definitions |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod banks;
pub mod regs;
