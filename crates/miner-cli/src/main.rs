//! `miner` — command-line interface for the SHA-256d mining core.
//!
//! ```text
//! USAGE:
//!   miner decode-bits <bits>         Print a compact encoding as a 256-bit target
//!   miner reset                      Pulse the core's reset line
//!   miner status                     Take one status snapshot
//!   miner mine --midstate .. --residual .. --bits ..
//!                                    Program parameters and poll to completion
//!
//! Pass --sim to drive the simulated core instead of /dev/mem hardware.
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use miner_driver::{
    difficulty, MiningParameters, MiningSession, MmioBank, PollOutcome, RegisterBus,
    SimulatedMiner, StatusReporter,
};
use std::thread;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "miner", about = "SHA-256d mining core CLI", version)]
struct Cli {
    /// AXI base address of the core's register window.
    #[arg(long, value_parser = parse_u64, default_value = "0x43C00000")]
    base_addr: u64,

    /// Drive the simulated core instead of hardware.
    #[arg(long)]
    sim: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Decode a compact difficulty encoding into a 256-bit target.
    DecodeBits {
        /// Compact bits (e.g. 0x1D00FFFF).
        bits: String,
    },
    /// Pulse the core's reset line.
    Reset,
    /// Take one status snapshot.
    Status,
    /// Program parameters and poll until found, exhausted, or deadline.
    Mine {
        /// Eight mid-state words, comma-separated hex.
        #[arg(long)]
        midstate: String,
        /// Three residual words, comma-separated hex.
        #[arg(long)]
        residual: String,
        /// Compact difficulty bits (e.g. 0x1D00FFFF).
        #[arg(long)]
        bits: String,
        /// Delay between polls in milliseconds.
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,
        /// Overall deadline in seconds.
        #[arg(long, default_value_t = 100)]
        timeout_s: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::DecodeBits { bits } => cmd_decode_bits(&bits),
        Cmd::Reset => cmd_reset(open_bus(&cli)?),
        Cmd::Status => cmd_status(open_bus(&cli)?),
        Cmd::Mine {
            ref midstate,
            ref residual,
            ref bits,
            interval_ms,
            timeout_s,
        } => cmd_mine(
            open_bus(&cli)?,
            &midstate,
            &residual,
            &bits,
            Duration::from_millis(interval_ms),
            Duration::from_secs(timeout_s),
        ),
    }
}

fn open_bus(cli: &Cli) -> Result<Box<dyn RegisterBus>> {
    if cli.sim {
        // A search the simulator completes at the default cadence.
        Ok(Box::new(
            SimulatedMiner::new()
                .with_golden_nonce(0x0001_0000)
                .with_nonces_per_tick(0x1000),
        ))
    } else {
        let bank = MmioBank::map(cli.base_addr)
            .context("cannot map the core's register window (needs /dev/mem access)")?;
        Ok(Box::new(bank))
    }
}

fn cmd_decode_bits(bits: &str) -> Result<()> {
    let compact = parse_u32(bits)?;
    let target = difficulty::decode(compact)?;
    println!("bits:   {compact:#010x}");
    println!("target: {target}");
    Ok(())
}

fn cmd_reset(bus: Box<dyn RegisterBus>) -> Result<()> {
    let mut session = MiningSession::new(bus);
    session.reset()?;
    println!("reset pulse issued");
    Ok(())
}

fn cmd_status(mut bus: Box<dyn RegisterBus>) -> Result<()> {
    let status = StatusReporter::new().snapshot(&mut bus)?;
    println!("current nonce: {:#010x}", status.current_nonce);
    println!("found:         {}", status.found);
    println!("not found:     {}", status.not_found);
    if status.found {
        println!("golden nonce:  {:#010x}", status.golden_nonce);
    }
    Ok(())
}

fn cmd_mine(
    bus: Box<dyn RegisterBus>,
    midstate: &str,
    residual: &str,
    bits: &str,
    interval: Duration,
    timeout: Duration,
) -> Result<()> {
    let midstate = parse_words(midstate).context("bad --midstate")?;
    let residual = parse_words(residual).context("bad --residual")?;
    let compact = parse_u32(bits)?;
    let params = MiningParameters::from_compact_bits(midstate, residual, compact)?;
    println!("target: {}", params.target());

    let mut session = MiningSession::new(bus);
    session.reset()?;
    session.load_parameters(&params)?;
    session.start()?;

    let deadline = Instant::now() + timeout;
    loop {
        match session.poll()? {
            PollOutcome::Found { golden_nonce } => {
                println!("golden nonce: {golden_nonce:#010x} ({golden_nonce})");
                break;
            }
            PollOutcome::Exhausted => {
                println!("nonce space exhausted, no solution");
                break;
            }
            PollOutcome::Pending { current_nonce } => {
                if session.polls() % 10 == 0 {
                    println!("current nonce: {current_nonce:#010x}");
                }
            }
        }
        if Instant::now() >= deadline {
            session.mark_timed_out()?;
            println!("deadline reached after {} polls", session.polls());
            break;
        }
        thread::sleep(interval);
    }

    session.stop()?;
    Ok(())
}

fn parse_u64(s: &str) -> Result<u64, String> {
    let trimmed = s.trim();
    let parsed = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        trimmed.parse()
    };
    parsed.map_err(|e| format!("invalid number {trimmed:?}: {e}"))
}

fn parse_u32(s: &str) -> Result<u32> {
    let value = parse_u64(s).map_err(anyhow::Error::msg)?;
    if value > u64::from(u32::MAX) {
        bail!("{s:?} does not fit in 32 bits");
    }
    #[allow(clippy::cast_possible_truncation)]
    Ok(value as u32)
}

fn parse_words(s: &str) -> Result<Vec<u32>> {
    s.split(',').map(|word| parse_u32(word)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_u32("0x1D00FFFF").unwrap(), 0x1D00_FFFF);
        assert_eq!(parse_u32("42").unwrap(), 42);
        assert!(parse_u32("0x100000000").is_err());
    }

    #[test]
    fn parses_word_lists() {
        let words = parse_words("0x1,0x2,3").unwrap();
        assert_eq!(words, vec![1, 2, 3]);
        assert!(parse_words("0x1,bogus").is_err());
    }
}
