//! # Main — CLI Entry Point
//!
//! Thin front-end over the library: parses x (plain digits or `1e15`-style
//! scientific notation), configures the Rayon thread pool and structured
//! logging, dispatches to π(x) / φ(x, a) / A + C, and prints the result
//! (optionally as a JSON record).
//!
//! ## Options
//!
//! - `--threads`: worker count (default: all logical cores).
//! - `--alpha`: Deléglise–Rivat tuning factor override.
//! - `--phi A`: compute φ(x, A) instead of π(x).
//! - `--ac`: compute Gourdon's A + C formulas instead of π(x).
//! - `--phi-cache-megabytes`: per-thread φ cache budget (default 16).
//! - `--json` / `--time`: machine-readable output / timing to stderr.
//!
//! Exit code 0 on success, non-zero on invalid input or out-of-range x.

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use deepcount::imath::{iroot, isqrt128};
use deepcount::tuning::{get_alpha_y, get_alpha_z};
use tracing::warn;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "deepcount", about = "Count the primes below x, exactly", version)]
struct Cli {
    /// Upper bound x: plain digits or scientific notation (e.g. 1e15)
    x: String,

    /// Number of worker threads (defaults to all logical cores)
    #[arg(long, short = 't')]
    threads: Option<usize>,

    /// Override the Deleglise-Rivat alpha tuning factor (clamped to its
    /// valid range; affects speed and memory, never the result)
    #[arg(long)]
    alpha: Option<f64>,

    /// Compute phi(x, A) — the count of integers <= x with no prime factor
    /// among the first A primes — instead of pi(x)
    #[arg(long, value_name = "A")]
    phi: Option<i64>,

    /// Compute Gourdon's A + C formulas instead of pi(x)
    #[arg(long)]
    ac: bool,

    /// Per-thread phi cache budget in mebibytes
    #[arg(long, default_value_t = 16)]
    phi_cache_megabytes: u64,

    /// Print the result as a JSON record
    #[arg(long)]
    json: bool,

    /// Print elapsed seconds to stderr
    #[arg(long)]
    time: bool,
}

#[derive(serde::Serialize)]
struct Record {
    function: &'static str,
    x: String,
    result: String,
    threads: usize,
    seconds: f64,
}

/// Parse "123456", "1e15" or "2.5e10" into an exact u128.
fn parse_x(s: &str) -> Result<u128> {
    let s = s.trim();
    if let Some((mantissa, exponent)) = s.split_once(['e', 'E']) {
        let exp: u32 = exponent
            .parse()
            .with_context(|| format!("invalid exponent in '{}'", s))?;
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = format!("{}{}", int_part, frac_part);
        let value: u128 = digits
            .parse()
            .with_context(|| format!("invalid mantissa in '{}'", s))?;
        let shift = exp
            .checked_sub(frac_part.len() as u32)
            .with_context(|| format!("'{}' is not an integer", s))?;
        10u128
            .checked_pow(shift)
            .and_then(|p| value.checked_mul(p))
            .with_context(|| format!("'{}' overflows 128 bits", s))
    } else {
        s.parse()
            .with_context(|| format!("invalid number '{}'", s))
    }
}

fn configure_rayon(threads: usize) {
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!(error = %e, "could not configure rayon thread pool");
    }
}

fn main() -> Result<()> {
    // Structured logging: LOG_FORMAT=json for machines, human-readable on
    // stderr otherwise; RUST_LOG selects the level (default info, set
    // RUST_LOG=debug for per-phase intermediate results)
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter())
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let threads = cli.threads.unwrap_or_else(num_threads_default);
    configure_rayon(threads);
    let x = parse_x(&cli.x)?;

    let time = Instant::now();
    let (function, result): (&'static str, String) = if let Some(a) = cli.phi {
        let x: i64 = x
            .try_into()
            .map_err(|_| anyhow::anyhow!("phi(x, a) requires x <= {}", i64::MAX))?;
        let r = deepcount::phi::phi_with_cache_budget(x, a, threads, cli.phi_cache_megabytes);
        ("phi", r.to_string())
    } else if cli.ac {
        if x > deepcount::MAX_PI_X {
            bail!("x = {} exceeds the supported maximum {}", x, deepcount::MAX_PI_X);
        }
        let x = x as i128;
        let alpha_y = cli.alpha.unwrap_or_else(|| get_alpha_y(x));
        let y = (alpha_y * iroot::<3>(x as u128) as f64) as i64;
        let y = y.max(1);
        let z = ((get_alpha_z(alpha_y) * y as f64) as i64).max(y);
        let k = deepcount::phi_tiny::get_c(isqrt128(x));
        let r = deepcount::gourdon::ac(x, y, z, k, threads);
        ("A+C", r.to_string())
    } else if let Some(alpha) = cli.alpha {
        if x > deepcount::MAX_PI_X {
            bail!("x = {} exceeds the supported maximum {}", x, deepcount::MAX_PI_X);
        }
        let r = deepcount::deleglise_rivat::pi_deleglise_rivat_with_alpha(x as i128, alpha, threads);
        ("pi", r.to_string())
    } else {
        let r = deepcount::pi(x, threads)?;
        ("pi", r.to_string())
    };
    let seconds = time.elapsed().as_secs_f64();

    if cli.json {
        let record = Record {
            function,
            x: x.to_string(),
            result: result.clone(),
            threads,
            seconds,
        };
        println!("{}", serde_json::to_string(&record)?);
    } else {
        println!("{}", result);
    }
    if cli.time {
        eprintln!("Seconds: {:.3}", seconds);
    }
    Ok(())
}

fn num_threads_default() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_digits() {
        assert_eq!(parse_x("0").unwrap(), 0);
        assert_eq!(parse_x("123456789").unwrap(), 123_456_789);
    }

    #[test]
    fn parse_scientific() {
        assert_eq!(parse_x("1e15").unwrap(), 10u128.pow(15));
        assert_eq!(parse_x("2E6").unwrap(), 2_000_000);
        assert_eq!(parse_x("2.5e10").unwrap(), 25_000_000_000);
        assert_eq!(parse_x("1.25e4").unwrap(), 12_500);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_x("abc").is_err());
        assert!(parse_x("1.5e0").is_err()); // not an integer
        assert!(parse_x("1e40").is_err()); // overflows u128
        assert!(parse_x("-5").is_err());
    }
}
