/// Fourier BSDF command-line tool: inspect, validate, and extract
/// `SCATFUN` files as written by layered-material fitting tools.
///
/// # Command overview
///
/// ```text
/// fbsdf <COMMAND> [OPTIONS]
///
/// Commands:
///   inspect    Print header fields and section sizes without decoding the body
///   validate   Run every semantic check over every section
///   extract    Reduce the file to its first basis function and summarise it
///   help       Print help information
///
/// Global options:
///   -v, --verbose    Log decode decisions (same as RUST_LOG=debug)
///   -h, --help       Print help
///   -V, --version    Print version
/// ```
///
/// Inputs ending in `.zst` are decompressed on the fly.
///
/// # Exit codes
///
/// | Code | Meaning                                 |
/// |------|-----------------------------------------|
/// | 0    | Success                                 |
/// | 1    | Error (I/O failure, invalid file, etc.) |
///
/// All error details are written to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod cmd_extract;
mod cmd_inspect;
mod cmd_validate;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Fourier BSDF file tool.
#[derive(Parser)]
#[command(name = "fbsdf", version, about = "Fourier BSDF file tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log decode decisions at debug level. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    verbose: bool,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print header fields and per-section sizes.
    Inspect(InspectArgs),
    /// Check every section against the format's semantic rules.
    Validate(ValidateArgs),
    /// Read the first basis function and print a summary.
    Extract(ExtractArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `fbsdf inspect`.
///
/// Decodes the header, then walks the body with every section skipped, so
/// truncation is still reported but no section is materialised.
#[derive(clap::Args)]
pub struct InspectArgs {
    /// Path to the `.bsdf` (or `.bsdf.zst`) file.
    pub file: PathBuf,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `fbsdf validate`.
///
/// Starts from the lenient policy (or the strict one with `--strict`) and
/// tightens individual rules with the remaining flags.
///
/// ```text
/// ┌──────────────────────────┬──────────────────────────────────────────────┐
/// │ Flag                     │ Effect                                       │
/// ├──────────────────────────┼──────────────────────────────────────────────┤
/// │ --strict                 │ all three rules below                        │
/// │ --enforce-longest-series │ series longer than the header says fail      │
/// │ --no-duplicate-origin    │ a repeated 0.0 elevational sample fails      │
/// │ --no-clamp-cdf           │ CDF values outside [0, 1] fail               │
/// └──────────────────────────┴──────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidateArgs {
    /// Path to the `.bsdf` (or `.bsdf.zst`) file.
    pub file: PathBuf,

    /// Apply every optional rule.
    #[arg(long)]
    pub strict: bool,

    /// Reject series longer than the header's longest-series length.
    #[arg(long)]
    pub enforce_longest_series: bool,

    /// Reject a duplicated 0.0 elevational sample.
    #[arg(long)]
    pub no_duplicate_origin: bool,

    /// Reject out-of-range CDF values instead of clamping them.
    #[arg(long)]
    pub no_clamp_cdf: bool,
}

/// Arguments for `fbsdf extract`.
#[derive(clap::Args)]
pub struct ExtractArgs {
    /// Path to the `.bsdf` (or `.bsdf.zst`) file.
    pub file: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = match cli.command {
        Commands::Inspect(args) => cmd_inspect::run(&args),
        Commands::Validate(args) => cmd_validate::run(&args),
        Commands::Extract(args) => cmd_extract::run(&args),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
