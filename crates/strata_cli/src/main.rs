//! Strata CLI — the command-line interface for the detailed-placement engine.
//!
//! Provides `strata run`: load a design snapshot, run a pass script through
//! the engine, render diagnostics, and write final placements back out.

#![warn(missing_docs)]

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use strata_diagnostics::{DiagnosticSink, TextRenderer};
use strata_dp::{load_config, optimize, EngineConfig};
use strata_net::{load_snapshot, write_placement};

/// Strata — a row-based detailed-placement engine.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata detailed placement")]
pub struct Cli {
    /// Suppress all output except warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a pass script over a design snapshot.
    Run(RunArgs),
}

/// Arguments for the `strata run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to the design snapshot JSON (architecture + netlist).
    #[arg(short, long)]
    pub design: PathBuf,

    /// Semicolon-separated pass script.
    #[arg(short, long, default_value = "mis -p 1 ; default -p 1")]
    pub script: String,

    /// Path to a `strata.toml` engine configuration.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// RNG seed; equal seeds and inputs give equal results.
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Output path for the final placement records.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(ref args) => run(args, cli.quiet),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Runs the engine over a snapshot and reports diagnostics to stderr.
///
/// Returns the process exit code: nonzero when any error-severity
/// diagnostic was emitted. The fatal setup error surfaces as `Err`.
fn run(args: &RunArgs, quiet: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let snapshot = load_snapshot(&args.design)?;

    let sink = DiagnosticSink::new();
    let netlist = optimize(
        snapshot.arch,
        snapshot.netlist,
        &args.script,
        config,
        args.seed,
        &sink,
    )?;

    let renderer = if quiet {
        TextRenderer::quiet()
    } else {
        TextRenderer::new()
    };
    for line in renderer.render_all(&sink.take_all()) {
        eprintln!("{line}");
    }

    if let Some(output) = &args.output {
        write_placement(output, &netlist)?;
    }

    Ok(if sink.has_errors() { 1 } else { 0 })
}
