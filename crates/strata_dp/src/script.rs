//! Pass-script orchestration.
//!
//! A pass script is a semicolon-separated list of commands, e.g.
//! `"mis -p 10 -t 0.01 ; default -p 5 -f 20 -gen rng -obj hpwl -cost (hpwl)"`.
//! Each command names a pass (`mis` or `default`) with optional flags.
//! Unknown pass names are logged and skipped; unknown flags or bad values
//! fall back to defaults with a warning. Nothing in a script is ever fatal.
//! All five legality audits run immediately before and after every command
//! for regression visibility, one sink line per audit per boundary.

use crate::cost_expr::CostExpr;
use crate::generator::Generator;
use crate::mgr::SegmentMgr;
use crate::mis::{run_mis, MisParams};
use crate::objective::Objective;
use crate::search::{run_search, SearchParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::str::FromStr;
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// One parsed pass command.
#[derive(Debug, Clone, PartialEq)]
pub struct PassCommand {
    /// The pass name (first token).
    pub name: String,
    /// `-p`: number of passes.
    pub passes: usize,
    /// `-t`: acceptance / early-stop tolerance.
    pub tolerance: f64,
    /// `-f`: proposal budget per candidate.
    pub moves_per_candidate: usize,
    /// `-gen`: generator names (may repeat).
    pub generators: Vec<String>,
    /// `-obj`: objective names (may repeat).
    pub objectives: Vec<String>,
    /// `-cost`: cost expression text.
    pub cost: String,
}

impl PassCommand {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passes: 1,
            tolerance: 0.0,
            moves_per_candidate: 20,
            generators: Vec::new(),
            objectives: Vec::new(),
            cost: "(hpwl)".to_string(),
        }
    }
}

/// Parses a semicolon-separated pass script.
///
/// Tolerant by design: bad flag values default with a warning, unknown flags
/// are skipped with a warning, empty commands are ignored.
pub fn parse_script(script: &str, sink: &DiagnosticSink) -> Vec<PassCommand> {
    script
        .split(';')
        .filter_map(|chunk| parse_command(chunk, sink))
        .collect()
}

fn parse_command(chunk: &str, sink: &DiagnosticSink) -> Option<PassCommand> {
    let tokens: Vec<&str> = chunk.split_whitespace().collect();
    let (&name, mut rest) = tokens.split_first()?;
    let mut cmd = PassCommand::new(name);

    while let Some((&flag, after)) = rest.split_first() {
        rest = after;
        let value = rest.first().copied();
        match flag {
            "-p" => cmd.passes = take_flag_value(&mut rest, flag, value, cmd.passes, sink),
            "-t" => cmd.tolerance = take_flag_value(&mut rest, flag, value, cmd.tolerance, sink),
            "-f" => {
                cmd.moves_per_candidate =
                    take_flag_value(&mut rest, flag, value, cmd.moves_per_candidate, sink)
            }
            "-gen" => {
                if let Some(v) = value {
                    cmd.generators.push(v.to_string());
                    rest = &rest[1..];
                } else {
                    warn_flag(sink, flag, "missing value");
                }
            }
            "-obj" => {
                if let Some(v) = value {
                    cmd.objectives.push(v.to_string());
                    rest = &rest[1..];
                } else {
                    warn_flag(sink, flag, "missing value");
                }
            }
            "-cost" => {
                if let Some(v) = value {
                    cmd.cost = v.to_string();
                    rest = &rest[1..];
                } else {
                    warn_flag(sink, flag, "missing value");
                }
            }
            other => {
                warn_flag(sink, other, "unknown flag, using defaults");
                // Swallow a following value token so it is not read as a flag.
                if value.map_or(false, |v| !v.starts_with('-')) {
                    rest = &rest[1..];
                }
            }
        }
    }
    Some(cmd)
}

/// Parses a flag value, consuming it from the token stream; on a missing or
/// malformed value the default is kept and a warning is emitted.
fn take_flag_value<T: FromStr + Copy>(
    rest: &mut &[&str],
    flag: &str,
    value: Option<&str>,
    default: T,
    sink: &DiagnosticSink,
) -> T {
    match value {
        Some(text) => {
            *rest = &rest[1..];
            match text.parse() {
                Ok(parsed) => parsed,
                Err(_) => {
                    warn_flag(sink, flag, &format!("bad value '{text}', using default"));
                    default
                }
            }
        }
        None => {
            warn_flag(sink, flag, "missing value, using default");
            default
        }
    }
}

fn warn_flag(sink: &DiagnosticSink, flag: &str, reason: &str) {
    sink.emit(Diagnostic::warning(
        DiagnosticCode::new(Category::Warning, 20),
        format!("flag '{flag}': {reason}"),
    ));
}

/// Runs a pass script against the manager with a seeded RNG.
///
/// Dispatches `mis` to the matching optimizer and `default` to the
/// random-search optimizer; anything else is a warning and a no-op. Audits
/// run around every command.
pub fn run_script(mgr: &mut SegmentMgr, script: &str, seed: u64, sink: &DiagnosticSink) {
    let mut rng = StdRng::seed_from_u64(seed);
    for cmd in parse_script(script, sink) {
        emit_audits(mgr, &cmd.name, "before", sink);
        match cmd.name.as_str() {
            "mis" => {
                let params = MisParams {
                    passes: cmd.passes,
                    tolerance: cmd.tolerance,
                };
                run_mis(mgr, &mut rng, &params, sink);
            }
            "default" => run_default_pass(mgr, &cmd, &mut rng, sink),
            other => {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Warning, 21),
                        format!("unknown pass '{other}', skipping"),
                    )
                    .with_pass(other),
                );
            }
        }
        emit_audits(mgr, &cmd.name, "after", sink);
    }
}

fn run_default_pass(mgr: &mut SegmentMgr, cmd: &PassCommand, rng: &mut StdRng, sink: &DiagnosticSink) {
    let expr = match CostExpr::parse(&cmd.cost) {
        Ok(expr) => expr,
        Err(err) => {
            sink.emit(
                Diagnostic::warning(
                    DiagnosticCode::new(Category::Warning, 22),
                    format!("{err}, using (hpwl)"),
                )
                .with_pass("default"),
            );
            CostExpr::hpwl()
        }
    };

    // Objectives: the -obj flags plus every term the expression references.
    let mut names: Vec<String> = cmd.objectives.clone();
    for term in expr.terms() {
        if !names.iter().any(|n| n == term) {
            names.push(term.to_string());
        }
    }
    if names.is_empty() {
        names.push("hpwl".to_string());
    }
    let mut objectives: Vec<Objective> = Vec::new();
    for name in &names {
        match Objective::from_name(name, mgr.netlist(), mgr.config()) {
            Some(objective) => objectives.push(objective),
            None => {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Warning, 23),
                        format!("unknown objective '{name}', ignoring"),
                    )
                    .with_pass("default"),
                );
            }
        }
    }

    let mut generator_names = cmd.generators.clone();
    if generator_names.is_empty() {
        generator_names.push("rng".to_string());
    }
    let mut generators: Vec<Generator> = Vec::new();
    for name in &generator_names {
        match Generator::from_name(name, mgr.config()) {
            Some(generator) => generators.push(generator),
            None => {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Warning, 24),
                        format!("unknown generator '{name}', ignoring"),
                    )
                    .with_pass("default"),
                );
            }
        }
    }
    if generators.is_empty() {
        // Every configured name was unknown; fall back to the random generator.
        if let Some(generator) = Generator::from_name("rng", mgr.config()) {
            generators.push(generator);
        }
    }

    let params = SearchParams {
        passes: cmd.passes,
        tolerance: cmd.tolerance,
        moves_per_candidate: cmd.moves_per_candidate,
    };
    run_search(mgr, &mut generators, &mut objectives, &expr, rng, &params, sink);
}

fn emit_audits(mgr: &SegmentMgr, pass: &str, phase: &str, sink: &DiagnosticSink) {
    let report = mgr.run_audits();
    for (i, (name, count)) in report.entries().iter().enumerate() {
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Audit, (i + 1) as u16),
                format!("{phase} {pass}: {name}: {count} violations"),
            )
            .with_pass(pass),
        );
    }
}
