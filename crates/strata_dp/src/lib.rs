//! Detailed-placement engine for the Strata toolchain.
//!
//! This crate takes a legalized placement snapshot (from `strata_net`) and
//! iteratively improves a pluggable cost function through legality-preserving
//! local moves, without ever violating packing, alignment, or spacing
//! invariants at a commit boundary. The output is the same netlist with
//! improved cell positions, ready for write-back.
//!
//! # Pipeline
//!
//! 1. **Setup** — [`SegmentMgr::setup`] derives segments from rows and
//!    regions minus blockages and maps every movable cell to its segments
//! 2. **Passes** — the [`script`] orchestrator dispatches `mis` (matching)
//!    and `default` (random search) passes, auditing around each
//! 3. **Write-back** — the final netlist is extracted for the design
//!    database
//!
//! # Usage
//!
//! ```ignore
//! use strata_dp::{optimize, EngineConfig};
//!
//! let netlist = optimize(arch, netlist, "mis -p 10 ; default -p 5", config, 1, &sink)?;
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod config;
pub mod cost_expr;
pub mod generator;
pub mod hpwl;
pub mod ids;
pub mod mgr;
pub mod mis;
pub mod objective;
pub mod proposal;
pub mod script;
pub mod search;
pub mod segment;
mod shift;

#[cfg(test)]
pub(crate) mod testutil;

pub use audit::AuditReport;
pub use config::{load_config, load_config_from_str, ConfigError, EngineConfig};
pub use cost_expr::{CostExpr, CostExprError};
pub use generator::Generator;
pub use hpwl::HpwlObjective;
pub use ids::SegmentId;
pub use mgr::{MoveError, SegmentMgr, SetupError, TestFit};
pub use mis::MisParams;
pub use objective::Objective;
pub use proposal::{CellState, MoveEntry, MoveProposal};
pub use script::{parse_script, run_script, PassCommand};
pub use search::{SearchParams, SearchStats};
pub use segment::Segment;

use strata_arch::Architecture;
use strata_diagnostics::DiagnosticSink;
use strata_net::Netlist;

/// Runs the whole engine: setup, the pass script, and a final minimum-shift
/// overlap cleanup, returning the optimized netlist for write-back.
///
/// The seed drives every randomized decision, so equal inputs and seeds give
/// equal results. The only error is the fatal setup failure; everything else
/// is reported through the sink.
pub fn optimize(
    arch: Architecture,
    netlist: Netlist,
    script_text: &str,
    config: EngineConfig,
    seed: u64,
    sink: &DiagnosticSink,
) -> Result<Netlist, SetupError> {
    let mut mgr = SegmentMgr::setup(arch, netlist, config, sink)?;
    script::run_script(&mut mgr, script_text, seed, sink);
    mgr.remove_overlap_minimum_shift();
    Ok(mgr.into_netlist())
}
