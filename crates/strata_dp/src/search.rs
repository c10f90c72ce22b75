//! Randomized local search ("default" pass).
//!
//! The outer loop draws candidates for a configured per-candidate move
//! budget, asks each configured generator for a proposal, scores it with the
//! configured objectives combined through the cost expression, stages it
//! through the manager, and accepts it iff the combined delta does not exceed
//! the tolerance. Rejected and infeasible candidates are counted and
//! reported; the manager guarantees a rejected move leaves no trace.

use crate::cost_expr::CostExpr;
use crate::generator::Generator;
use crate::mgr::SegmentMgr;
use crate::objective::Objective;
use rand::Rng;
use std::collections::HashMap;
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use strata_net::CellId;

/// Parameters of the random-search pass.
pub struct SearchParams {
    /// Number of passes over the candidate population.
    pub passes: usize,
    /// Maximum allowed combined cost delta for acceptance.
    pub tolerance: f64,
    /// Proposal budget per candidate per pass.
    pub moves_per_candidate: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            passes: 1,
            tolerance: 0.0,
            moves_per_candidate: 20,
        }
    }
}

/// Per-pass counters reported through the sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Proposals produced by the generators.
    pub attempted: usize,
    /// Proposals committed.
    pub accepted: usize,
    /// Proposals staged and then discarded on cost.
    pub rejected: usize,
    /// Candidates with no legal proposal (generator gave up or stage failed).
    pub infeasible: usize,
    /// Accepted proposals that exchanged two or more cells.
    pub swaps: usize,
}

/// Runs the random-search optimizer.
pub fn run_search(
    mgr: &mut SegmentMgr,
    generators: &mut [Generator],
    objectives: &mut [Objective],
    expr: &CostExpr,
    rng: &mut impl Rng,
    params: &SearchParams,
    sink: &DiagnosticSink,
) -> SearchStats {
    let mut stats = SearchStats::default();
    let candidates: Vec<CellId> = mgr
        .netlist()
        .cells
        .iter()
        .filter(|c| c.is_movable())
        .map(|c| c.id)
        .filter(|&id| !mgr.segments_of_cell(id).is_empty())
        .collect();
    if candidates.is_empty() || generators.is_empty() {
        return stats;
    }

    for pass in 0..params.passes {
        let budget = params.moves_per_candidate * candidates.len();
        for _ in 0..budget {
            for generator in generators.iter_mut() {
                let Some(proposal) = generator.propose(rng, mgr, &candidates) else {
                    stats.infeasible += 1;
                    continue;
                };
                stats.attempted += 1;

                let mut values: HashMap<&str, f64> = HashMap::new();
                for objective in objectives.iter_mut() {
                    values.insert(objective.name(), objective.delta(mgr.netlist(), &proposal));
                }
                let Ok(total) = expr.eval(&values) else {
                    stats.rejected += 1;
                    continue;
                };

                let is_swap = proposal.len() >= 2;
                if mgr.stage(proposal).is_err() {
                    stats.infeasible += 1;
                    continue;
                }
                if total <= params.tolerance {
                    if mgr.accept_move().is_ok() {
                        stats.accepted += 1;
                        if is_swap {
                            stats.swaps += 1;
                        }
                    }
                } else {
                    mgr.reject_move();
                    stats.rejected += 1;
                }
            }
        }
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Pass, 201),
                format!(
                    "search pass {pass}: {} attempted, {} accepted, {} rejected, {} infeasible, {} swaps",
                    stats.attempted, stats.accepted, stats.rejected, stats.infeasible, stats.swaps
                ),
            )
            .with_pass("default"),
        );
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::testutil::place_connected_cells;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use strata_diagnostics::DiagnosticSink;

    fn run_hpwl_search(
        mgr: &mut SegmentMgr,
        params: &SearchParams,
        seed: u64,
    ) -> (SearchStats, f64, f64) {
        let mut generators = vec![Generator::from_name("rng", mgr.config()).unwrap()];
        let mut objectives = vec![Objective::hpwl(mgr.netlist(), &EngineConfig::default())];
        let expr = CostExpr::hpwl();
        let before = objectives[0].curr(mgr.netlist());
        let mut rng = StdRng::seed_from_u64(seed);
        let sink = DiagnosticSink::new();
        let stats = run_search(
            mgr,
            &mut generators,
            &mut objectives,
            &expr,
            &mut rng,
            params,
            &sink,
        );
        let after = objectives[0].curr(mgr.netlist());
        (stats, before, after)
    }

    #[test]
    fn pure_hpwl_search_never_worsens_cost() {
        let (mut mgr, _) = place_connected_cells(&[10, 42, 74]);
        let (stats, before, after) = run_hpwl_search(&mut mgr, &SearchParams::default(), 11);
        assert!(after <= before, "cost rose from {before} to {after}");
        assert!(
            stats.attempted >= stats.accepted + stats.rejected,
            "attempt accounting out of balance: {stats:?}"
        );
        assert!(mgr.run_audits().is_clean());
    }

    #[test]
    fn search_leaves_placement_legal() {
        let (mut mgr, _) = place_connected_cells(&[10, 26, 42, 58, 74, 90]);
        let params = SearchParams {
            passes: 2,
            ..SearchParams::default()
        };
        run_hpwl_search(&mut mgr, &params, 23);
        assert!(mgr.run_audits().is_clean());
    }

    #[test]
    fn empty_candidate_set_is_a_no_op() {
        let arch = crate::testutil::single_row_arch();
        let netlist = strata_net::Netlist::new();
        let sink = DiagnosticSink::new();
        let mut mgr = SegmentMgr::setup(arch, netlist, EngineConfig::default(), &sink).unwrap();
        let (stats, _, _) = run_hpwl_search(&mut mgr, &SearchParams::default(), 1);
        assert_eq!(stats, SearchStats::default());
    }

    #[test]
    fn combined_cost_expression_drives_acceptance() {
        let (mut mgr, _) = place_connected_cells(&[10, 42, 74]);
        let mut generators = vec![Generator::from_name("rng", mgr.config()).unwrap()];
        let mut objectives = vec![
            Objective::hpwl(mgr.netlist(), &EngineConfig::default()),
            Objective::displacement(mgr.netlist()),
        ];
        let expr = CostExpr::parse("(hpwl)(1.0)(*)(disp)(+)").unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let sink = DiagnosticSink::new();
        let stats = run_search(
            &mut mgr,
            &mut generators,
            &mut objectives,
            &expr,
            &mut rng,
            &SearchParams::default(),
            &sink,
        );
        assert!(stats.attempted >= stats.accepted + stats.rejected);
        assert!(mgr.run_audits().is_clean());
    }

    #[test]
    fn stats_reported_once_per_pass() {
        let (mut mgr, _) = place_connected_cells(&[10, 42]);
        let mut generators = vec![Generator::from_name("rng", mgr.config()).unwrap()];
        let mut objectives = vec![Objective::hpwl(mgr.netlist(), &EngineConfig::default())];
        let expr = CostExpr::hpwl();
        let mut rng = StdRng::seed_from_u64(5);
        let sink = DiagnosticSink::new();
        let params = SearchParams {
            passes: 3,
            ..SearchParams::default()
        };
        run_search(
            &mut mgr,
            &mut generators,
            &mut objectives,
            &expr,
            &mut rng,
            &params,
            &sink,
        );
        assert_eq!(sink.diagnostics().len(), 3);
    }
}
