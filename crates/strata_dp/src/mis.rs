//! Matching-based batch improvement ("mis" pass).
//!
//! Bins movable single-height candidates into a uniform spatial grid sized
//! from the average cell pitch, gathers same/neighbor-bucket candidates
//! filtered by size-class compatibility into bounded groups, and solves a
//! small assignment problem per group over the group's current slots,
//! minimizing a combined wirelength + displacement cost. Small groups are
//! solved exactly by permutation search, larger ones greedily; equal-cost
//! assignments are broken by the caller-supplied seeded RNG so runs stay
//! reproducible. Each winning assignment is committed as one conflict-free
//! manager transaction.

use crate::hpwl::cell_half_perimeter_at;
use crate::mgr::SegmentMgr;
use crate::objective::Objective;
use crate::proposal::{CellState, MoveEntry, MoveProposal};
use rand::Rng;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use strata_net::{Cell, CellId, Mobility, Netlist};

/// Weight of the displacement term in the slot-cost mix.
const DISP_WEIGHT: f64 = 0.1;

/// Group sizes up to this bound are solved by exact permutation search.
const EXACT_GROUP_LIMIT: usize = 5;

/// Cost difference below which two assignments count as tied.
const COST_EPSILON: f64 = 1e-9;

/// Spatial bucket width, in multiples of the average candidate width.
const BUCKET_WIDTH_FACTOR: i64 = 4;

/// Parameters of the matching pass.
pub struct MisParams {
    /// Number of passes over the candidate population.
    pub passes: usize,
    /// Relative improvement below which remaining passes are skipped.
    pub tolerance: f64,
}

impl Default for MisParams {
    fn default() -> Self {
        Self {
            passes: 1,
            tolerance: 0.0,
        }
    }
}

/// Runs the matching optimizer for up to `params.passes` passes.
///
/// Stops early when a pass no longer improves the wirelength objective by
/// more than the relative tolerance.
pub fn run_mis(
    mgr: &mut SegmentMgr,
    rng: &mut impl Rng,
    params: &MisParams,
    sink: &DiagnosticSink,
) {
    let mut objective = Objective::hpwl(mgr.netlist(), mgr.config());
    let mut current = objective.curr(mgr.netlist());

    for pass in 0..params.passes {
        let (delta, swapped) = run_mis_pass(mgr, &mut objective, rng);
        sink.emit(
            Diagnostic::note(
                DiagnosticCode::new(Category::Pass, 101),
                format!("matching pass {pass}: {swapped} cells exchanged, cost delta {delta:.1}"),
            )
            .with_pass("mis"),
        );
        let improvement = -delta;
        if improvement <= 0.0 {
            break;
        }
        if current > 0.0 && improvement / current <= params.tolerance {
            break;
        }
        current += delta;
    }
}

fn run_mis_pass(
    mgr: &mut SegmentMgr,
    objective: &mut Objective,
    rng: &mut impl Rng,
) -> (f64, usize) {
    let candidates = mis_candidates(mgr);
    if candidates.len() < 2 {
        return (0.0, 0);
    }

    let nl = mgr.netlist();
    let avg_width = (candidates.iter().map(|&c| nl.cell(c).width).sum::<i64>()
        / candidates.len() as i64)
        .max(1);
    let bucket_w = avg_width * BUCKET_WIDTH_FACTOR;
    let bucket_h = mgr.arch().rows[0].height.max(1);

    let mut buckets: HashMap<(i64, i64), Vec<CellId>> = HashMap::new();
    for &c in &candidates {
        buckets
            .entry(bucket_of(nl.cell(c), bucket_w, bucket_h))
            .or_default()
            .push(c);
    }

    // Gather per-cell compatible neighborhoods in parallel over the disjoint
    // candidate partition; group formation below stays sequential.
    let neighborhoods: Vec<(CellId, Vec<CellId>)> = candidates
        .par_iter()
        .map(|&c| {
            let (bx, by) = bucket_of(nl.cell(c), bucket_w, bucket_h);
            let mut near = Vec::new();
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if let Some(list) = buckets.get(&(bx + dx, by + dy)) {
                        near.extend(
                            list.iter()
                                .copied()
                                .filter(|&o| o != c && compatible(nl, c, o)),
                        );
                    }
                }
            }
            (c, near)
        })
        .collect();

    let max_group = mgr.config().max_group_size;
    let mut used: HashSet<CellId> = HashSet::new();
    let mut total_delta = 0.0;
    let mut swapped = 0;

    for (anchor, near) in neighborhoods {
        if used.contains(&anchor) {
            continue;
        }
        let mut group = vec![anchor];
        for other in near {
            if group.len() >= max_group {
                break;
            }
            if !used.contains(&other) {
                group.push(other);
            }
        }
        if group.len() < 2 {
            continue;
        }

        let states: Vec<CellState> = group.iter().map(|&c| mgr.cell_state(c)).collect();
        let skip = mgr.config().skip_fanout_above;
        let costs: Vec<Vec<f64>> = group
            .iter()
            .map(|&c| {
                let cur = mgr.netlist().cell(c);
                states
                    .iter()
                    .map(|s| {
                        cell_half_perimeter_at(mgr.netlist(), c, s.x, s.y, skip)
                            + DISP_WEIGHT * ((s.x - cur.x).abs() + (s.y - cur.y).abs()) as f64
                    })
                    .collect()
            })
            .collect();

        let assignment = solve_assignment(&costs, rng);
        let moved: Vec<usize> = (0..group.len()).filter(|&i| assignment[i] != i).collect();
        used.extend(group.iter().copied());
        if moved.is_empty() || moved.len() > mgr.config().move_limit {
            continue;
        }

        let mut proposal = MoveProposal::new();
        for &i in &moved {
            let target = &states[assignment[i]];
            proposal.push(MoveEntry {
                cell: group[i],
                old: states[i].clone(),
                new: CellState {
                    orient: states[i].orient,
                    ..target.clone()
                },
            });
        }

        let delta = objective.delta(mgr.netlist(), &proposal);
        if delta > 0.0 {
            continue;
        }
        if mgr.stage(proposal).is_err() {
            continue;
        }
        if mgr.accept_move().is_ok() {
            total_delta += delta;
            swapped += moved.len();
        }
    }
    (total_delta, swapped)
}

/// Movable, fully mobile, single-height cells currently mapped to a segment.
fn mis_candidates(mgr: &SegmentMgr) -> Vec<CellId> {
    mgr.netlist()
        .cells
        .iter()
        .filter(|c| c.mobility == Mobility::Movable)
        .map(|c| c.id)
        .filter(|&id| mgr.segments_of_cell(id).len() == 1)
        .collect()
}

fn bucket_of(cell: &Cell, bucket_w: i64, bucket_h: i64) -> (i64, i64) {
    (cell.x.div_euclid(bucket_w), cell.y.div_euclid(bucket_h))
}

/// Size-class compatibility: two cells may exchange slots only when their
/// footprint, region, and edge profile are interchangeable.
fn compatible(netlist: &Netlist, a: CellId, b: CellId) -> bool {
    let ca = netlist.cell(a);
    let cb = netlist.cell(b);
    ca.mobility == Mobility::Movable
        && cb.mobility == Mobility::Movable
        && ca.width == cb.width
        && ca.height == cb.height
        && ca.region == cb.region
        && ca.edge_left == cb.edge_left
        && ca.edge_right == cb.edge_right
}

/// Minimizes the total assignment cost of cells onto the group's slots.
fn solve_assignment(costs: &[Vec<f64>], rng: &mut impl Rng) -> Vec<usize> {
    if costs.len() <= EXACT_GROUP_LIMIT {
        solve_exact(costs, rng)
    } else {
        solve_greedy(costs, rng)
    }
}

/// Exhaustive permutation search; ties broken by a seeded RNG draw.
fn solve_exact(costs: &[Vec<f64>], rng: &mut impl Rng) -> Vec<usize> {
    let k = costs.len();
    let mut perm: Vec<usize> = (0..k).collect();
    let mut best: Vec<Vec<usize>> = Vec::new();
    let mut best_cost = f64::INFINITY;

    permute(&mut perm, 0, &mut |p: &[usize]| {
        let total: f64 = p.iter().enumerate().map(|(i, &j)| costs[i][j]).sum();
        if total < best_cost - COST_EPSILON {
            best_cost = total;
            best.clear();
            best.push(p.to_vec());
        } else if (total - best_cost).abs() <= COST_EPSILON {
            best.push(p.to_vec());
        }
    });

    let pick = rng.gen_range(0..best.len());
    best.swap_remove(pick)
}

fn permute(perm: &mut Vec<usize>, start: usize, visit: &mut impl FnMut(&[usize])) {
    if start == perm.len() {
        visit(perm);
        return;
    }
    for i in start..perm.len() {
        perm.swap(start, i);
        permute(perm, start + 1, visit);
        perm.swap(start, i);
    }
}

/// Greedy assignment in a randomized processing order, cheapest free slot
/// first; equal-cost slots are broken by the RNG.
fn solve_greedy(costs: &[Vec<f64>], rng: &mut impl Rng) -> Vec<usize> {
    let k = costs.len();
    let mut order: Vec<usize> = (0..k).collect();
    for i in (1..k).rev() {
        order.swap(i, rng.gen_range(0..=i));
    }

    let mut assignment = vec![0; k];
    let mut taken = vec![false; k];
    for &i in &order {
        let mut ties: Vec<usize> = Vec::new();
        let mut best_cost = f64::INFINITY;
        for (j, &occupied) in taken.iter().enumerate() {
            if occupied {
                continue;
            }
            if costs[i][j] < best_cost - COST_EPSILON {
                best_cost = costs[i][j];
                ties.clear();
                ties.push(j);
            } else if (costs[i][j] - best_cost).abs() <= COST_EPSILON {
                ties.push(j);
            }
        }
        let j = ties[rng.gen_range(0..ties.len())];
        assignment[i] = j;
        taken[j] = true;
    }
    assignment
}
