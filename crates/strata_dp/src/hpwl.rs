//! Half-perimeter wirelength objective.
//!
//! HPWL is the sum over nets of the bounding-box half-perimeter of pin
//! positions, the standard fast wirelength proxy. The incremental `delta`
//! uses a per-call traversal stamp so each net is evaluated at most once no
//! matter how many of its pins moved, and nets above a configurable fanout
//! threshold are skipped as an approximation.

use crate::proposal::MoveProposal;
use strata_net::{Net, Netlist};

/// Incremental half-perimeter wirelength evaluator.
///
/// Pure with respect to placement state: `delta` computes the signed cost
/// change of a candidate move from the proposal alone, with no side effects
/// on the netlist. The only internal state is the net traversal stamp.
pub struct HpwlObjective {
    skip_fanout_above: usize,
    stamp: Vec<u64>,
    counter: u64,
}

impl HpwlObjective {
    /// Creates an evaluator for the given netlist.
    pub fn new(netlist: &Netlist, skip_fanout_above: usize) -> Self {
        Self {
            skip_fanout_above,
            stamp: vec![0; netlist.net_count()],
            counter: 0,
        }
    }

    /// Total current HPWL over all nets below the fanout threshold.
    pub fn curr(&self, netlist: &Netlist) -> f64 {
        netlist
            .nets
            .iter()
            .filter(|net| net.pins.len() <= self.skip_fanout_above)
            .map(|net| net_half_perimeter(netlist, net, None))
            .sum()
    }

    /// Signed HPWL change of a candidate move.
    ///
    /// For every net touching a moved cell, recomputes the bounding box under
    /// old versus new terminal positions; the traversal stamp guarantees each
    /// net is visited once per call.
    pub fn delta(&mut self, netlist: &Netlist, proposal: &MoveProposal) -> f64 {
        self.counter += 1;
        let stamp = self.counter;

        let mut delta = 0.0;
        for entry in proposal.entries() {
            for pin_id in netlist.pins_of_cell(entry.cell) {
                let net_id = netlist.pin(pin_id).net;
                let slot = net_id.as_raw() as usize;
                if self.stamp[slot] == stamp {
                    continue;
                }
                self.stamp[slot] = stamp;
                let net = netlist.net(net_id);
                if net.pins.len() > self.skip_fanout_above {
                    continue;
                }
                delta += net_half_perimeter(netlist, net, Some(proposal))
                    - net_half_perimeter(netlist, net, None);
            }
        }
        delta
    }
}

/// Bounding-box half-perimeter of one net's pins.
///
/// With a proposal, pins of moved cells are evaluated at their proposed
/// position and orientation; everything else uses live positions.
fn net_half_perimeter(netlist: &Netlist, net: &Net, proposal: Option<&MoveProposal>) -> f64 {
    let mut min_x = i64::MAX;
    let mut max_x = i64::MIN;
    let mut min_y = i64::MAX;
    let mut max_y = i64::MIN;

    for &pin_id in &net.pins {
        let pin = netlist.pin(pin_id);
        let cell = netlist.cell(pin.cell);
        let (x, y) = match proposal.and_then(|p| p.new_state_of(pin.cell)) {
            Some(state) => pin.position_at(state.x, state.y, state.orient),
            None => pin.position_at(cell.x, cell.y, cell.orient),
        };
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    if min_x == i64::MAX {
        return 0.0;
    }
    (max_x - min_x + max_y - min_y) as f64
}

/// HPWL of the nets touching one cell, with that cell's pins evaluated at a
/// hypothetical center. Used by the matching optimizer's slot costs.
pub fn cell_half_perimeter_at(
    netlist: &Netlist,
    cell: strata_net::CellId,
    x: i64,
    y: i64,
    skip_fanout_above: usize,
) -> f64 {
    let mut seen = Vec::new();
    let mut total = 0.0;
    let orient = netlist.cell(cell).orient;

    for pin_id in netlist.pins_of_cell(cell) {
        let net_id = netlist.pin(pin_id).net;
        if seen.contains(&net_id) {
            continue;
        }
        seen.push(net_id);
        let net = netlist.net(net_id);
        if net.pins.len() > skip_fanout_above {
            continue;
        }

        let mut min_x = i64::MAX;
        let mut max_x = i64::MIN;
        let mut min_y = i64::MAX;
        let mut max_y = i64::MIN;
        for &p in &net.pins {
            let pin = netlist.pin(p);
            let (px, py) = if pin.cell == cell {
                pin.position_at(x, y, orient)
            } else {
                let c = netlist.cell(pin.cell);
                pin.position_at(c.x, c.y, c.orient)
            };
            min_x = min_x.min(px);
            max_x = max_x.max(px);
            min_y = min_y.min(py);
            max_y = max_y.max(py);
        }
        if min_x != i64::MAX {
            total += (max_x - min_x + max_y - min_y) as f64;
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::MoveEntry;
    use crate::testutil::place_connected_cells;
    use strata_arch::Orientation;

    #[test]
    fn curr_matches_geometry() {
        // Two cells at x = 10 and x = 50 joined by one center-pin net.
        let (mgr, _) = place_connected_cells(&[10, 50]);
        let objective = HpwlObjective::new(mgr.netlist(), 64);
        assert_eq!(objective.curr(mgr.netlist()), 40.0);
    }

    #[test]
    fn empty_netlist_has_zero_cost() {
        let (mgr, _) = place_connected_cells(&[10]);
        let objective = HpwlObjective::new(mgr.netlist(), 64);
        assert_eq!(objective.curr(mgr.netlist()), 0.0);
    }

    #[test]
    fn delta_matches_full_recompute() {
        let (mgr, cells) = place_connected_cells(&[10, 50]);
        let mut objective = HpwlObjective::new(mgr.netlist(), 64);

        let old = mgr.cell_state(cells[0]);
        let mut new = old.clone();
        new.x = 30;
        let mut proposal = MoveProposal::new();
        proposal.push(MoveEntry {
            cell: cells[0],
            old,
            new,
        });

        // Moving cell 0 from 10 to 30 shrinks the single net from 40 to 20.
        let delta = objective.delta(mgr.netlist(), &proposal);
        assert_eq!(delta, -20.0);
    }

    #[test]
    fn delta_is_side_effect_free() {
        let (mgr, cells) = place_connected_cells(&[10, 50]);
        let mut objective = HpwlObjective::new(mgr.netlist(), 64);

        let old = mgr.cell_state(cells[0]);
        let mut new = old.clone();
        new.x = 30;
        let mut proposal = MoveProposal::new();
        proposal.push(MoveEntry {
            cell: cells[0],
            old,
            new,
        });

        let first = objective.delta(mgr.netlist(), &proposal);
        let second = objective.delta(mgr.netlist(), &proposal);
        assert_eq!(first, second);
        assert_eq!(objective.curr(mgr.netlist()), 40.0); // unchanged
    }

    #[test]
    fn each_net_counted_once_for_swaps() {
        // Both endpoints of the same net move: the shared net must be
        // evaluated once, giving a delta of zero for a pure swap.
        let (mgr, cells) = place_connected_cells(&[10, 50]);
        let mut objective = HpwlObjective::new(mgr.netlist(), 64);

        let s0 = mgr.cell_state(cells[0]);
        let s1 = mgr.cell_state(cells[1]);
        let mut proposal = MoveProposal::new();
        proposal.push(MoveEntry {
            cell: cells[0],
            old: s0.clone(),
            new: s1.clone(),
        });
        proposal.push(MoveEntry {
            cell: cells[1],
            old: s1,
            new: s0,
        });
        assert_eq!(objective.delta(mgr.netlist(), &proposal), 0.0);
    }

    #[test]
    fn high_fanout_nets_skipped() {
        let (mgr, cells) = place_connected_cells(&[10, 30, 50]);
        // Threshold below the two-pin nets: everything is skipped.
        let mut objective = HpwlObjective::new(mgr.netlist(), 1);
        assert_eq!(objective.curr(mgr.netlist()), 0.0);

        let old = mgr.cell_state(cells[0]);
        let mut new = old.clone();
        new.x = 70;
        let mut proposal = MoveProposal::new();
        proposal.push(MoveEntry {
            cell: cells[0],
            old,
            new,
        });
        assert_eq!(objective.delta(mgr.netlist(), &proposal), 0.0);
    }

    #[test]
    fn orientation_affects_pin_positions() {
        let (mgr, cells) = place_connected_cells(&[10, 50]);
        let mut objective = HpwlObjective::new(mgr.netlist(), 64);

        // Flipping with center pins changes nothing.
        let old = mgr.cell_state(cells[0]);
        let mut new = old.clone();
        new.orient = Orientation::Fn;
        let mut proposal = MoveProposal::new();
        proposal.push(MoveEntry {
            cell: cells[0],
            old,
            new,
        });
        assert_eq!(objective.delta(mgr.netlist(), &proposal), 0.0);
    }

    #[test]
    fn cell_half_perimeter_at_hypothetical() {
        let (mgr, cells) = place_connected_cells(&[10, 50]);
        let at_current = cell_half_perimeter_at(mgr.netlist(), cells[0], 10, 5, 64);
        let at_closer = cell_half_perimeter_at(mgr.netlist(), cells[0], 40, 5, 64);
        assert_eq!(at_current, 40.0);
        assert_eq!(at_closer, 10.0);
    }
}
