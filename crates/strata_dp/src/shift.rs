//! Minimum-shift overlap removal.
//!
//! A deterministic per-segment safety net that resolves residual overlap by
//! shifting cells along their row, preserving the left-to-right order, with
//! minimal total displacement. The fixed-order problem is solved by cluster
//! merging with a median target, which is exactly optimal for total absolute
//! displacement; cluster positions are then snapped to the site grid and
//! clamped into the segment span.

use crate::ids::SegmentId;
use crate::mgr::{align_down, align_up, SegmentMgr};
use strata_arch::Row;

/// One cell's packing parameters inside a segment, left-to-right order.
struct ShiftItem {
    /// Current left edge.
    left: i64,
    /// Cell width.
    width: i64,
    /// Required gap to the previous cell (0 for the first).
    gap_before: i64,
}

impl SegmentMgr {
    /// Resolves any residual overlap in every segment by minimal-total-
    /// displacement shifting. Returns the total absolute displacement applied.
    ///
    /// Member order is preserved; positions are snapped to the site grid and
    /// kept inside the segment span. Intended as a safety net after passes
    /// that could introduce overlap through numerical edge cases.
    pub fn remove_overlap_minimum_shift(&mut self) -> i64 {
        let mut total = 0;
        for s in 0..self.segments().len() {
            let sid = SegmentId::from_raw(s as u32);
            total += self.shift_segment(sid);
        }
        total
    }

    fn shift_segment(&mut self, sid: SegmentId) -> i64 {
        let seg = self.segment(sid);
        if seg.len() < 2 {
            return 0;
        }
        let (x_min, x_max) = (seg.x_min, seg.x_max);
        let row = self.arch().row(seg.row).clone();
        let members = seg.cells().to_vec();

        let mut items = Vec::with_capacity(members.len());
        let mut prev_right_class = None;
        for &cid in &members {
            let cell = self.netlist().cell(cid);
            let gap_before = match prev_right_class {
                Some(prev) => self.arch().spacing.spacing(prev, cell.left_edge_class()),
                None => 0,
            };
            items.push(ShiftItem {
                left: cell.left(),
                width: cell.width,
                gap_before,
            });
            prev_right_class = Some(cell.right_edge_class());
        }

        let new_lefts = min_shift_positions(&items, x_min, x_max, &row);

        let mut moved = 0;
        for (&cid, &new_left) in members.iter().zip(new_lefts.iter()) {
            let cell = self.netlist_mut().cell_mut(cid);
            let new_x = new_left + cell.width / 2;
            moved += (new_x - cell.x).abs();
            cell.x = new_x;
        }
        moved
    }
}

/// A maximal run of cells packed back to back, positioned as one unit.
struct Cluster {
    /// Index of the first member in the item list.
    first: usize,
    /// Offset of each member's left edge from the cluster position.
    offsets: Vec<i64>,
    /// Total packed extent.
    span: i64,
    /// Each member's preferred cluster position (`desired left - offset`).
    targets: Vec<i64>,
    /// Chosen cluster position.
    x: i64,
}

impl Cluster {
    fn retarget(&mut self, lo: i64, hi: i64) {
        let mut sorted = self.targets.clone();
        sorted.sort_unstable();
        let median = sorted[(sorted.len() - 1) / 2];
        self.x = median.clamp(lo, (hi - self.span).max(lo));
    }
}

/// Computes order-preserving left-edge positions with minimal total absolute
/// displacement, subject to pairwise gaps and the `[x_min, x_max)` span.
fn min_shift_positions(items: &[ShiftItem], x_min: i64, x_max: i64, row: &Row) -> Vec<i64> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for (i, item) in items.iter().enumerate() {
        let mut cur = Cluster {
            first: i,
            offsets: vec![0],
            span: item.width,
            targets: vec![item.left],
            x: 0,
        };
        cur.retarget(x_min, x_max);

        while clusters.last().map_or(false, |prev| {
            prev.x + prev.span + items[cur.first].gap_before > cur.x
        }) {
            let Some(prev) = clusters.pop() else { break };
            let gap = items[cur.first].gap_before;
            let shift = prev.span + gap;
            let mut offsets = prev.offsets;
            offsets.extend(cur.offsets.iter().map(|o| o + shift));
            let mut targets = prev.targets;
            targets.extend(cur.targets.iter().map(|t| t - shift));
            cur = Cluster {
                first: prev.first,
                offsets,
                span: shift + cur.span,
                targets,
                x: 0,
            };
            cur.retarget(x_min, x_max);
        }
        clusters.push(cur);
    }

    // Snap clusters onto the site grid, sweeping left to right so that
    // snapping never reintroduces an overlap.
    let mut out = vec![0; items.len()];
    let mut prev_end: Option<i64> = None;
    for cluster in &clusters {
        let lo = match prev_end {
            Some(end) => align_up(end + items[cluster.first].gap_before, row),
            None => align_up(x_min, row),
        };
        let mut x = row.snap_to_site(cluster.x);
        if x + cluster.span > x_max {
            x = align_down(x_max - cluster.span, row);
        }
        if x < lo {
            x = lo;
        }
        for (k, offset) in cluster.offsets.iter().enumerate() {
            out[cluster.first + k] = x + offset;
        }
        prev_end = Some(x + cluster.span);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::place_cells;

    #[test]
    fn legal_segment_is_untouched() {
        let (mut mgr, cells) = place_cells(&[10, 30, 50]);
        let before: Vec<i64> = cells.iter().map(|&c| mgr.netlist().cell(c).x).collect();
        assert_eq!(mgr.remove_overlap_minimum_shift(), 0);
        let after: Vec<i64> = cells.iter().map(|&c| mgr.netlist().cell(c).x).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn two_cell_overlap_resolved_minimally() {
        // Width-8 cells overlapping by exactly one site (2 units):
        // [6, 14) and [12, 20).
        let (mut mgr, cells) = place_cells(&[10, 16]);
        let displaced = mgr.remove_overlap_minimum_shift();

        let a = mgr.netlist().cell(cells[0]);
        let b = mgr.netlist().cell(cells[1]);
        assert!(b.left() >= a.right(), "overlap not resolved");
        // Brute-force optimum for separating two cells by 2 units is a total
        // displacement of exactly 2, however it is split between them.
        assert_eq!(displaced, 2);
        assert_eq!(mgr.check_overlap(100), 0);
        assert_eq!(mgr.check_site_alignment(100), 0);
    }

    #[test]
    fn pile_up_at_segment_start_pushes_right() {
        // Both cells pinned at the left wall: [0, 8) twice.
        let (mut mgr, cells) = place_cells(&[4, 4]);
        mgr.remove_overlap_minimum_shift();
        let a = mgr.netlist().cell(cells[0]);
        let b = mgr.netlist().cell(cells[1]);
        assert_eq!(a.left(), 0);
        assert_eq!(b.left(), 8);
    }

    #[test]
    fn chain_overlap_resolved_in_order() {
        let (mut mgr, cells) = place_cells(&[10, 12, 14]);
        mgr.remove_overlap_minimum_shift();
        let lefts: Vec<i64> = cells
            .iter()
            .map(|&c| mgr.netlist().cell(c).left())
            .collect();
        assert!(lefts.windows(2).all(|w| w[1] >= w[0] + 8));
        assert_eq!(mgr.check_overlap(100), 0);
        assert_eq!(mgr.check_site_alignment(100), 0);
    }

    #[test]
    fn order_is_preserved() {
        let (mut mgr, _) = place_cells(&[10, 12, 14, 40, 41]);
        mgr.remove_overlap_minimum_shift();
        let seg = &mgr.segments()[0];
        let lefts: Vec<i64> = seg
            .cells()
            .iter()
            .map(|&c| mgr.netlist().cell(c).left())
            .collect();
        assert!(lefts.windows(2).all(|w| w[0] < w[1]));
    }
}
