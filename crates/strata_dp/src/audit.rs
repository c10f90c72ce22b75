//! Legality audits: non-blocking diagnostic scans over all segments.
//!
//! Each audit performs one linear scan over disjoint partitions (segments or
//! cells), run as a rayon map-reduce, and returns a violation count capped by
//! the configured ceiling. Audits never mutate state and are never
//! enforcement gates; the orchestrator runs all five before and after every
//! optimization pass.

use crate::mgr::SegmentMgr;
use crate::segment::Segment;
use rayon::prelude::*;

/// The result of one run of all five legality audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuditReport {
    /// Pairs of segment neighbors whose shapes overlap.
    pub overlap: usize,
    /// Pairs of segment neighbors closer than their required edge spacing.
    pub edge_spacing: usize,
    /// Segment members whose left edge is off the row's site grid.
    pub site_alignment: usize,
    /// Movable cells whose vertical span does not tile onto rows.
    pub row_alignment: usize,
    /// Cells in a segment of the wrong region, or in no segment at all.
    pub region_assignment: usize,
}

impl AuditReport {
    /// Sum of all five counts.
    pub fn total(&self) -> usize {
        self.overlap
            + self.edge_spacing
            + self.site_alignment
            + self.row_alignment
            + self.region_assignment
    }

    /// Returns `true` when no audit found a violation.
    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// The five counts with their report names, in audit order.
    pub fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("overlap", self.overlap),
            ("edge spacing", self.edge_spacing),
            ("site alignment", self.site_alignment),
            ("row alignment", self.row_alignment),
            ("region assignment", self.region_assignment),
        ]
    }
}

impl SegmentMgr {
    /// Counts pairs of adjacent segment members whose x-intervals overlap.
    pub fn check_overlap(&self, max_err: usize) -> usize {
        self.segments()
            .par_iter()
            .map(|seg| self.segment_pair_violations(seg, max_err, |gap, _| gap < 0))
            .sum::<usize>()
            .min(max_err)
    }

    /// Counts adjacent pairs whose gap is non-negative but below the required
    /// edge spacing (overlapping pairs are counted by the overlap audit).
    pub fn check_edge_spacing(&self, max_err: usize) -> usize {
        self.segments()
            .par_iter()
            .map(|seg| self.segment_pair_violations(seg, max_err, |gap, need| gap >= 0 && gap < need))
            .sum::<usize>()
            .min(max_err)
    }

    /// Counts segment members whose left edge misses the row's site grid.
    pub fn check_site_alignment(&self, max_err: usize) -> usize {
        self.segments()
            .par_iter()
            .map(|seg| {
                let row = self.arch().row(seg.row);
                seg.cells()
                    .iter()
                    .filter(|&&c| !row.is_site_aligned(self.netlist().cell(c).left()))
                    .take(max_err)
                    .count()
            })
            .sum::<usize>()
            .min(max_err)
    }

    /// Counts movable cells whose vertical span does not tile exactly onto a
    /// contiguous run of rows.
    pub fn check_row_alignment(&self, max_err: usize) -> usize {
        self.netlist()
            .cells
            .par_iter()
            .filter(|c| c.is_movable())
            .filter(|c| self.spanned_rows(c.bottom(), c.height).is_none())
            .count()
            .min(max_err)
    }

    /// Counts cells assigned to a segment of the wrong region, plus movable
    /// cells assigned to no segment at all.
    pub fn check_region_assignment(&self, max_err: usize) -> usize {
        let mismatched: usize = self
            .segments()
            .par_iter()
            .map(|seg| {
                seg.cells()
                    .iter()
                    .filter(|&&c| self.netlist().cell(c).region != seg.region)
                    .take(max_err)
                    .count()
            })
            .sum();
        let unmapped = self
            .netlist()
            .cells
            .iter()
            .filter(|c| c.is_movable())
            .filter(|c| self.segments_of_cell(c.id).is_empty())
            .count();
        (mismatched + unmapped).min(max_err)
    }

    /// Runs all five audits with the configured error ceiling.
    pub fn run_audits(&self) -> AuditReport {
        let max_err = self.config().max_audit_errors;
        AuditReport {
            overlap: self.check_overlap(max_err),
            edge_spacing: self.check_edge_spacing(max_err),
            site_alignment: self.check_site_alignment(max_err),
            row_alignment: self.check_row_alignment(max_err),
            region_assignment: self.check_region_assignment(max_err),
        }
    }

    /// Scans one segment's adjacent member pairs, counting those for which
    /// `violates(gap, required_spacing)` holds.
    fn segment_pair_violations(
        &self,
        seg: &Segment,
        max_err: usize,
        violates: impl Fn(i64, i64) -> bool,
    ) -> usize {
        let nl = self.netlist();
        seg.cells()
            .windows(2)
            .filter(|pair| {
                let a = nl.cell(pair[0]);
                let b = nl.cell(pair[1]);
                let gap = b.left() - a.right();
                let need = self
                    .arch()
                    .spacing
                    .spacing(a.right_edge_class(), b.left_edge_class());
                violates(gap, need)
            })
            .take(max_err)
            .count()
    }
}
