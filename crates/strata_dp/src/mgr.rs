//! The segment manager: segment construction, placement queries, and the
//! stage/commit/rollback move-transaction engine.
//!
//! The manager is the sole mutator of cell position/orientation/segment
//! membership. A candidate move travels through it in two phases: `stage`
//! validates the proposal against capacity, spacing, alignment, and region
//! rules without touching live state; `accept_move` then applies it
//! all-or-nothing, while `reject_move` discards it in O(1). No code may
//! re-enter the manager while a move is staged but uncommitted.

use crate::config::EngineConfig;
use crate::ids::SegmentId;
use crate::proposal::{CellState, MoveProposal};
use crate::segment::Segment;
use strata_arch::{Architecture, RegionId, Row};
use strata_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use strata_net::{Cell, CellId, Netlist};

/// Fatal structural errors detected while building the initial mapping.
///
/// These are the only unrecoverable conditions in the engine; everything else
/// is reported through the diagnostic sink or a recoverable [`MoveError`].
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The architecture has no rows to build segments from.
    #[error("architecture has no rows")]
    NoRows,

    /// The architecture has no regions (region 0 must always exist).
    #[error("architecture has no regions")]
    NoRegions,

    /// A cell references a region the architecture does not define.
    #[error("region table has {regions} regions but cell '{cell}' is assigned to region {region}")]
    RegionOutOfRange {
        /// Number of regions in the architecture.
        regions: usize,
        /// Name of the offending cell.
        cell: String,
        /// The out-of-range region index.
        region: u32,
    },
}

/// Recoverable rejections of a candidate move.
///
/// A failed stage leaves all manager state untouched; the owning pass counts
/// the rejection and continues.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// A move is already staged; commit or reject it first.
    #[error("a move is already staged; commit or reject it first")]
    AlreadyStaged,

    /// `accept_move` was called with nothing staged.
    #[error("no move is staged")]
    NothingStaged,

    /// The proposal touches more cells than `move_limit` allows.
    #[error("proposal touches {got} cells, limit is {limit}")]
    TooManyCells {
        /// Cells in the proposal.
        got: usize,
        /// Configured `move_limit`.
        limit: usize,
    },

    /// The proposal moves a fully fixed cell.
    #[error("cell {cell} is fixed and cannot move")]
    FixedCell {
        /// The fixed cell.
        cell: CellId,
    },

    /// The proposal moves a cell along its frozen axis.
    #[error("cell {cell} cannot move along its frozen axis")]
    AxisFrozen {
        /// The partially fixed cell.
        cell: CellId,
    },

    /// An entry's old state does not match the cell's live state.
    #[error("proposal for cell {cell} is stale")]
    StaleProposal {
        /// The cell whose recorded state is out of date.
        cell: CellId,
    },

    /// A target segment ID is out of range.
    #[error("unknown segment {segment}")]
    UnknownSegment {
        /// The unknown segment ID.
        segment: SegmentId,
    },

    /// A target segment belongs to a different region than the cell.
    #[error("cell {cell} region does not match segment {segment}")]
    RegionMismatch {
        /// The moving cell.
        cell: CellId,
        /// The mismatched target segment.
        segment: SegmentId,
    },

    /// A target x is not aligned to the row's site grid.
    #[error("cell {cell} target x {x} is not site-aligned")]
    OffGrid {
        /// The moving cell.
        cell: CellId,
        /// The misaligned left-edge coordinate.
        x: i64,
    },

    /// A target y does not line up with the target segments' rows.
    #[error("cell {cell} target y {y} is not row-aligned")]
    OffRow {
        /// The moving cell.
        cell: CellId,
        /// The misaligned center coordinate.
        y: i64,
    },

    /// The cell's x-interval leaves the target segment's span.
    #[error("cell {cell} does not fit inside segment {segment}")]
    OutOfSpan {
        /// The moving cell.
        cell: CellId,
        /// The too-small target segment.
        segment: SegmentId,
    },

    /// The target segment has no free capacity for the move.
    #[error("segment {segment} is at capacity")]
    SegmentOverflow {
        /// The full segment.
        segment: SegmentId,
    },

    /// Two cells in the resulting order violate overlap or edge spacing.
    #[error("spacing violation in segment {segment}")]
    SpacingViolation {
        /// The segment where the violation would occur.
        segment: SegmentId,
    },
}

/// Hypothetical effect of a test insert or remove, computed with zero mutation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestFit {
    /// Whether the operation would keep the segment legal.
    pub fits: bool,
    /// Segment utilization after the operation.
    pub util_after: f64,
    /// Smallest remaining slack around the touched position (negative when
    /// the operation does not fit).
    pub gap: i64,
}

/// The coordinator of the detailed-placement engine.
///
/// Owns the netlist, the architecture, every [`Segment`], and the
/// cell→segments map. All other components go through it for placement
/// queries and move transactions.
#[derive(Debug)]
pub struct SegmentMgr {
    arch: Architecture,
    netlist: Netlist,
    config: EngineConfig,
    segments: Vec<Segment>,
    segs_by_row: Vec<Vec<SegmentId>>,
    cell_segs: Vec<Vec<SegmentId>>,
    region_members: Vec<usize>,
    orig_pos: Vec<(i64, i64)>,
    staged: Option<MoveProposal>,
}

impl SegmentMgr {
    /// Builds segments from the architecture minus blockages and populates
    /// the initial cell→segment map from current cell positions.
    ///
    /// The incoming placement is assumed legalized; cells that cannot be
    /// mapped are reported through the sink and left unmapped. Fails only on
    /// a structurally inconsistent region table.
    pub fn setup(
        arch: Architecture,
        netlist: Netlist,
        config: EngineConfig,
        sink: &DiagnosticSink,
    ) -> Result<Self, SetupError> {
        if arch.rows.is_empty() {
            return Err(SetupError::NoRows);
        }
        if arch.regions.is_empty() {
            return Err(SetupError::NoRegions);
        }
        for cell in &netlist.cells {
            if cell.region.as_raw() as usize >= arch.regions.len() {
                return Err(SetupError::RegionOutOfRange {
                    regions: arch.regions.len(),
                    cell: cell.name.clone(),
                    region: cell.region.as_raw(),
                });
            }
        }

        let blockages = collect_blockages(&arch, &netlist);
        let (segments, segs_by_row) = build_segments(&arch, &blockages);

        let mut mgr = Self {
            orig_pos: netlist.cells.iter().map(|c| (c.x, c.y)).collect(),
            cell_segs: vec![Vec::new(); netlist.cell_count()],
            region_members: vec![0; arch.regions.len()],
            arch,
            netlist,
            config,
            segments,
            segs_by_row,
            staged: None,
        };
        mgr.populate_membership(sink);
        Ok(mgr)
    }

    /// The architecture this manager was built from.
    pub fn arch(&self) -> &Architecture {
        &self.arch
    }

    /// The netlist in its current committed state.
    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Consumes the manager, returning the netlist for write-back.
    pub fn into_netlist(self) -> Netlist {
        self.netlist
    }

    /// All segments, indexed by [`SegmentId`].
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment with the given ID.
    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.as_raw() as usize]
    }

    /// The segments a cell currently belongs to, bottom row first.
    pub fn segments_of_cell(&self, cell: CellId) -> &[SegmentId] {
        &self.cell_segs[cell.as_raw() as usize]
    }

    /// The segments of one row, sorted left to right.
    pub fn segments_in_row(&self, row_idx: usize) -> &[SegmentId] {
        &self.segs_by_row[row_idx]
    }

    /// Number of cells assigned to a region.
    pub fn region_population(&self, region: RegionId) -> usize {
        self.region_members[region.as_raw() as usize]
    }

    /// The position a cell had when the manager was set up.
    pub fn original_position(&self, cell: CellId) -> (i64, i64) {
        self.orig_pos[cell.as_raw() as usize]
    }

    /// The currently staged proposal, if any.
    pub fn staged(&self) -> Option<&MoveProposal> {
        self.staged.as_ref()
    }

    /// The current live state of a cell, as a [`CellState`] value.
    pub fn cell_state(&self, cell: CellId) -> CellState {
        let c = self.netlist.cell(cell);
        CellState {
            x: c.x,
            y: c.y,
            orient: c.orient,
            segments: self.segments_of_cell(cell).to_vec(),
        }
    }

    fn populate_membership(&mut self, sink: &DiagnosticSink) {
        let mut members: Vec<Vec<CellId>> = vec![Vec::new(); self.segments.len()];

        for idx in 0..self.netlist.cell_count() {
            let cell = &self.netlist.cells[idx];
            if cell.is_fixed() {
                continue;
            }
            self.region_members[cell.region.as_raw() as usize] += 1;

            let Some(rows) = self.spanned_rows(cell.bottom(), cell.height) else {
                sink.emit(
                    Diagnostic::warning(
                        DiagnosticCode::new(Category::Warning, 10),
                        format!("cell '{}' lies outside the row area", cell.name),
                    ),
                );
                continue;
            };

            let mut segs = Vec::with_capacity(rows.len());
            for &row_idx in &rows {
                match self.nearest_segment_in_row(row_idx, cell.region, cell.x, cell.width, None) {
                    Some(sid) => segs.push(sid),
                    None => {
                        sink.emit(
                            Diagnostic::warning(
                                DiagnosticCode::new(Category::Warning, 11),
                                format!(
                                    "no segment in row {} can host cell '{}'",
                                    row_idx, cell.name
                                ),
                            ),
                        );
                        segs.clear();
                        break;
                    }
                }
            }
            if segs.len() != rows.len() {
                continue;
            }
            let id = cell.id;
            for &sid in &segs {
                members[sid.as_raw() as usize].push(id);
            }
            self.cell_segs[idx] = segs;
        }

        for (i, mut cells) in members.into_iter().enumerate() {
            cells.sort_by_key(|&c| self.netlist.cell(c).left());
            let total: i64 = cells.iter().map(|&c| self.netlist.cell(c).width).sum();
            self.segments[i].assign(cells, total);
        }
    }

    /// Returns the contiguous run of row indices covering `[bottom, bottom+height)`,
    /// or `None` if the span leaves the row area or does not tile exactly.
    pub fn spanned_rows(&self, bottom: i64, height: i64) -> Option<Vec<usize>> {
        let start = self.arch.row_index_at_bottom(bottom)?;
        let mut rows = Vec::new();
        let mut covered = 0;
        let mut idx = start;
        while covered < height {
            let row = self.arch.rows.get(idx)?;
            if row.y != bottom + covered {
                return None; // row gap inside the span
            }
            covered += row.height;
            rows.push(idx);
            idx += 1;
        }
        (covered == height).then_some(rows)
    }

    /// Finds a same-region segment in one row able to host a cell of the
    /// given width, preferring the one closest to `x`.
    fn nearest_segment_in_row(
        &self,
        row_idx: usize,
        region: RegionId,
        x: i64,
        width: i64,
        already_in: Option<CellId>,
    ) -> Option<SegmentId> {
        let mut best: Option<(i64, SegmentId)> = None;
        for &sid in &self.segs_by_row[row_idx] {
            let seg = self.segment(sid);
            if seg.region != region || seg.width() < width {
                continue;
            }
            let holds_cell = already_in.map_or(false, |c| seg.position_of(c).is_some());
            if !holds_cell && seg.capacity() < width {
                continue;
            }
            let lo = seg.x_min + width / 2;
            let hi = seg.x_max - width + width / 2;
            let dist = (x.clamp(lo, hi) - x).abs();
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, sid));
            }
        }
        best.map(|(_, sid)| sid)
    }

    /// Outward scan for the nearest segment able to host the cell near a
    /// target point. Returns `None` when the scan window is exhausted
    /// (non-fatal: the candidate is simply skipped).
    pub fn find_segment_near(&self, cell: CellId, x: i64, y: i64) -> Option<SegmentId> {
        let c = self.netlist.cell(cell);
        let nrows = self.arch.row_count();
        let anchor = self
            .arch
            .row_index_at_y(y)
            .unwrap_or_else(|| if y < self.arch.rows[0].y { 0 } else { nrows - 1 });

        let mut best: Option<(i64, SegmentId)> = None;
        for d in 0..=self.config.scan_rows {
            for row_idx in row_pair(anchor, d, nrows) {
                let row = &self.arch.rows[row_idx];
                if !rails_match(c, row) {
                    continue;
                }
                let dy = (row.y + c.height / 2 - y).abs();
                if let Some(sid) =
                    self.nearest_segment_in_row(row_idx, c.region, x, c.width, Some(cell))
                {
                    let seg = self.segment(sid);
                    let lo = seg.x_min + c.width / 2;
                    let hi = seg.x_max - c.width + c.width / 2;
                    let dist = (x.clamp(lo, hi) - x).abs() + dy;
                    if best.map_or(true, |(b, _)| dist < b) {
                        best = Some((dist, sid));
                    }
                }
            }
        }
        best.map(|(_, sid)| sid)
    }

    /// Outward scan for the nearest segment able to host the cell at its
    /// current position.
    pub fn find_closest_segment(&self, cell: CellId) -> Option<SegmentId> {
        let c = self.netlist.cell(cell);
        self.find_segment_near(cell, c.x, c.y)
    }

    /// Outward scan for the nearest run of stacked same-region segments able
    /// to host a multi-row cell near a target point. The returned segments
    /// are ordered bottom row first.
    pub fn find_span_near(&self, cell: CellId, x: i64, y: i64) -> Option<Vec<SegmentId>> {
        let c = self.netlist.cell(cell);
        let nrows = self.arch.row_count();
        let anchor_bottom = self
            .arch
            .row_index_at_y(y - c.height / 2)
            .unwrap_or_else(|| if y < self.arch.rows[0].y { 0 } else { nrows - 1 });

        let mut best: Option<(i64, Vec<SegmentId>)> = None;
        for d in 0..=self.config.scan_rows {
            for base in row_pair(anchor_bottom, d, nrows) {
                let bottom = self.arch.rows[base].y;
                let Some(rows) = self.spanned_rows(bottom, c.height) else {
                    continue;
                };
                if !rails_match(c, &self.arch.rows[base]) {
                    continue;
                }
                if let Some((dist, span)) = self.best_span_in_rows(c, &rows, x, bottom) {
                    if best.as_ref().map_or(true, |(b, _)| dist < *b) {
                        best = Some((dist, span));
                    }
                }
            }
        }
        best.map(|(_, span)| span)
    }

    /// Outward scan for the nearest span hosting the cell at its current position.
    pub fn find_closest_span(&self, cell: CellId) -> Option<Vec<SegmentId>> {
        let c = self.netlist.cell(cell);
        self.find_span_near(cell, c.x, c.y)
    }

    /// Finds, within a fixed run of rows, the stack of same-region segments
    /// whose common x-interval can host the cell closest to `x`.
    fn best_span_in_rows(
        &self,
        cell: &Cell,
        rows: &[usize],
        x: i64,
        bottom: i64,
    ) -> Option<(i64, Vec<SegmentId>)> {
        let dy = (bottom + cell.height / 2 - cell.y).abs();
        let mut best: Option<(i64, Vec<SegmentId>)> = None;

        for &sid0 in &self.segs_by_row[rows[0]] {
            let seg0 = self.segment(sid0);
            if seg0.region != cell.region || seg0.capacity() < cell.width {
                continue;
            }
            let mut lo = seg0.x_min;
            let mut hi = seg0.x_max;
            let mut span = vec![sid0];
            for &row_idx in &rows[1..] {
                let found = self.segs_by_row[row_idx].iter().copied().find(|&sid| {
                    let seg = self.segment(sid);
                    seg.region == cell.region
                        && seg.capacity() >= cell.width
                        && seg.x_min < hi
                        && seg.x_max > lo
                });
                match found {
                    Some(sid) => {
                        let seg = self.segment(sid);
                        lo = lo.max(seg.x_min);
                        hi = hi.min(seg.x_max);
                        span.push(sid);
                    }
                    None => {
                        span.clear();
                        break;
                    }
                }
            }
            if span.len() != rows.len() || hi - lo < cell.width {
                continue;
            }
            let center_lo = lo + cell.width / 2;
            let center_hi = hi - cell.width + cell.width / 2;
            let dist = (x.clamp(center_lo, center_hi) - x).abs() + dy;
            if best.as_ref().map_or(true, |(b, _)| dist < *b) {
                best = Some((dist, span));
            }
        }
        best
    }

    /// Computes the hypothetical effect of removing a cell from a segment.
    ///
    /// Performs no mutation. Returns `None` if the cell is not a member.
    pub fn test_remove(&self, cell: CellId, segment: SegmentId) -> Option<TestFit> {
        let seg = self.segments.get(segment.as_raw() as usize)?;
        let idx = seg.position_of(cell)?;
        let c = self.netlist.cell(cell);

        let left_bound = if idx > 0 {
            self.netlist.cell(seg.cells()[idx - 1]).right()
        } else {
            seg.x_min
        };
        let right_bound = if idx + 1 < seg.len() {
            self.netlist.cell(seg.cells()[idx + 1]).left()
        } else {
            seg.x_max
        };

        Some(TestFit {
            fits: true,
            util_after: (seg.used_width() - c.width) as f64 / seg.width().max(1) as f64,
            gap: right_bound - left_bound,
        })
    }

    /// Computes the hypothetical effect of inserting a cell into a segment
    /// with its center at `x`.
    ///
    /// Performs no mutation. `fits` is false when the segment is full, the
    /// interval leaves the span, or a neighbor gap drops below the required
    /// edge spacing; `gap` is then the worst (possibly negative) slack.
    pub fn test_insert(&self, cell: CellId, segment: SegmentId, x: i64) -> TestFit {
        let seg = &self.segments[segment.as_raw() as usize];
        let c = self.netlist.cell(cell);
        let already_member = seg.position_of(cell).is_some();
        let used_after = if already_member {
            seg.used_width()
        } else {
            seg.used_width() + c.width
        };
        let util_after = used_after as f64 / seg.width().max(1) as f64;

        let left = x - c.width / 2;
        let right = left + c.width;
        if left < seg.x_min || right > seg.x_max || used_after > seg.width() {
            return TestFit {
                fits: false,
                util_after,
                gap: (seg.x_max - seg.x_min) - used_after,
            };
        }

        // Neighbor slack at the insertion point, ignoring the cell itself.
        let mut left_slack = left - seg.x_min;
        let mut right_slack = seg.x_max - right;
        for &other_id in seg.cells() {
            if other_id == cell {
                continue;
            }
            let other = self.netlist.cell(other_id);
            if other.left() >= right {
                let need = self
                    .arch
                    .spacing
                    .spacing(c.right_edge_class(), other.left_edge_class());
                right_slack = right_slack.min(other.left() - right - need);
            } else if other.right() <= left {
                let need = self
                    .arch
                    .spacing
                    .spacing(other.right_edge_class(), c.left_edge_class());
                left_slack = left_slack.min(left - other.right() - need);
            } else {
                // Overlapping neighbor: report the embedding depth as negative slack.
                let overlap = (right.min(other.right()) - left.max(other.left())).max(1);
                return TestFit {
                    fits: false,
                    util_after,
                    gap: -overlap,
                };
            }
        }

        let gap = left_slack.min(right_slack);
        TestFit {
            fits: gap >= 0,
            util_after,
            gap,
        }
    }

    /// Validates and stages a candidate move.
    ///
    /// On success the proposal is held until [`accept_move`](Self::accept_move)
    /// or [`reject_move`](Self::reject_move); on failure nothing changes.
    pub fn stage(&mut self, proposal: MoveProposal) -> Result<(), MoveError> {
        if self.staged.is_some() {
            return Err(MoveError::AlreadyStaged);
        }
        if proposal.len() > self.config.move_limit {
            return Err(MoveError::TooManyCells {
                got: proposal.len(),
                limit: self.config.move_limit,
            });
        }
        self.validate(&proposal)?;
        self.staged = Some(proposal);
        Ok(())
    }

    /// Commits the staged move all-or-nothing.
    ///
    /// Removes cells from their old segments, writes new positions and
    /// orientations onto the netlist, inserts into the new segments at the
    /// correct sorted index, and refreshes utilization caches.
    pub fn accept_move(&mut self) -> Result<(), MoveError> {
        let proposal = self.staged.take().ok_or(MoveError::NothingStaged)?;

        for entry in proposal.entries() {
            let width = self.netlist.cell(entry.cell).width;
            for &sid in &entry.old.segments {
                let s = sid.as_raw() as usize;
                if let Some(idx) = self.segments[s].position_of(entry.cell) {
                    self.segments[s].remove_at(idx, width);
                }
            }
        }

        for entry in proposal.entries() {
            let cell = self.netlist.cell_mut(entry.cell);
            cell.x = entry.new.x;
            cell.y = entry.new.y;
            cell.orient = entry.new.orient;
        }

        for entry in proposal.entries() {
            let c = self.netlist.cell(entry.cell);
            let (width, left) = (c.width, c.left());
            for &sid in &entry.new.segments {
                let s = sid.as_raw() as usize;
                let idx = {
                    let seg = &self.segments[s];
                    let nl = &self.netlist;
                    seg.cells()
                        .iter()
                        .position(|&c| nl.cell(c).left() > left)
                        .unwrap_or(seg.len())
                };
                self.segments[s].insert_at(idx, entry.cell, width);
            }
            self.cell_segs[entry.cell.as_raw() as usize] = entry.new.segments.clone();
        }

        Ok(())
    }

    /// Discards the staged move. O(1): nothing was mutated before commit.
    pub fn reject_move(&mut self) {
        self.staged = None;
    }

    fn validate(&self, proposal: &MoveProposal) -> Result<(), MoveError> {
        use strata_net::Mobility;

        for entry in proposal.entries() {
            let cell = self.netlist.cell(entry.cell);
            match cell.mobility {
                Mobility::Fixed => return Err(MoveError::FixedCell { cell: entry.cell }),
                Mobility::FixedX if entry.new.x != entry.old.x => {
                    return Err(MoveError::AxisFrozen { cell: entry.cell })
                }
                Mobility::FixedY if entry.new.y != entry.old.y => {
                    return Err(MoveError::AxisFrozen { cell: entry.cell })
                }
                _ => {}
            }
            if self.cell_state(entry.cell) != entry.old {
                return Err(MoveError::StaleProposal { cell: entry.cell });
            }
            self.validate_entry_geometry(entry.cell, cell, &entry.new)?;
        }
        self.validate_segments(proposal)
    }

    fn validate_entry_geometry(
        &self,
        id: CellId,
        cell: &Cell,
        new: &CellState,
    ) -> Result<(), MoveError> {
        let mut expected_bottom = new.y - cell.height / 2;
        for &sid in &new.segments {
            let seg = self
                .segments
                .get(sid.as_raw() as usize)
                .ok_or(MoveError::UnknownSegment { segment: sid })?;
            if seg.region != cell.region {
                return Err(MoveError::RegionMismatch {
                    cell: id,
                    segment: sid,
                });
            }
            let row = self.arch.row(seg.row);
            if row.y != expected_bottom {
                return Err(MoveError::OffRow { cell: id, y: new.y });
            }
            expected_bottom += row.height;

            let left = new.x - cell.width / 2;
            if !row.is_site_aligned(left) {
                return Err(MoveError::OffGrid { cell: id, x: left });
            }
            if left < seg.x_min || left + cell.width > seg.x_max {
                return Err(MoveError::OutOfSpan {
                    cell: id,
                    segment: sid,
                });
            }
        }
        if expected_bottom != new.y + cell.height - cell.height / 2 {
            return Err(MoveError::OffRow { cell: id, y: new.y });
        }
        Ok(())
    }

    /// Simulates the post-move member order of every affected segment and
    /// checks capacity, strict ordering, and edge spacing.
    fn validate_segments(&self, proposal: &MoveProposal) -> Result<(), MoveError> {
        let mut affected: Vec<SegmentId> = Vec::new();
        for entry in proposal.entries() {
            affected.extend(entry.old.segments.iter().copied());
            affected.extend(entry.new.segments.iter().copied());
        }
        affected.sort_by_key(|sid| sid.as_raw());
        affected.dedup();

        for sid in affected {
            let seg = &self.segments[sid.as_raw() as usize];

            // (left, width, left edge class, right edge class) in final order
            let mut line: Vec<(i64, i64, u16, u16)> = Vec::with_capacity(seg.len() + 2);
            for &member in seg.cells() {
                if proposal.new_state_of(member).is_some() {
                    continue; // re-added below at its proposed position
                }
                let c = self.netlist.cell(member);
                line.push((c.left(), c.width, c.left_edge_class(), c.right_edge_class()));
            }
            for entry in proposal.entries() {
                if !entry.new.segments.contains(&sid) {
                    continue;
                }
                let c = self.netlist.cell(entry.cell);
                let (el, er) = if entry.new.orient.flips_horizontal() {
                    (c.edge_right, c.edge_left)
                } else {
                    (c.edge_left, c.edge_right)
                };
                line.push((entry.new.x - c.width / 2, c.width, el, er));
            }

            line.sort_unstable_by_key(|&(left, ..)| left);
            let used: i64 = line.iter().map(|&(_, w, ..)| w).sum();
            if used > seg.width() {
                return Err(MoveError::SegmentOverflow { segment: sid });
            }
            for pair in line.windows(2) {
                let (left_a, width_a, _, right_class_a) = pair[0];
                let (left_b, _, left_class_b, _) = pair[1];
                let gap = left_b - (left_a + width_a);
                if gap < self.arch.spacing.spacing(right_class_a, left_class_b) {
                    return Err(MoveError::SpacingViolation { segment: sid });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn netlist_mut(&mut self) -> &mut Netlist {
        &mut self.netlist
    }

    pub(crate) fn segment_mut(&mut self, id: SegmentId) -> &mut Segment {
        &mut self.segments[id.as_raw() as usize]
    }
}

fn rails_match(cell: &Cell, row: &Row) -> bool {
    cell.bottom_rail.map_or(true, |r| r == row.bottom_rail)
}

/// Yields `anchor - d` and `anchor + d` when they are valid row indices.
fn row_pair(anchor: usize, d: usize, nrows: usize) -> impl Iterator<Item = usize> {
    let below = anchor.checked_sub(d);
    let above = (d > 0).then_some(anchor + d).filter(|&i| i < nrows);
    below.into_iter().chain(above)
}

/// Collects per-row blockage intervals from fixed cells and obstacles.
fn collect_blockages(arch: &Architecture, netlist: &Netlist) -> Vec<Vec<(i64, i64)>> {
    let mut blockages: Vec<Vec<(i64, i64)>> = vec![Vec::new(); arch.rows.len()];

    let mut add = |x_min: i64, y_min: i64, x_max: i64, y_max: i64| {
        for (idx, row) in arch.rows.iter().enumerate() {
            if y_min < row.y_max() && y_max > row.y {
                let lo = x_min.max(row.x_min());
                let hi = x_max.min(row.x_max());
                if lo < hi {
                    blockages[idx].push((lo, hi));
                }
            }
        }
    };

    for cell in netlist.cells.iter().filter(|c| c.is_fixed()) {
        add(cell.left(), cell.bottom(), cell.right(), cell.top());
    }
    for obs in &arch.obstacles {
        add(obs.x_min, obs.y_min, obs.x_max, obs.y_max);
    }

    for row in &mut blockages {
        row.sort_unstable();
        let mut merged: Vec<(i64, i64)> = Vec::with_capacity(row.len());
        for &(lo, hi) in row.iter() {
            match merged.last_mut() {
                Some((_, prev_hi)) if lo <= *prev_hi => *prev_hi = (*prev_hi).max(hi),
                _ => merged.push((lo, hi)),
            }
        }
        *row = merged;
    }
    blockages
}

/// Subtracts sorted cut intervals from sorted source intervals.
fn subtract_intervals(source: &[(i64, i64)], cuts: &[(i64, i64)]) -> Vec<(i64, i64)> {
    let mut out = Vec::new();
    for &(mut lo, hi) in source {
        for &(cut_lo, cut_hi) in cuts {
            if cut_hi <= lo || cut_lo >= hi {
                continue;
            }
            if cut_lo > lo {
                out.push((lo, cut_lo));
            }
            lo = lo.max(cut_hi);
            if lo >= hi {
                break;
            }
        }
        if lo < hi {
            out.push((lo, hi));
        }
    }
    out
}

/// Derives segments for every row/region pair, minus blockages.
fn build_segments(
    arch: &Architecture,
    blockages: &[Vec<(i64, i64)>],
) -> (Vec<Segment>, Vec<Vec<SegmentId>>) {
    let mut segments = Vec::new();
    let mut segs_by_row: Vec<Vec<SegmentId>> = vec![Vec::new(); arch.rows.len()];

    for (row_idx, row) in arch.rows.iter().enumerate() {
        for region in &arch.regions {
            let mut intervals = region.row_intervals(row);
            if region.id == RegionId::DEFAULT {
                // The default region cedes area claimed by explicit regions.
                for other in arch.regions.iter().filter(|r| r.id != RegionId::DEFAULT) {
                    intervals = subtract_intervals(&intervals, &other.row_intervals(row));
                }
            }
            intervals = subtract_intervals(&intervals, &blockages[row_idx]);

            for (lo, hi) in intervals {
                let lo = align_up(lo, row);
                let hi = align_down(hi, row);
                if hi - lo < row.site_pitch {
                    continue;
                }
                let id = SegmentId::from_raw(segments.len() as u32);
                segments.push(Segment::new(id, row.id, region.id, lo, hi));
                segs_by_row[row_idx].push(id);
            }
        }
        segs_by_row[row_idx].sort_by_key(|&sid| segments[sid.as_raw() as usize].x_min);
    }
    (segments, segs_by_row)
}

pub(crate) fn align_up(x: i64, row: &Row) -> i64 {
    let rem = (x - row.origin_x).rem_euclid(row.site_pitch);
    if rem == 0 {
        x
    } else {
        x + row.site_pitch - rem
    }
}

pub(crate) fn align_down(x: i64, row: &Row) -> i64 {
    x - (x - row.origin_x).rem_euclid(row.site_pitch)
}
