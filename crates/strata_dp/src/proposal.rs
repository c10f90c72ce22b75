//! Candidate-move value types.
//!
//! A [`MoveProposal`] is a bounded set of parallel per-cell state changes,
//! owned exclusively by the caller until it is passed to the segment
//! manager's stage call. There is no aliasing between a proposal and live
//! segment or netlist state: objectives can evaluate "what-if" positions from
//! the proposal alone, and discarding a proposal is free.

use crate::ids::SegmentId;
use serde::{Deserialize, Serialize};
use strata_arch::Orientation;
use strata_net::CellId;

/// The placement state of one cell, either current or proposed.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CellState {
    /// Center x coordinate.
    pub x: i64,
    /// Center y coordinate.
    pub y: i64,
    /// Orientation.
    pub orient: Orientation,
    /// Owning segments, bottom row first (one per spanned row).
    pub segments: Vec<SegmentId>,
}

/// One cell's old and new state within a candidate move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveEntry {
    /// The cell being moved.
    pub cell: CellId,
    /// The state the cell currently has.
    pub old: CellState,
    /// The state the move would give it.
    pub new: CellState,
}

/// A bounded set of parallel cell moves, applied all-or-nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MoveProposal {
    entries: Vec<MoveEntry>,
}

impl MoveProposal {
    /// Creates an empty proposal.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds an entry for one cell.
    pub fn push(&mut self, entry: MoveEntry) {
        self.entries.push(entry);
    }

    /// The entries of this proposal.
    pub fn entries(&self) -> &[MoveEntry] {
        &self.entries
    }

    /// Number of cells this proposal touches.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the proposal touches no cells.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the proposed new state for a cell, if it is part of this move.
    pub fn new_state_of(&self, cell: CellId) -> Option<&CellState> {
        self.entries
            .iter()
            .find(|e| e.cell == cell)
            .map(|e| &e.new)
    }
}
