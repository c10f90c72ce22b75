//! Netlist model for the Strata placement engine.
//!
//! This crate provides the cell/net/pin arena the engine operates on, plus
//! the design-database snapshot interface: a JSON read snapshot built once at
//! import and a single write-back call that copies final cell positions and
//! orientations back out.
//!
//! Nets and pins are read-only to the engine and are used solely for cost
//! evaluation; cell positions and orientations are mutated only through the
//! segment manager's commit path in `strata_dp`.

#![warn(missing_docs)]

pub mod data;
pub mod ids;
pub mod snapshot;

pub use data::{Cell, Mobility, Net, Netlist, Pin};
pub use ids::{CellId, NetId, PinId};
pub use snapshot::{
    load_snapshot, placement_records, write_placement, DesignSnapshot, PlacementRecord,
    SnapshotError,
};
