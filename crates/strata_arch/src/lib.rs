//! Static architecture model for the Strata placement engine.
//!
//! This crate describes the placement area consumed by the detailed-placement
//! engine: rows with discretized site grids and power-rail polarities,
//! rectilinear capacity regions, the pairwise edge-spacing table, and cell
//! orientations. Everything here is immutable once constructed and is shared
//! read-only across the whole optimization run.

#![warn(missing_docs)]

pub mod ids;
pub mod orient;
pub mod spacing;
pub mod types;

pub use ids::{RegionId, RowId};
pub use orient::Orientation;
pub use spacing::{EdgeSpacingTable, SpacingTableError};
pub use types::{Architecture, RailPolarity, Rect, Region, Row};
