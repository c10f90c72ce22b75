//! Design-database snapshot interface.
//!
//! The engine consumes a read snapshot (architecture + netlist) built once at
//! import, and exposes one write-back call that copies final cell positions
//! and orientations back out at the end of the run.

use crate::data::Netlist;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strata_arch::{Architecture, Orientation};

/// Errors raised while reading or writing snapshot files.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// An I/O error occurred while reading or writing a snapshot file.
    #[error("failed to read or write snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON content could not be parsed.
    #[error("failed to parse snapshot: {0}")]
    Parse(String),
}

/// A read snapshot of the design database: the static architecture plus the
/// cell/net/pin graph in its incoming (legalized) placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignSnapshot {
    /// The static architecture description.
    pub arch: Architecture,
    /// The netlist with incoming cell positions.
    pub netlist: Netlist,
}

impl DesignSnapshot {
    /// Parses a snapshot from a JSON string and rebuilds netlist indices.
    pub fn from_json_str(content: &str) -> Result<Self, SnapshotError> {
        let mut snapshot: DesignSnapshot =
            serde_json::from_str(content).map_err(|e| SnapshotError::Parse(e.to_string()))?;
        snapshot.netlist.rebuild_indices();
        Ok(snapshot)
    }
}

/// Loads a design snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<DesignSnapshot, SnapshotError> {
    let content = std::fs::read_to_string(path)?;
    DesignSnapshot::from_json_str(&content)
}

/// One final-placement record written back to the design database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Cell name.
    pub name: String,
    /// Final center x coordinate.
    pub x: i64,
    /// Final center y coordinate.
    pub y: i64,
    /// Final orientation.
    pub orient: Orientation,
}

/// Extracts the write-back records for every cell in the netlist.
pub fn placement_records(netlist: &Netlist) -> Vec<PlacementRecord> {
    netlist
        .cells
        .iter()
        .map(|c| PlacementRecord {
            name: c.name.clone(),
            x: c.x,
            y: c.y,
            orient: c.orient,
        })
        .collect()
}

/// Writes the final placement of all cells to a JSON file.
pub fn write_placement(path: &Path, netlist: &Netlist) -> Result<(), SnapshotError> {
    let records = placement_records(netlist);
    let json =
        serde_json::to_string_pretty(&records).map_err(|e| SnapshotError::Parse(e.to_string()))?;
    std::fs::write(path, json)?;
    Ok(())
}
