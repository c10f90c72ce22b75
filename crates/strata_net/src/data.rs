//! Core netlist data structures.
//!
//! Defines the cell/net/pin graph consumed by the placement engine: cells
//! with center positions, sizes, mobility, and region assignments; nets as
//! pin membership sets; and pins with center-relative, rotation-dependent
//! offsets. The [`Netlist`] is the arena that owns all three.

use crate::ids::{CellId, NetId, PinId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_arch::{Orientation, RailPolarity, RegionId};

/// How (and whether) a cell may move during optimization.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Mobility {
    /// Free to move on both axes.
    Movable,
    /// X is frozen; the cell may still change rows.
    FixedX,
    /// Y is frozen; the cell may still slide within its row.
    FixedY,
    /// Fully fixed; modeled as a blockage, never a segment member.
    Fixed,
}

/// A movable (or fixed) cell.
///
/// The position `(x, y)` is the geometric center. Width and height are
/// immutable during optimization; position and orientation are mutated only
/// by the segment manager's commit path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this cell.
    pub id: CellId,
    /// Human-readable cell name.
    pub name: String,
    /// Cell width in database units.
    pub width: i64,
    /// Cell height in database units.
    pub height: i64,
    /// X coordinate of the geometric center.
    pub x: i64,
    /// Y coordinate of the geometric center.
    pub y: i64,
    /// Manufacturing orientation.
    pub orient: Orientation,
    /// Mobility state.
    pub mobility: Mobility,
    /// The capacity region this cell is restricted to.
    pub region: RegionId,
    /// Edge-type class of the left edge (in the unflipped orientation).
    pub edge_left: u16,
    /// Edge-type class of the right edge (in the unflipped orientation).
    pub edge_right: u16,
    /// Rail polarity demanded along the bottom edge, if any.
    pub bottom_rail: Option<RailPolarity>,
    /// Rail polarity demanded along the top edge, if any.
    pub top_rail: Option<RailPolarity>,
}

impl Cell {
    /// Left edge x coordinate.
    pub fn left(&self) -> i64 {
        self.x - self.width / 2
    }

    /// Right edge x coordinate (left edge plus width).
    pub fn right(&self) -> i64 {
        self.left() + self.width
    }

    /// Bottom edge y coordinate.
    pub fn bottom(&self) -> i64 {
        self.y - self.height / 2
    }

    /// Top edge y coordinate (bottom edge plus height).
    pub fn top(&self) -> i64 {
        self.bottom() + self.height
    }

    /// Returns `true` only for fully fixed cells.
    pub fn is_fixed(&self) -> bool {
        self.mobility == Mobility::Fixed
    }

    /// Returns `true` for cells with at least one free axis.
    pub fn is_movable(&self) -> bool {
        !self.is_fixed()
    }

    /// Edge-type class currently on the left, accounting for orientation.
    pub fn left_edge_class(&self) -> u16 {
        if self.orient.flips_horizontal() {
            self.edge_right
        } else {
            self.edge_left
        }
    }

    /// Edge-type class currently on the right, accounting for orientation.
    pub fn right_edge_class(&self) -> u16 {
        if self.orient.flips_horizontal() {
            self.edge_left
        } else {
            self.edge_right
        }
    }
}

/// A net: an unordered set of pin memberships, read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Human-readable net name.
    pub name: String,
    /// The pins on this net.
    pub pins: Vec<PinId>,
}

/// A pin: a connection point of a cell on a net.
///
/// The offset `(dx, dy)` is relative to the owning cell's center in the
/// unrotated orientation; [`Pin::offset`] applies the cell's orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// The unique ID of this pin.
    pub id: PinId,
    /// Human-readable pin name.
    pub name: String,
    /// The cell that owns this pin.
    pub cell: CellId,
    /// The net this pin belongs to.
    pub net: NetId,
    /// Center-relative x offset in the unrotated orientation.
    pub dx: i64,
    /// Center-relative y offset in the unrotated orientation.
    pub dy: i64,
}

impl Pin {
    /// Returns the pin offset under the given orientation.
    pub fn offset(&self, orient: Orientation) -> (i64, i64) {
        orient.transform(self.dx, self.dy)
    }

    /// Returns the absolute pin position for a cell center at `(x, y)`.
    pub fn position_at(&self, x: i64, y: i64, orient: Orientation) -> (i64, i64) {
        let (dx, dy) = self.offset(orient);
        (x + dx, y + dy)
    }
}

/// The cell/net/pin arena consumed by the placement engine.
///
/// Built once from the design-database snapshot; cell positions and
/// orientations are the only fields mutated during optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Netlist {
    /// All cells.
    pub cells: Vec<Cell>,
    /// All nets.
    pub nets: Vec<Net>,
    /// All pins.
    pub pins: Vec<Pin>,
    /// Auxiliary index: cell name to ID (rebuilt on deserialization).
    #[serde(skip)]
    pub cell_by_name: HashMap<String, CellId>,
    /// Auxiliary index: cell to owned pins (rebuilt on deserialization).
    #[serde(skip)]
    pub pins_by_cell: Vec<Vec<PinId>>,
}

impl Netlist {
    /// Creates an empty netlist.
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            nets: Vec::new(),
            pins: Vec::new(),
            cell_by_name: HashMap::new(),
            pins_by_cell: Vec::new(),
        }
    }

    /// Adds a cell and returns its ID.
    pub fn add_cell(&mut self, mut cell: Cell) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        cell.id = id;
        self.cell_by_name.insert(cell.name.clone(), id);
        self.cells.push(cell);
        self.pins_by_cell.push(Vec::new());
        id
    }

    /// Adds a net and returns its ID.
    pub fn add_net(&mut self, mut net: Net) -> NetId {
        let id = NetId::from_raw(self.nets.len() as u32);
        net.id = id;
        self.nets.push(net);
        id
    }

    /// Adds a pin, registers it on its net and cell, and returns its ID.
    pub fn add_pin(&mut self, mut pin: Pin) -> PinId {
        let id = PinId::from_raw(self.pins.len() as u32);
        pin.id = id;
        let net = pin.net;
        let cell = pin.cell;
        self.pins.push(pin);
        self.nets[net.as_raw() as usize].pins.push(id);
        self.pins_by_cell[cell.as_raw() as usize].push(id);
        id
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the cell with the given ID.
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.as_raw() as usize]
    }

    /// Returns the net with the given ID.
    pub fn net(&self, id: NetId) -> &Net {
        &self.nets[id.as_raw() as usize]
    }

    /// Returns the pin with the given ID.
    pub fn pin(&self, id: PinId) -> &Pin {
        &self.pins[id.as_raw() as usize]
    }

    /// Returns the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns the number of pins.
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Iterates over the IDs of all pins owned by a cell.
    pub fn pins_of_cell(&self, cell: CellId) -> impl Iterator<Item = PinId> + '_ {
        self.pins_by_cell
            .get(cell.as_raw() as usize)
            .into_iter()
            .flatten()
            .copied()
    }

    /// Iterates over all movable (not fully fixed) cells.
    pub fn movable_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_movable())
    }

    /// Rebuilds auxiliary indices after deserialization.
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        for (i, cell) in self.cells.iter().enumerate() {
            self.cell_by_name
                .insert(cell.name.clone(), CellId::from_raw(i as u32));
        }
        self.pins_by_cell.clear();
        self.pins_by_cell.resize(self.cells.len(), Vec::new());
        for pin in &self.pins {
            self.pins_by_cell[pin.cell.as_raw() as usize].push(pin.id);
        }
    }
}

impl Default for Netlist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn make_cell(name: &str, x: i64, y: i64) -> Cell {
        Cell {
            id: CellId::from_raw(0),
            name: name.into(),
            width: 4,
            height: 10,
            x,
            y,
            orient: Orientation::N,
            mobility: Mobility::Movable,
            region: RegionId::DEFAULT,
            edge_left: 0,
            edge_right: 0,
            bottom_rail: None,
            top_rail: None,
        }
    }

    #[test]
    fn empty_netlist() {
        let nl = Netlist::new();
        assert_eq!(nl.cell_count(), 0);
        assert_eq!(nl.net_count(), 0);
        assert_eq!(nl.pin_count(), 0);
    }

    #[test]
    fn add_cell() {
        let mut nl = Netlist::new();
        let id = nl.add_cell(make_cell("u1", 10, 5));
        assert_eq!(nl.cell_count(), 1);
        assert_eq!(nl.cell(id).name, "u1");
        assert_eq!(nl.cell_by_name.get("u1"), Some(&id));
    }

    #[test]
    fn cell_edges() {
        let cell = make_cell("u1", 10, 5);
        assert_eq!(cell.left(), 8);
        assert_eq!(cell.right(), 12);
        assert_eq!(cell.bottom(), 0);
        assert_eq!(cell.top(), 10);
    }

    #[test]
    fn mobility_flags() {
        let mut cell = make_cell("u1", 0, 0);
        assert!(cell.is_movable());
        assert!(!cell.is_fixed());
        cell.mobility = Mobility::Fixed;
        assert!(cell.is_fixed());
        cell.mobility = Mobility::FixedX;
        assert!(cell.is_movable());
    }

    #[test]
    fn edge_classes_follow_orientation() {
        let mut cell = make_cell("u1", 0, 0);
        cell.edge_left = 1;
        cell.edge_right = 2;
        assert_eq!(cell.left_edge_class(), 1);
        assert_eq!(cell.right_edge_class(), 2);
        cell.orient = Orientation::Fn;
        assert_eq!(cell.left_edge_class(), 2);
        assert_eq!(cell.right_edge_class(), 1);
    }

    #[test]
    fn add_pin_registers_on_net() {
        let mut nl = Netlist::new();
        let c = nl.add_cell(make_cell("u1", 0, 0));
        let n = nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "n1".into(),
            pins: Vec::new(),
        });
        let p = nl.add_pin(Pin {
            id: PinId::from_raw(0),
            name: "A".into(),
            cell: c,
            net: n,
            dx: 1,
            dy: -2,
        });
        assert_eq!(nl.net(n).pins, vec![p]);
        assert_eq!(nl.pin(p).cell, c);
    }

    #[test]
    fn pin_offset_rotates() {
        let pin = Pin {
            id: PinId::from_raw(0),
            name: "A".into(),
            cell: CellId::from_raw(0),
            net: NetId::from_raw(0),
            dx: 1,
            dy: 2,
        };
        assert_eq!(pin.offset(Orientation::N), (1, 2));
        assert_eq!(pin.offset(Orientation::Fn), (-1, 2));
        assert_eq!(pin.position_at(10, 20, Orientation::S), (9, 18));
    }

    #[test]
    fn pins_of_cell_filters() {
        let mut nl = Netlist::new();
        let c0 = nl.add_cell(make_cell("u0", 0, 0));
        let c1 = nl.add_cell(make_cell("u1", 8, 0));
        let n = nl.add_net(Net {
            id: NetId::from_raw(0),
            name: "n".into(),
            pins: Vec::new(),
        });
        for (c, name) in [(c0, "A"), (c0, "Y"), (c1, "A")] {
            nl.add_pin(Pin {
                id: PinId::from_raw(0),
                name: name.into(),
                cell: c,
                net: n,
                dx: 0,
                dy: 0,
            });
        }
        assert_eq!(nl.pins_of_cell(c0).count(), 2);
        assert_eq!(nl.pins_of_cell(c1).count(), 1);
    }

    #[test]
    fn movable_cells_excludes_fixed() {
        let mut nl = Netlist::new();
        nl.add_cell(make_cell("u0", 0, 0));
        let mut fixed = make_cell("pad", 50, 0);
        fixed.mobility = Mobility::Fixed;
        nl.add_cell(fixed);
        assert_eq!(nl.movable_cells().count(), 1);
    }

    #[test]
    fn rebuild_indices() {
        let mut nl = Netlist::new();
        nl.add_cell(make_cell("u1", 0, 0));
        nl.cell_by_name.clear();
        nl.rebuild_indices();
        assert!(nl.cell_by_name.contains_key("u1"));
    }

    #[test]
    fn serde_roundtrip() {
        let mut nl = Netlist::new();
        nl.add_cell(make_cell("u1", 10, 5));
        let json = serde_json::to_string(&nl).unwrap();
        let mut restored: Netlist = serde_json::from_str(&json).unwrap();
        restored.rebuild_indices();
        assert_eq!(restored.cell_count(), 1);
        assert!(restored.cell_by_name.contains_key("u1"));
    }
}
