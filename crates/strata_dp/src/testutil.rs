//! Shared fixtures for the engine's unit tests.

use crate::config::EngineConfig;
use crate::mgr::SegmentMgr;
use strata_arch::{
    Architecture, EdgeSpacingTable, Orientation, RailPolarity, Rect, Region, RegionId, Row, RowId,
};
use strata_diagnostics::DiagnosticSink;
use strata_net::{Cell, CellId, Mobility, Net, NetId, Netlist, Pin, PinId};

/// A stack of `n` rows, each `[0, 100) × 10` tall with site pitch 2.
pub(crate) fn grid_arch(n: u32) -> Architecture {
    let rows = (0..n)
        .map(|i| Row {
            id: RowId::from_raw(i),
            y: i as i64 * 10,
            height: 10,
            site_pitch: 2,
            origin_x: 0,
            site_count: 50,
            bottom_rail: if i % 2 == 0 {
                RailPolarity::Vss
            } else {
                RailPolarity::Vdd
            },
            top_rail: if i % 2 == 0 {
                RailPolarity::Vdd
            } else {
                RailPolarity::Vss
            },
        })
        .collect();
    Architecture {
        rows,
        regions: vec![Region {
            id: RegionId::DEFAULT,
            rects: vec![Rect::new(0, 0, 100, n as i64 * 10)],
        }],
        spacing: EdgeSpacingTable::empty(1),
        obstacles: Vec::new(),
    }
}

/// A single row `[0, 100)` with site pitch 2 and a trivial spacing table.
pub(crate) fn single_row_arch() -> Architecture {
    grid_arch(1)
}

/// Like [`single_row_arch`] but with two edge classes and a class-1/class-1
/// minimum gap of 4.
pub(crate) fn single_row_arch_with_spacing() -> Architecture {
    let mut arch = grid_arch(1);
    let mut spacing = EdgeSpacingTable::empty(2);
    spacing.set(1, 1, 4);
    arch.spacing = spacing;
    arch
}

/// A movable width-8, height-10 cell centered at `(x, y)`.
pub(crate) fn make_cell(name: &str, x: i64, y: i64) -> Cell {
    Cell {
        id: CellId::from_raw(0),
        name: name.into(),
        width: 8,
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

/// Sets up a manager over a single row holding width-8 cells centered at the
/// given x coordinates (all at y = 5).
pub(crate) fn place_cells(centers: &[i64]) -> (SegmentMgr, Vec<CellId>) {
    let arch = single_row_arch();
    let mut netlist = Netlist::new();
    let cells: Vec<CellId> = centers
        .iter()
        .enumerate()
        .map(|(i, &x)| netlist.add_cell(make_cell(&format!("u{i}"), x, 5)))
        .collect();
    let sink = DiagnosticSink::new();
    let mgr = SegmentMgr::setup(arch, netlist, EngineConfig::default(), &sink).unwrap();
    (mgr, cells)
}

/// Like [`place_cells`] but also wires consecutive cell pairs with two-pin
/// nets (pin offsets at the cell center), for wirelength tests.
pub(crate) fn place_connected_cells(centers: &[i64]) -> (SegmentMgr, Vec<CellId>) {
    let arch = single_row_arch();
    let mut netlist = Netlist::new();
    let cells: Vec<CellId> = centers
        .iter()
        .enumerate()
        .map(|(i, &x)| netlist.add_cell(make_cell(&format!("u{i}"), x, 5)))
        .collect();
    for pair in cells.windows(2) {
        let net = netlist.add_net(Net {
            id: NetId::from_raw(0),
            name: format!("n{}", pair[0]),
            pins: Vec::new(),
        });
        for &cell in pair {
            netlist.add_pin(Pin {
                id: PinId::from_raw(0),
                name: "P".into(),
                cell,
                net,
                dx: 0,
                dy: 0,
            });
        }
    }
    let sink = DiagnosticSink::new();
    let mgr = SegmentMgr::setup(arch, netlist, EngineConfig::default(), &sink).unwrap();
    (mgr, cells)
}
