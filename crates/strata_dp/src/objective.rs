//! Pluggable move-cost objectives.
//!
//! The set of objectives is fixed and known at build time, so they form a
//! closed enum dispatched by exhaustive match rather than an open trait
//! hierarchy. Every objective exposes a total cost and a side-effect-free
//! incremental delta for a candidate move.

use crate::config::EngineConfig;
use crate::hpwl::HpwlObjective;
use crate::proposal::MoveProposal;
use strata_net::Netlist;

/// Total L1 displacement from the positions captured at construction.
pub struct DisplacementObjective {
    origin: Vec<(i64, i64)>,
}

impl DisplacementObjective {
    /// Captures the current cell positions as the displacement origin.
    pub fn new(netlist: &Netlist) -> Self {
        Self {
            origin: netlist.cells.iter().map(|c| (c.x, c.y)).collect(),
        }
    }

    /// Total current displacement of all movable cells.
    pub fn curr(&self, netlist: &Netlist) -> f64 {
        netlist
            .movable_cells()
            .map(|c| {
                let (ox, oy) = self.origin[c.id.as_raw() as usize];
                ((c.x - ox).abs() + (c.y - oy).abs()) as f64
            })
            .sum()
    }

    /// Signed displacement change of a candidate move.
    pub fn delta(&self, proposal: &MoveProposal) -> f64 {
        proposal
            .entries()
            .iter()
            .map(|e| {
                let (ox, oy) = self.origin[e.cell.as_raw() as usize];
                let before = (e.old.x - ox).abs() + (e.old.y - oy).abs();
                let after = (e.new.x - ox).abs() + (e.new.y - oy).abs();
                (after - before) as f64
            })
            .sum()
    }
}

/// The closed set of move-cost objectives.
pub enum Objective {
    /// Half-perimeter wirelength.
    Hpwl(HpwlObjective),
    /// L1 displacement from the setup placement.
    Displacement(DisplacementObjective),
}

impl Objective {
    /// Creates the HPWL objective with the configured fanout cutoff.
    pub fn hpwl(netlist: &Netlist, config: &EngineConfig) -> Self {
        Objective::Hpwl(HpwlObjective::new(netlist, config.skip_fanout_above))
    }

    /// Creates the displacement objective anchored at the current placement.
    pub fn displacement(netlist: &Netlist) -> Self {
        Objective::Displacement(DisplacementObjective::new(netlist))
    }

    /// Resolves an objective by its script name (`hpwl`, `disp`).
    pub fn from_name(name: &str, netlist: &Netlist, config: &EngineConfig) -> Option<Self> {
        match name {
            "hpwl" => Some(Self::hpwl(netlist, config)),
            "disp" => Some(Self::displacement(netlist)),
            _ => None,
        }
    }

    /// The script name of this objective.
    pub fn name(&self) -> &'static str {
        match self {
            Objective::Hpwl(_) => "hpwl",
            Objective::Displacement(_) => "disp",
        }
    }

    /// Total current cost.
    pub fn curr(&self, netlist: &Netlist) -> f64 {
        match self {
            Objective::Hpwl(obj) => obj.curr(netlist),
            Objective::Displacement(obj) => obj.curr(netlist),
        }
    }

    /// Signed cost change of a candidate move, with no side effects on
    /// placement state.
    pub fn delta(&mut self, netlist: &Netlist, proposal: &MoveProposal) -> f64 {
        match self {
            Objective::Hpwl(obj) => obj.delta(netlist, proposal),
            Objective::Displacement(obj) => obj.delta(proposal),
        }
    }
}
