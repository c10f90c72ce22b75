//! Candidate-move generators.
//!
//! Generators propose one candidate move given current state: a relocation
//! into a nearby segment or a pairwise swap of compatible cells, with targets
//! resolved through the manager's closest-segment queries. The set of
//! generators is fixed at build time and dispatched as a closed enum. A
//! generator returns `None` when no plausible target is found within its
//! attempt budget; fixed cells are never candidates.

use crate::config::EngineConfig;
use crate::mgr::{align_down, SegmentMgr};
use crate::proposal::{CellState, MoveEntry, MoveProposal};
use rand::Rng;
use strata_net::{CellId, Mobility};

/// Maximum relocation jump, in sites, of the random generator.
const MAX_JUMP_SITES: i64 = 16;

/// Candidates sampled per draw by the displacement generator.
const SAMPLE_SIZE: usize = 4;

/// The closed set of candidate-move generators.
pub enum Generator {
    /// Uniform random relocations and swaps.
    Random(RandomGenerator),
    /// Relocations of the most displaced cells back toward their origin.
    Displacement(DisplacementGenerator),
}

impl Generator {
    /// Resolves a generator by its script name (`rng`, `disp`).
    pub fn from_name(name: &str, config: &EngineConfig) -> Option<Self> {
        match name {
            "rng" | "random" => Some(Generator::Random(RandomGenerator {
                attempts: config.attempt_budget,
            })),
            "disp" | "displacement" => Some(Generator::Displacement(DisplacementGenerator {
                attempts: config.attempt_budget,
            })),
            _ => None,
        }
    }

    /// The script name of this generator.
    pub fn name(&self) -> &'static str {
        match self {
            Generator::Random(_) => "rng",
            Generator::Displacement(_) => "disp",
        }
    }

    /// Proposes one candidate move, or `None` if the attempt budget runs out.
    pub fn propose(
        &mut self,
        rng: &mut impl Rng,
        mgr: &SegmentMgr,
        candidates: &[CellId],
    ) -> Option<MoveProposal> {
        match self {
            Generator::Random(inner) => inner.propose(rng, mgr, candidates),
            Generator::Displacement(inner) => inner.propose(rng, mgr, candidates),
        }
    }
}

/// Proposes uniform random relocations and pairwise swaps.
pub struct RandomGenerator {
    attempts: usize,
}

impl RandomGenerator {
    fn propose(
        &mut self,
        rng: &mut impl Rng,
        mgr: &SegmentMgr,
        candidates: &[CellId],
    ) -> Option<MoveProposal> {
        if candidates.is_empty() {
            return None;
        }
        for _ in 0..self.attempts {
            let cell = candidates[rng.gen_range(0..candidates.len())];
            if mgr.segments_of_cell(cell).is_empty() {
                continue;
            }

            if rng.gen_bool(0.5) {
                let c = mgr.netlist().cell(cell);
                let row = mgr.arch().row(mgr.segment(mgr.segments_of_cell(cell)[0]).row);
                let tx = c.x + rng.gen_range(-MAX_JUMP_SITES..=MAX_JUMP_SITES) * row.site_pitch;
                let ty = c.y
                    + rng.gen_range(-(mgr.config().scan_rows as i64)..=mgr.config().scan_rows as i64)
                        * row.height;
                if let Some(p) = relocation_toward(mgr, cell, tx, ty) {
                    if relocation_feasible(mgr, &p) {
                        return Some(p);
                    }
                }
            } else {
                let other = candidates[rng.gen_range(0..candidates.len())];
                if let Some(p) = swap_proposal(mgr, cell, other) {
                    return Some(p);
                }
            }
        }
        None
    }
}

/// Proposes relocations of highly displaced cells toward their setup position.
pub struct DisplacementGenerator {
    attempts: usize,
}

impl DisplacementGenerator {
    fn propose(
        &mut self,
        rng: &mut impl Rng,
        mgr: &SegmentMgr,
        candidates: &[CellId],
    ) -> Option<MoveProposal> {
        if candidates.is_empty() {
            return None;
        }
        for _ in 0..self.attempts {
            // Sample a few candidates and chase the most displaced one.
            let mut best: Option<(i64, CellId)> = None;
            for _ in 0..SAMPLE_SIZE {
                let cell = candidates[rng.gen_range(0..candidates.len())];
                if mgr.segments_of_cell(cell).is_empty() {
                    continue;
                }
                let c = mgr.netlist().cell(cell);
                let (ox, oy) = mgr.original_position(cell);
                let d = (c.x - ox).abs() + (c.y - oy).abs();
                if d > 0 && best.map_or(true, |(b, _)| d > b) {
                    best = Some((d, cell));
                }
            }
            let Some((_, cell)) = best else { continue };
            let (ox, oy) = mgr.original_position(cell);
            if let Some(p) = relocation_toward(mgr, cell, ox, oy) {
                if relocation_feasible(mgr, &p) {
                    return Some(p);
                }
            }
        }
        None
    }
}

/// Builds a single-cell relocation proposal targeting `(tx, ty)`, resolved to
/// the nearest hosting segment (or stacked span for multi-row cells).
fn relocation_toward(mgr: &SegmentMgr, cell: CellId, tx: i64, ty: i64) -> Option<MoveProposal> {
    let c = mgr.netlist().cell(cell);
    let old = mgr.cell_state(cell);
    if old.segments.is_empty() {
        return None;
    }

    let segments = if old.segments.len() <= 1 {
        vec![mgr.find_segment_near(cell, tx, ty)?]
    } else {
        mgr.find_span_near(cell, tx, ty)?
    };

    // Common free interval across the (stacked) target segments.
    let mut lo = i64::MIN;
    let mut hi = i64::MAX;
    for &sid in &segments {
        let seg = mgr.segment(sid);
        lo = lo.max(seg.x_min);
        hi = hi.min(seg.x_max);
    }
    if hi - lo < c.width {
        return None;
    }

    let bottom_row = mgr.arch().row(mgr.segment(segments[0]).row);
    let left = align_down((tx - c.width / 2).clamp(lo, hi - c.width), bottom_row);
    if left < lo {
        return None;
    }
    let x = left + c.width / 2;
    let y = bottom_row.y + c.height / 2;
    if x == old.x && y == old.y {
        return None;
    }

    let new = CellState {
        x,
        y,
        orient: old.orient,
        segments,
    };
    let mut proposal = MoveProposal::new();
    proposal.push(MoveEntry { cell, old, new });
    Some(proposal)
}

/// Cheap pre-stage feasibility check for a relocation: every target segment
/// must accept the cell at its proposed position.
fn relocation_feasible(mgr: &SegmentMgr, proposal: &MoveProposal) -> bool {
    proposal.entries().iter().all(|entry| {
        entry
            .new
            .segments
            .iter()
            .all(|&sid| mgr.test_insert(entry.cell, sid, entry.new.x).fits)
    })
}

/// Builds a pairwise position swap of two compatible cells, or `None` when
/// the pair cannot exchange slots.
fn swap_proposal(mgr: &SegmentMgr, a: CellId, b: CellId) -> Option<MoveProposal> {
    if a == b {
        return None;
    }
    let ca = mgr.netlist().cell(a);
    let cb = mgr.netlist().cell(b);
    let compatible = ca.mobility == Mobility::Movable
        && cb.mobility == Mobility::Movable
        && ca.width == cb.width
        && ca.height == cb.height
        && ca.region == cb.region
        && !mgr.segments_of_cell(a).is_empty()
        && !mgr.segments_of_cell(b).is_empty();
    if !compatible {
        return None;
    }

    let sa = mgr.cell_state(a);
    let sb = mgr.cell_state(b);
    let mut proposal = MoveProposal::new();
    proposal.push(MoveEntry {
        cell: a,
        old: sa.clone(),
        new: CellState {
            orient: sa.orient,
            ..sb.clone()
        },
    });
    proposal.push(MoveEntry {
        cell: b,
        old: sb.clone(),
        new: CellState {
            orient: sb.orient,
            ..sa
        },
    });
    Some(proposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn from_name_resolves_known_generators() {
        let config = EngineConfig::default();
        assert_eq!(Generator::from_name("rng", &config).unwrap().name(), "rng");
        assert_eq!(
            Generator::from_name("disp", &config).unwrap().name(),
            "disp"
        );
        assert!(Generator::from_name("teleport", &config).is_none());
    }

    #[test]
    fn random_generator_eventually_proposes() {
        let (mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut generator = Generator::from_name("rng", mgr.config()).unwrap();

        let mut proposed = false;
        for _ in 0..20 {
            if let Some(p) = generator.propose(&mut rng, &mgr, &cells) {
                assert!(!p.is_empty());
                proposed = true;
                break;
            }
        }
        assert!(proposed);
    }

    #[test]
    fn no_candidates_means_no_proposal() {
        let (mgr, _) = crate::testutil::place_cells(&[10, 50]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut generator = Generator::from_name("rng", mgr.config()).unwrap();
        assert!(generator.propose(&mut rng, &mgr, &[]).is_none());
    }

    #[test]
    fn swap_requires_compatible_cells() {
        let (mut mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        assert!(swap_proposal(&mgr, cells[0], cells[0]).is_none());
        assert!(swap_proposal(&mgr, cells[0], cells[1]).is_some());
        // Width mismatch breaks compatibility.
        mgr.netlist_mut().cell_mut(cells[1]).width = 12;
        assert!(swap_proposal(&mgr, cells[0], cells[1]).is_none());
    }

    #[test]
    fn swap_keeps_each_cells_orientation() {
        let (mut mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        mgr.netlist_mut().cell_mut(cells[0]).orient = strata_arch::Orientation::Fn;
        let p = swap_proposal(&mgr, cells[0], cells[1]).unwrap();
        assert_eq!(
            p.new_state_of(cells[0]).unwrap().orient,
            strata_arch::Orientation::Fn
        );
        assert_eq!(
            p.new_state_of(cells[1]).unwrap().orient,
            strata_arch::Orientation::N
        );
    }

    #[test]
    fn relocation_targets_are_site_aligned() {
        let (mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        let p = relocation_toward(&mgr, cells[0], 31, 5).unwrap();
        let new = p.new_state_of(cells[0]).unwrap();
        // Left edge on the pitch-2 grid.
        assert_eq!((new.x - 4) % 2, 0);
    }

    #[test]
    fn displacement_generator_chases_displaced_cells() {
        let (mut mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        // Displace cell 0 from its origin.
        let old = mgr.cell_state(cells[0]);
        let mut new = old.clone();
        new.x = 30;
        let mut p = MoveProposal::new();
        p.push(MoveEntry {
            cell: cells[0],
            old,
            new,
        });
        mgr.stage(p).unwrap();
        mgr.accept_move().unwrap();

        let mut rng = StdRng::seed_from_u64(3);
        let mut generator = Generator::from_name("disp", mgr.config()).unwrap();
        let proposal = generator.propose(&mut rng, &mgr, &cells).unwrap();
        let target = proposal.new_state_of(cells[0]).unwrap();
        // The proposal pulls cell 0 back toward x = 10.
        assert_eq!(target.x, 10);
    }

    #[test]
    fn displacement_generator_idle_on_undisplaced_placement() {
        let (mgr, cells) = crate::testutil::place_cells(&[10, 50]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut generator = Generator::from_name("disp", mgr.config()).unwrap();
        assert!(generator.propose(&mut rng, &mgr, &cells).is_none());
    }
}
