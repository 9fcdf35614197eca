//! Choice of the unit to relocate and of its move partner.

use super::backend::EnergyEvaluation;
use super::config::UnitSelection;
use crate::core::connectivity::{self, ConnectivityRanking};
use crate::core::models::geometry::Geometry;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Unit that will be relocated.
    pub mover: usize,
    /// Least connected unit other than the mover.
    pub partner: Option<usize>,
}

/// Picks the next unit to move, skipping every unit in `excluded`.
///
/// [`UnitSelection::LeastConnected`] walks the connectivity ranking;
/// [`UnitSelection::HighestEnergy`] takes the largest contribution in
/// `energy`. The two are independent heuristics and may disagree. Returns
/// `None` when every unit is excluded.
pub fn select(
    strategy: UnitSelection,
    geometry: &Geometry,
    bond_blow_factor: f64,
    energy: &EnergyEvaluation,
    excluded: &[usize],
) -> Option<Selection> {
    let ranking = connectivity::rank(geometry, bond_blow_factor);
    let mover = match strategy {
        UnitSelection::LeastConnected => ranking.least_connected_excluding(excluded),
        UnitSelection::HighestEnergy => {
            energy.worst_unit((0..geometry.num_units()).filter(|u| !excluded.contains(u)))
        }
    }?;
    let selection = Selection {
        mover,
        partner: ranking.move_partner(mover),
    };
    log_selection(strategy, &ranking, energy, &selection);
    Some(selection)
}

fn log_selection(
    strategy: UnitSelection,
    ranking: &ConnectivityRanking,
    energy: &EnergyEvaluation,
    selection: &Selection,
) {
    let contacts = ranking
        .entries()
        .iter()
        .find(|e| e.unit == selection.mover)
        .map(|e| e.contacts);
    debug!(
        heuristic = ?strategy,
        mover = selection.mover,
        partner = ?selection.partner,
        contacts = ?contacts,
        unit_energy = ?energy.unit_energies.get(selection.mover),
        "Selected unit to relocate."
    );
}
