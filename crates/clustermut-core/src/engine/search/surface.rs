use super::{CandidatePoint, PlacementView};
use crate::core::utils::geometry::{centroid, push_outward};
use itertools::Itertools;
use nalgebra::Point3;
use tracing::trace;

/// Radial push, in units of the mover's diameter.
const OUTWARD_SCALE: f64 = 1.1;
/// Surface triangles with any side longer than this many diameters are skipped.
const TRIANGLE_CUTOFF_SCALE: f64 = 2.5;
/// Candidates closer than this (squared, in A^2) to the old position are skipped.
const MIN_DISPLACEMENT_SQ: f64 = 1.0;

fn far_from(origin: &Point3<f64>, point: &Point3<f64>) -> bool {
    (point - origin).norm_squared() > MIN_DISPLACEMENT_SQ
}

/// Projects every surface unit's center radially outwards by `1.1` mover diameters.
pub(super) fn radial(view: &mut PlacementView<'_, '_>, surface: &[usize]) -> Vec<CandidatePoint> {
    let push = OUTWARD_SCALE * view.unit().diameter();
    let origin = view.origin();
    let coms = view.geometry().coms();

    let mut found = Vec::new();
    for &index in surface {
        let Some(point) = push_outward(&coms[index], push) else {
            continue;
        };
        if !far_from(&origin, &point) {
            continue;
        }
        let candidate = CandidatePoint::at(point);
        if view.try_place(&candidate) {
            found.push(candidate);
        }
    }
    trace!(surface = surface.len(), valid = found.len(), "Radial surface projection done.");
    found
}

/// Tries the centroid of every compact triangle of surface units and, when
/// the centroid is unusable, the centroid pushed outwards by `1.1` diameters.
///
/// Each unordered triple is visited once.
pub(super) fn triangulated(
    view: &mut PlacementView<'_, '_>,
    surface: &[usize],
) -> Vec<CandidatePoint> {
    let diameter = view.unit().diameter();
    let cutoff = TRIANGLE_CUTOFF_SCALE * diameter;
    let cutoff_sq = cutoff * cutoff;
    let push = OUTWARD_SCALE * diameter;
    let origin = view.origin();
    let coms = view.geometry().coms();

    let mut found = Vec::new();
    let mut triangles = 0usize;
    for triple in surface.iter().copied().combinations(3) {
        let corners = [coms[triple[0]], coms[triple[1]], coms[triple[2]]];
        let compact = corners
            .iter()
            .tuple_combinations()
            .all(|(a, b)| (a - b).norm_squared() <= cutoff_sq);
        if !compact {
            continue;
        }
        triangles += 1;
        let Some(center) = centroid(&corners) else {
            continue;
        };

        if far_from(&origin, &center) {
            let candidate = CandidatePoint::at(center);
            if view.try_place(&candidate) {
                found.push(candidate);
                continue;
            }
        }

        let Some(pushed) = push_outward(&center, push) else {
            continue;
        };
        if far_from(&origin, &pushed) {
            let candidate = CandidatePoint::at(pushed);
            if view.try_place(&candidate) {
                found.push(candidate);
            }
        }
    }
    trace!(triangles, valid = found.len(), "Triangulated surface projection done.");
    found
}
