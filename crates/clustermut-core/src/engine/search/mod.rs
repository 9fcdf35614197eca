//! Candidate placement search for the unit being relocated.
//!
//! Every strategy proposes positions for the mover's center of mass, tries
//! each one in place on a working geometry, and keeps only those that pass
//! the collision (and optional dissociation) test. Placement is always
//! undone before the candidates are returned.

mod grid;
mod partner;
mod surface;

use super::backend::SurfaceDetector;
use super::config::SearchStrategy;
use super::error::EngineError;
use super::metrics::MutationMetrics;
use super::selection::Selection;
use super::workspace::{MutationWorkspace, Validator};
use crate::core::models::bonds::BondInfo;
use crate::core::models::geometry::Geometry;
use crate::core::models::unit::MolecularUnit;
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use tracing::debug;

pub use grid::{GridBox, scale_coms};

/// A proposed new location, and possibly orientation, for a unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidatePoint {
    pub com: Point3<f64>,
    /// `None` keeps the unit's current orientation.
    pub orientation: Option<Vector3<f64>>,
}

impl CandidatePoint {
    pub fn at(com: Point3<f64>) -> Self {
        Self {
            com,
            orientation: None,
        }
    }

    pub fn oriented(com: Point3<f64>, orientation: Vector3<f64>) -> Self {
        Self {
            com,
            orientation: Some(orientation),
        }
    }

    pub fn apply_to(&self, unit: &mut MolecularUnit) {
        unit.set_com(self.com);
        if let Some(orientation) = self.orientation {
            unit.set_orientation(orientation);
        }
    }
}

/// Working geometry with one unit that can be moved around and tested.
pub(crate) struct PlacementView<'g, 'v> {
    geometry: &'g mut Geometry,
    workspace: &'g mut MutationWorkspace,
    bonds: Arc<BondInfo>,
    validator: Validator<'v>,
    metrics: &'g MutationMetrics,
    unit: usize,
    original: CandidatePoint,
}

impl<'g, 'v> PlacementView<'g, 'v> {
    pub fn new(
        geometry: &'g mut Geometry,
        workspace: &'g mut MutationWorkspace,
        validator: Validator<'v>,
        metrics: &'g MutationMetrics,
        unit: usize,
    ) -> Result<Self, EngineError> {
        let len = geometry.num_units();
        let current = geometry
            .unit(unit)
            .ok_or(EngineError::UnitOutOfRange { index: unit, len })?;
        let original = CandidatePoint::oriented(current.com(), current.orientation());
        workspace.load(geometry);
        Ok(Self {
            bonds: geometry.shared_bonds(),
            geometry,
            workspace,
            validator,
            metrics,
            unit,
            original,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        self.geometry
    }

    pub fn unit(&self) -> &MolecularUnit {
        &self.geometry.units()[self.unit]
    }

    /// Center of mass of the unit before any trial placement.
    pub fn origin(&self) -> Point3<f64> {
        self.original.com
    }

    /// Places the unit at `candidate` and reports whether the geometry is valid.
    /// The unit stays there until the next trial or [`restore`](Self::restore).
    pub fn try_place(&mut self, candidate: &CandidatePoint) -> bool {
        if let Some(unit) = self.geometry.unit_mut(self.unit) {
            candidate.apply_to(unit);
        }
        self.workspace.refresh_unit(self.geometry, self.unit);
        let accepted = self
            .workspace
            .accepts(&self.bonds, &self.validator, self.metrics);
        self.metrics.record_candidate(accepted);
        accepted
    }

    pub fn restore(self) {
        if let Some(unit) = self.geometry.unit_mut(self.unit) {
            self.original.apply_to(unit);
        }
        self.workspace.refresh_unit(self.geometry, self.unit);
    }
}

/// Enumerates valid candidate positions for `selection.mover`.
///
/// `geometry` is left as it was found. The bounding-box grid's scale factor
/// is not applied here; callers scale the centers once with [`scale_coms`]
/// before the first search.
pub fn generate(
    strategy: &SearchStrategy,
    geometry: &mut Geometry,
    selection: &Selection,
    surface: Option<&dyn SurfaceDetector>,
    workspace: &mut MutationWorkspace,
    validator: Validator<'_>,
    metrics: &MutationMetrics,
) -> Result<Vec<CandidatePoint>, EngineError> {
    let candidates = match *strategy {
        SearchStrategy::BoundingBoxGrid {
            range_mod_factor, ..
        } => {
            let mut view =
                PlacementView::new(geometry, workspace, validator, metrics, selection.mover)?;
            let found = grid::scan(&mut view, range_mod_factor);
            view.restore();
            found
        }
        SearchStrategy::SurfaceRadial | SearchStrategy::SurfaceTriangulated => {
            let detector = surface.ok_or(EngineError::MissingCollaborator("surface detector"))?;
            let surface_units = super::backend::surface_units(detector, geometry, Some(selection.mover));
            let mut view =
                PlacementView::new(geometry, workspace, validator, metrics, selection.mover)?;
            let found = if matches!(strategy, SearchStrategy::SurfaceRadial) {
                surface::radial(&mut view, &surface_units)
            } else {
                surface::triangulated(&mut view, &surface_units)
            };
            view.restore();
            found
        }
        SearchStrategy::PartnerGrid {
            half_length,
            increment,
            euler_increment,
        } => {
            let Some(partner) = selection.partner else {
                return Ok(Vec::new());
            };
            let mut view =
                PlacementView::new(geometry, workspace, validator, metrics, selection.mover)?;
            let found = partner::scan(&mut view, partner, half_length, increment, euler_increment);
            view.restore();
            found
        }
    };

    debug!(
        strategy = ?strategy,
        mover = selection.mover,
        valid = candidates.len(),
        "Candidate search finished."
    );
    Ok(candidates)
}
