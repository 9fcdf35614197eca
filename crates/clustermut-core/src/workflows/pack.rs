use super::mutate::{GeometryMutation, MutationOutcome};
use crate::core::models::geometry::Geometry;
use crate::engine::config::PackingConfig;
use crate::engine::context::MutationContext;
use crate::engine::error::EngineError;
use crate::engine::packing::{Packer, PackingReport};
use crate::engine::workspace::MutationWorkspace;
use rand::RngCore;
use tracing::{debug, info, instrument, warn};

/// External structure a packed cluster is placed against, such as a surface.
pub trait Environment {
    /// Draws a fresh placement of the cluster relative to the environment.
    fn initialize(&mut self, geometry: &Geometry, rng: &mut dyn RngCore);

    /// Whether the current placement is free of collisions with the environment.
    fn fits(&self, geometry: &Geometry, blow_factor: f64) -> bool;
}

#[derive(Debug, Clone)]
pub struct PackingResult {
    pub geometry: Geometry,
    pub report: PackingReport,
}

/// Builds a whole new geometry from the units of its input.
#[derive(Debug, Clone)]
pub struct PackingMutation {
    config: PackingConfig,
}

impl PackingMutation {
    pub fn new(config: PackingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    /// Packs `geometry` from scratch and fits it to `environment`, if any.
    ///
    /// Environment placement is redrawn until it fits or
    /// `max_environment_attempts` is reached. In the latter case the last
    /// placement is kept.
    #[instrument(skip_all, name = "packing_workflow")]
    pub fn pack(
        &self,
        geometry: &Geometry,
        environment: Option<&mut dyn Environment>,
        context: &MutationContext<'_>,
        workspace: &mut MutationWorkspace,
        rng: &mut dyn RngCore,
    ) -> Result<PackingResult, EngineError> {
        let reporter = context.reporter;
        info!(units = geometry.num_units(), "Starting packing workflow.");

        let (packed, mut report) = {
            let _phase = reporter.phase("Incremental packing");
            Packer::new(&self.config, *context).pack(geometry, workspace, rng)?
        };

        if !report.is_complete() {
            warn!(
                exhausted = ?report.exhausted_units,
                "Some units could not be placed validly."
            );
        }

        if let Some(environment) = environment {
            let _phase = reporter.phase("Environment fitting");
            let cap = self.config.max_environment_attempts;
            loop {
                environment.initialize(&packed, rng);
                report.environment_attempts += 1;
                if environment.fits(&packed, self.config.collision_blow_factor) {
                    debug!(attempts = report.environment_attempts, "Environment fits.");
                    break;
                }
                if report.environment_attempts >= cap {
                    warn!(
                        attempts = cap,
                        "No collision-free environment placement found; keeping the last one."
                    );
                    break;
                }
            }
        }

        Ok(PackingResult {
            geometry: packed,
            report,
        })
    }
}

impl GeometryMutation for PackingMutation {
    fn description(&self) -> String {
        self.config.to_string()
    }

    fn mutate(
        &self,
        geometry: &Geometry,
        context: &MutationContext<'_>,
        workspace: &mut MutationWorkspace,
        rng: &mut dyn RngCore,
    ) -> Result<MutationOutcome, EngineError> {
        let result = self.pack(geometry, None, context, workspace, rng)?;
        context.metrics.record_commit();
        Ok(MutationOutcome::Mutated(result.geometry))
    }
}
