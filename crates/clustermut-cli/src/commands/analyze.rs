use crate::cli::AnalyzeArgs;
use crate::error::{CliError, Result};
use crate::utils::files::read_geometry;
use clustermut::core::collision::Collision;
use clustermut::core::connectivity::{self, ConnectivityRanking};
use clustermut::core::dissociation::GraphDissociation;
use clustermut::core::models::geometry::Geometry;
use clustermut::engine::workspace::{DissociationCheck, MutationWorkspace};
use std::fmt;
use tracing::info;

/// Validity summary of one cluster geometry.
#[derive(Debug)]
pub struct AnalysisReport {
    pub units: usize,
    pub symbols: Vec<String>,
    pub collisions: Vec<Collision>,
    pub dissociated: bool,
    pub ranking: ConnectivityRanking,
}

pub fn run(args: AnalyzeArgs) -> Result<()> {
    for (name, value) in [
        ("collision blow factor", args.collision_blow_factor),
        ("bond blow factor", args.bond_blow_factor),
        ("dissociation blow factor", args.dissociation_blow_factor),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(CliError::Argument(format!(
                "The {} must be a positive number, got {}.",
                name, value
            )));
        }
    }

    info!("Loading cluster from {:?}", &args.input);
    let geometry = read_geometry(&args.input)?;
    let report = analyze(&geometry, &args);
    info!(
        collisions = report.collisions.len(),
        dissociated = report.dissociated,
        "Analysis finished."
    );
    print!("{}", report);
    Ok(())
}

pub fn analyze(geometry: &Geometry, args: &AnalyzeArgs) -> AnalysisReport {
    let mut workspace = MutationWorkspace::with_capacity(geometry.num_atoms());
    workspace.load(geometry);
    let collisions = workspace
        .collision_report(
            geometry.bonds(),
            args.collision_detection.into(),
            args.collision_blow_factor,
        )
        .collisions()
        .to_vec();
    let dissociated = workspace.is_dissociated(&DissociationCheck {
        predicate: &GraphDissociation,
        blow_factor: args.dissociation_blow_factor,
    });

    AnalysisReport {
        units: geometry.num_units(),
        symbols: geometry.atoms().map(|a| a.symbol.clone()).collect(),
        collisions,
        dissociated,
        ranking: connectivity::rank(geometry, args.bond_blow_factor),
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Units: {}, atoms: {}", self.units, self.symbols.len())?;
        if self.collisions.is_empty() {
            writeln!(f, "Collisions: none")?;
        } else {
            writeln!(f, "Collisions: {}", self.collisions.len())?;
            for c in &self.collisions {
                writeln!(
                    f,
                    "  {}{} - {}{}  {:.4} A",
                    self.symbols[c.first], c.first, self.symbols[c.second], c.second, c.distance
                )?;
            }
        }
        writeln!(
            f,
            "Dissociated: {}",
            if self.dissociated { "yes" } else { "no" }
        )?;
        writeln!(f, "Connectivity (least connected first):")?;
        for entry in self.ranking.entries() {
            writeln!(f, "  unit {:>4}: {} contact(s)", entry.unit, entry.contacts)?;
        }
        Ok(())
    }
}
