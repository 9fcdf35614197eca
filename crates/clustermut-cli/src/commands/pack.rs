use crate::cli::PackArgs;
use crate::config;
use crate::error::Result;
use crate::utils::files::{generate_output_path, read_geometry, write_geometry};
use crate::utils::progress::CliProgressHandler;
use clustermut::engine::{
    context::MutationContext, error::EngineError, metrics::MutationMetrics, progress::Progress,
    workspace::MutationWorkspace,
};
use clustermut::workflows::pack::{PackingMutation, PackingResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

pub fn run(args: PackArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app = config::build_config(&args)?;
    debug!("Packing configuration:\n{}", app.core_config);

    info!("Loading input cluster from {:?}", &app.input_path);
    let geometry = read_geometry(&app.input_path)?;
    info!(
        units = geometry.num_units(),
        atoms = geometry.num_atoms(),
        "Input cluster loaded."
    );

    let seed = app.seed.unwrap_or_else(|| rand::thread_rng().r#gen());
    info!(seed, count = app.count, "Seeding structure generators.");

    let operator = PackingMutation::new(app.core_config.clone());
    let metrics = MutationMetrics::new();
    let handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = handler.reporter();

    println!(
        "Packing {} structure(s) from {} unit(s)...",
        app.count,
        geometry.num_units()
    );
    let phase = reporter.phase("Packing structures");
    reporter.report(Progress::TaskStart {
        total_steps: app.count as u64,
    });
    let results = (0..app.count)
        .into_par_iter()
        .map_init(MutationWorkspace::new, |workspace, i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let context = MutationContext::new(&metrics);
            let result = operator.pack(&geometry, None, &context, workspace, &mut rng);
            reporter.report(Progress::TaskIncrement);
            result
        })
        .collect::<std::result::Result<Vec<PackingResult>, EngineError>>()?;
    reporter.report(Progress::TaskFinish);
    drop(phase);

    let snapshot = metrics.snapshot();
    info!(
        collision_checks = snapshot.collision_checks,
        "Workflow finished, received {} structure(s).",
        results.len()
    );

    for (i, result) in results.iter().enumerate() {
        let output_path = generate_output_path(&app.output_template, i + 1, results.len());
        let structure_seed = seed.wrapping_add(i as u64);
        let title = format!("packed structure {} (seed {})", i + 1, structure_seed);
        write_geometry(&result.geometry, app.format, &title, &output_path)?;

        let report = &result.report;
        info!(
            structure = i + 1,
            inflations = report.inflations,
            resets = report.resets,
            "Wrote {:?}",
            &output_path
        );
        if report.is_complete() {
            println!("  Structure {} written to: {}", i + 1, output_path.display());
        } else {
            warn!(
                structure = i + 1,
                exhausted = ?report.exhausted_units,
                "Structure contains units without a valid placement."
            );
            println!(
                "  Structure {} written to: {} (units {:?} could not be placed validly)",
                i + 1,
                output_path.display(),
                report.exhausted_units
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    const ARGON_TRIMER: &str = r#"
        title = "argon trimer"

        [[units]]
        atoms = [{ symbol = "Ar", position = [0.0, 0.0, 0.0] }]

        [[units]]
        atoms = [{ symbol = "Ar", position = [5.0, 0.0, 0.0] }]

        [[units]]
        atoms = [{ symbol = "Ar", position = [0.0, 5.0, 0.0] }]
    "#;

    fn args_for(input: PathBuf, output: PathBuf) -> PackArgs {
        PackArgs {
            input,
            output,
            config: None,
            format: None,
            count: None,
            seed: Some(17),
            order: None,
            box_increment: None,
            max_resets: None,
            collision_detection: None,
            set_values: vec![],
        }
    }

    #[test]
    fn packs_several_seeded_structures_to_numbered_files() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trimer.toml");
        fs::write(&input, ARGON_TRIMER).unwrap();

        let mut args = args_for(input, dir.path().join("packed.xyz"));
        args.count = Some(3);
        run(args, true).unwrap();

        for i in 1..=3 {
            let path = dir.path().join(format!("packed_{}.xyz", i));
            let packed = read_geometry(&path).unwrap();
            assert_eq!(packed.num_atoms(), 3);
            assert!(packed.coms().iter().all(|c| c.z.abs() < 1e-9));
        }
    }

    #[test]
    fn identical_seeds_write_identical_files() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("trimer.toml");
        fs::write(&input, ARGON_TRIMER).unwrap();

        let first = dir.path().join("a.toml");
        let second = dir.path().join("b.toml");
        let mut args = args_for(input.clone(), first.clone());
        args.format = Some(OutputFormat::Toml);
        run(args, true).unwrap();
        run(args_for(input, second.clone()), true).unwrap();

        assert_eq!(
            fs::read_to_string(first).unwrap(),
            fs::read_to_string(second).unwrap()
        );
    }
}
