use super::{format_breakdown, read_structure, write_structure};
use crate::cli::MinimizeArgs;
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::MinimizationProgress;
use molmin::engine::progress::ProgressReporter;
use molmin::workflows;
use tracing::{info, warn};

pub fn run(args: MinimizeArgs) -> Result<()> {
    let partial_config = PartialRunConfig::from_optional_file(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.force_field, &args.tuning)?;

    let mut molecule = read_structure(&args.input)?;

    let progress = MinimizationProgress::new();
    let reporter = ProgressReporter::with_callback(progress.callback());

    println!(
        "Minimizing '{}' ({} atoms) with '{}'...",
        molecule.name(),
        molecule.size(),
        config.force_field
    );
    let result = workflows::minimize::run(&mut molecule, &config, &reporter)?;

    if !result.report.converged {
        warn!(
            "Optimization stopped after {} iterations without reaching the tolerance.",
            result.report.iterations
        );
        println!(
            "Warning: not converged after {} iterations (RMS gradient {:.4}).",
            result.report.iterations, result.report.rms_gradient
        );
    }

    write_structure(&molecule, &args.output)?;

    println!(
        "✓ Energy {:.4} -> {:.4} kcal/mol in {} iterations (RMS gradient {:.4}).",
        result.initial_energy,
        result.final_energy,
        result.report.iterations,
        result.report.rms_gradient
    );
    println!("{}", format_breakdown(&result.breakdown));
    println!("Minimized structure written to: {}", args.output.display());
    Ok(())
}
