use super::{format_breakdown, read_structure};
use crate::cli::{EnergyArgs, TuningArgs};
use crate::config::PartialRunConfig;
use crate::error::Result;
use molmin::workflows;

pub fn run(args: EnergyArgs) -> Result<()> {
    let config = PartialRunConfig::from_optional_file(args.config.as_deref())?
        .merge_with_cli(&args.force_field, &TuningArgs::default())?;
    let molecule = read_structure(&args.input)?;

    let evaluation = workflows::minimize::evaluate(&molecule, &config)?;

    println!(
        "'{}' with '{}': {} atoms, {} active terms",
        molecule.name(),
        config.force_field,
        molecule.size(),
        evaluation.active_terms
    );
    println!("{}", format_breakdown(&evaluation.breakdown));
    println!(
        "  RMS gradient {:.4}, largest atomic gradient {:.4} kcal/(mol·Å)",
        evaluation.rms_gradient, evaluation.largest_gradient
    );
    Ok(())
}
