use super::{read_structure, write_structure};
use crate::cli::AlignArgs;
use crate::error::{CliError, Result};
use molmin::workflows::align::{self, AtomSelection};

pub fn run(args: AlignArgs) -> Result<()> {
    let selection = match args.atom_name {
        Some(name) if name.trim().is_empty() => {
            return Err(CliError::Argument(
                "--atom-name must not be empty".to_string(),
            ));
        }
        Some(name) => AtomSelection::Named(name),
        None => AtomSelection::All,
    };

    let mut source = read_structure(&args.source)?;
    let target = read_structure(&args.target)?;

    let result = align::run(&mut source, &target, &selection)?;

    println!(
        "✓ Aligned '{}' onto '{}' over {} pairs ({}).",
        source.name(),
        target.name(),
        result.pairs,
        selection
    );
    println!(
        "  RMSD {:.4} -> {:.4} Å",
        result.rmsd_before, result.rmsd_after
    );
    let d = result.displacement;
    println!("  Centroid displacement ({:.4}, {:.4}, {:.4})", d.x, d.y, d.z);
    for row in result.rotation.row_iter() {
        println!("  [{:>9.5} {:>9.5} {:>9.5}]", row[0], row[1], row[2]);
    }

    if let Some(output) = &args.output {
        write_structure(&source, output)?;
        println!("Aligned structure written to: {}", output.display());
    }
    Ok(())
}
