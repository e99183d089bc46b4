pub mod align;
pub mod energy;
pub mod minimize;

use crate::error::{CliError, Result};
use molmin::core::forcefield::calculation::CalculationKind;
use molmin::core::forcefield::term::EnergyBreakdown;
use molmin::core::io::structure::StructureFile;
use molmin::core::io::traits::MolecularFile;
use molmin::core::models::molecule::Molecule;
use std::path::Path;
use tracing::info;

fn read_structure(path: &Path) -> Result<Molecule> {
    info!("Loading structure from {:?}", path);
    StructureFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn write_structure(molecule: &Molecule, path: &Path) -> Result<()> {
    info!("Writing structure to {:?}", path);
    StructureFile::write_to_path(molecule, path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

fn format_breakdown(breakdown: &EnergyBreakdown) -> String {
    let mut lines: Vec<String> = CalculationKind::ALL
        .iter()
        .map(|&kind| format!("  {:<16} {:>14.4}", kind.name(), breakdown.get(kind)))
        .collect();
    lines.push(format!("  {:<16} {:>14.4}", "total", breakdown.total()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakdown_lists_every_kind_and_total() {
        let mut breakdown = EnergyBreakdown::default();
        breakdown.add_energy(CalculationKind::BondStretch, 1.25);
        let text = format_breakdown(&breakdown);
        assert_eq!(text.lines().count(), CalculationKind::ALL.len() + 1);
        assert!(text.lines().last().unwrap().contains("1.2500"));
    }
}
