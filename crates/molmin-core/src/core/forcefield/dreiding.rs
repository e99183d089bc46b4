use super::atom::{FfAtomId, ForceFieldAtom};
use super::calculation::{Calculation, CalculationKind};
use super::forcefield::ForceFieldError;
use super::model::ForceFieldModel;
use super::params::{AtomTypeParams, ParameterSet, ParameterSource};
use crate::core::models::ids::AtomId;
use crate::core::models::molecule::Molecule;
use itertools::Itertools;
use std::collections::{BTreeSet, HashMap};

const DEFAULT_PARAMS_TOML: &str = include_str!("../../../resources/dreiding-lite.toml");

pub const DREIDING_LITE_NAME: &str = "dreiding-lite";
pub const DEFAULT_PARAMETER_SET: &str = "default";

/// A DREIDING-style generic force field.
///
/// Bond lengths derive from per-type bonding radii, angle equilibria from the central
/// atom's type, torsions and inversions from optional keyed tables, and non-bonded
/// terms from Lennard-Jones parameters combined by geometric mean. Bonded neighbors
/// and 1-3 pairs are excluded from non-bonded terms.
#[derive(Debug, Clone)]
pub struct DreidingLite {
    terms: BTreeSet<CalculationKind>,
}

impl Default for DreidingLite {
    fn default() -> Self {
        Self::new()
    }
}

impl DreidingLite {
    pub fn new() -> Self {
        Self::with_terms(CalculationKind::ALL)
    }

    /// Restricts the model to the given term kinds.
    pub fn with_terms(terms: impl IntoIterator<Item = CalculationKind>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    pub fn enabled(&self, kind: CalculationKind) -> bool {
        self.terms.contains(&kind)
    }

    fn push(
        &self,
        calculations: &mut Vec<Calculation>,
        kind: CalculationKind,
        atoms: Vec<FfAtomId>,
    ) {
        if self.enabled(kind) {
            calculations.push(Calculation::new(kind, atoms));
        }
    }

    fn non_bonded_pair(&self, calculations: &mut Vec<Calculation>, a: FfAtomId, b: FfAtomId) {
        self.push(calculations, CalculationKind::VanDerWaals, vec![a, b]);
        self.push(calculations, CalculationKind::Electrostatic, vec![a, b]);
    }
}

fn atom_params<'p>(
    parameters: &'p ParameterSet,
    kind: CalculationKind,
    atom: &ForceFieldAtom,
) -> Result<&'p AtomTypeParams, ForceFieldError> {
    parameters
        .atom(&atom.atom_type)
        .ok_or_else(|| ForceFieldError::MissingParameter {
            kind,
            types: atom.atom_type.clone(),
        })
}

fn is_one_three(molecule: &Molecule, a: AtomId, b: AtomId) -> bool {
    molecule
        .bonded_neighbors(a)
        .unwrap_or_default()
        .iter()
        .any(|&x| molecule.is_bonded(x, b))
}

impl ForceFieldModel for DreidingLite {
    fn name(&self) -> &str {
        DREIDING_LITE_NAME
    }

    fn parameter_sets(&self) -> Vec<(String, ParameterSource)> {
        vec![(
            DEFAULT_PARAMETER_SET.to_string(),
            ParameterSource::Embedded {
                name: DREIDING_LITE_NAME,
                content: DEFAULT_PARAMS_TOML,
            },
        )]
    }

    fn build_calculations(
        &self,
        molecule: &Molecule,
        atom_map: &HashMap<AtomId, FfAtomId>,
    ) -> Vec<Calculation> {
        let mut calculations = Vec::new();
        let ff = |id: AtomId| atom_map[&id];
        let neighbors = |id: AtomId| molecule.bonded_neighbors(id).unwrap_or_default();

        for bond in molecule.bonds() {
            self.push(
                &mut calculations,
                CalculationKind::BondStretch,
                vec![ff(bond.atom1_id), ff(bond.atom2_id)],
            );
        }

        for &center in molecule.atom_ids() {
            for (&a, &c) in neighbors(center).iter().tuple_combinations() {
                self.push(
                    &mut calculations,
                    CalculationKind::AngleBend,
                    vec![ff(a), ff(center), ff(c)],
                );
            }

            if let &[i, j, k] = neighbors(center) {
                for (a, c, d) in [(i, j, k), (j, k, i), (k, i, j)] {
                    self.push(
                        &mut calculations,
                        CalculationKind::Inversion,
                        vec![ff(a), ff(center), ff(c), ff(d)],
                    );
                }
            }
        }

        for bond in molecule.bonds() {
            let (b, c) = (bond.atom1_id, bond.atom2_id);
            for &a in neighbors(b).iter().filter(|&&a| a != c) {
                for &d in neighbors(c).iter().filter(|&&d| d != b && d != a) {
                    self.push(
                        &mut calculations,
                        CalculationKind::Torsion,
                        vec![ff(a), ff(b), ff(c), ff(d)],
                    );
                }
            }
        }

        for (&a, &b) in molecule.atom_ids().iter().tuple_combinations() {
            if molecule.is_bonded(a, b) || is_one_three(molecule, a, b) {
                continue;
            }
            self.non_bonded_pair(&mut calculations, ff(a), ff(b));
        }

        calculations
    }

    fn build_pair_calculations(&self, first: FfAtomId, second: FfAtomId) -> Vec<Calculation> {
        let mut calculations = Vec::new();
        self.non_bonded_pair(&mut calculations, first, second);
        calculations
    }

    fn parameterize(
        &self,
        calculation: &Calculation,
        atoms: &[&ForceFieldAtom],
        parameters: &ParameterSet,
    ) -> Result<Option<Vec<f64>>, ForceFieldError> {
        let kind = calculation.kind();
        let globals = &parameters.globals;

        let values = match kind {
            CalculationKind::BondStretch => {
                let i = atom_params(parameters, kind, atoms[0])?;
                let j = atom_params(parameters, kind, atoms[1])?;
                let r0 = i.bond_radius + j.bond_radius - globals.bond_delta;
                Some(vec![globals.bond_force_constant, r0])
            }
            CalculationKind::AngleBend => {
                let center = atom_params(parameters, kind, atoms[1])?;
                Some(vec![globals.angle_force_constant, center.bond_angle])
            }
            CalculationKind::Torsion => parameters
                .torsion(&atoms[1].atom_type, &atoms[2].atom_type)
                .map(|t| vec![t.barrier, t.periodicity, t.phase]),
            CalculationKind::Inversion => parameters.inversion(&atoms[1].atom_type).map(|inv| {
                let k = inv.force_constant.unwrap_or(globals.inversion_force_constant);
                // Each center carries three inversion terms.
                vec![k / 3.0, inv.angle]
            }),
            CalculationKind::VanDerWaals => {
                let i = atom_params(parameters, kind, atoms[0])?;
                let j = atom_params(parameters, kind, atoms[1])?;
                let r_min = (i.vdw_radius * j.vdw_radius).sqrt();
                let well_depth = (i.well_depth * j.well_depth).sqrt();
                Some(vec![r_min, well_depth])
            }
            CalculationKind::Electrostatic => {
                let (qi, qj) = (atoms[0].partial_charge, atoms[1].partial_charge);
                (qi != 0.0 && qj != 0.0).then(|| vec![qi, qj, globals.dielectric_constant])
            }
        };

        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use nalgebra::Point3;
    use slotmap::SlotMap;

    struct Fixture {
        molecule: Molecule,
        atoms: SlotMap<FfAtomId, ForceFieldAtom>,
        map: HashMap<AtomId, FfAtomId>,
    }

    impl Fixture {
        fn new(molecule: Molecule) -> Self {
            let mut atoms = SlotMap::with_key();
            let mut map = HashMap::new();
            for (id, atom) in molecule.atoms() {
                map.insert(id, atoms.insert(ForceFieldAtom::from_atom(molecule.id(), id, atom)));
            }
            Self { molecule, atoms, map }
        }

        fn count(calculations: &[Calculation], kind: CalculationKind) -> usize {
            calculations.iter().filter(|c| c.kind() == kind).count()
        }

        fn shadows(&self, calculation: &Calculation) -> Vec<&ForceFieldAtom> {
            calculation.atoms().iter().map(|&id| &self.atoms[id]).collect()
        }
    }

    /// H-C-C-H style chain of four atoms.
    fn butane_like() -> Molecule {
        let mut molecule = Molecule::new("chain");
        let ids: Vec<_> = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.5, 0.0, 0.0),
            Point3::new(1.5, -1.0, 0.5),
        ]
        .iter()
        .enumerate()
        .map(|(i, p)| molecule.add_atom(Atom::new(&format!("C{i}"), "C_3", *p)))
        .collect();
        for (a, b) in ids.iter().tuple_windows() {
            molecule.add_bond(*a, *b).unwrap();
        }
        molecule
    }

    fn default_parameters() -> ParameterSet {
        DreidingLite::new().parameter_sets()[0].1.load().unwrap()
    }

    #[test]
    fn embedded_default_parameters_parse() {
        let parameters = default_parameters();
        assert!(parameters.atom("C_3").is_some());
        assert!(parameters.torsion("C_3", "C_3").is_some());
    }

    #[test]
    fn builds_expected_term_counts_for_chain() {
        let fixture = Fixture::new(butane_like());
        let calculations = DreidingLite::new().build_calculations(&fixture.molecule, &fixture.map);
        assert_eq!(Fixture::count(&calculations, CalculationKind::BondStretch), 3);
        assert_eq!(Fixture::count(&calculations, CalculationKind::AngleBend), 2);
        assert_eq!(Fixture::count(&calculations, CalculationKind::Torsion), 1);
        assert_eq!(Fixture::count(&calculations, CalculationKind::Inversion), 0);
        // Only the 1-4 pair survives the exclusions.
        assert_eq!(Fixture::count(&calculations, CalculationKind::VanDerWaals), 1);
        assert_eq!(Fixture::count(&calculations, CalculationKind::Electrostatic), 1);
    }

    #[test]
    fn three_coordinate_center_gets_three_inversions() {
        let mut molecule = Molecule::new("planar");
        let center = molecule.add_atom(Atom::new("C", "C_2", Point3::origin()));
        for p in [
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-0.5, 0.87, 0.0),
            Point3::new(-0.5, -0.87, 0.0),
        ] {
            let id = molecule.add_atom(Atom::new("H", "H_", p));
            molecule.add_bond(center, id).unwrap();
        }
        let fixture = Fixture::new(molecule);
        let calculations = DreidingLite::new().build_calculations(&fixture.molecule, &fixture.map);
        let inversions: Vec<_> = calculations
            .iter()
            .filter(|c| c.kind() == CalculationKind::Inversion)
            .collect();
        assert_eq!(inversions.len(), 3);
        let center_ff = fixture.map[&center];
        assert!(inversions.iter().all(|c| c.atoms()[1] == center_ff));
    }

    #[test]
    fn with_terms_restricts_built_kinds() {
        let fixture = Fixture::new(butane_like());
        let model = DreidingLite::with_terms([CalculationKind::BondStretch]);
        let calculations = model.build_calculations(&fixture.molecule, &fixture.map);
        assert_eq!(calculations.len(), 3);
        let ids = fixture.molecule.atom_ids();
        let pair = model.build_pair_calculations(fixture.map[&ids[0]], fixture.map[&ids[3]]);
        assert!(pair.is_empty());
    }

    #[test]
    fn bond_parameters_use_radii_minus_delta() {
        let fixture = Fixture::new(butane_like());
        let parameters = default_parameters();
        let model = DreidingLite::new();
        let calculations = model.build_calculations(&fixture.molecule, &fixture.map);
        let bond = calculations
            .iter()
            .find(|c| c.kind() == CalculationKind::BondStretch)
            .unwrap();
        let values = model
            .parameterize(bond, &fixture.shadows(bond), &parameters)
            .unwrap()
            .unwrap();
        assert_eq!(values[0], 700.0);
        assert!((values[1] - (0.77 + 0.77 - 0.01)).abs() < 1e-12);
    }

    #[test]
    fn uncharged_electrostatics_are_not_applicable() {
        let fixture = Fixture::new(butane_like());
        let model = DreidingLite::new();
        let calculations = model.build_calculations(&fixture.molecule, &fixture.map);
        let coulomb = calculations
            .iter()
            .find(|c| c.kind() == CalculationKind::Electrostatic)
            .unwrap();
        let values = model
            .parameterize(coulomb, &fixture.shadows(coulomb), &default_parameters())
            .unwrap();
        assert!(values.is_none());
    }

    #[test]
    fn unknown_atom_type_is_a_missing_parameter() {
        let mut molecule = Molecule::new("exotic");
        let a = molecule.add_atom(Atom::new("A", "Xx_9", Point3::origin()));
        let b = molecule.add_atom(Atom::new("B", "C_3", Point3::new(1.5, 0.0, 0.0)));
        molecule.add_bond(a, b).unwrap();
        let fixture = Fixture::new(molecule);
        let model = DreidingLite::new();
        let calculations = model.build_calculations(&fixture.molecule, &fixture.map);
        let result = model.parameterize(
            &calculations[0],
            &fixture.shadows(&calculations[0]),
            &default_parameters(),
        );
        assert!(matches!(
            result,
            Err(ForceFieldError::MissingParameter { kind: CalculationKind::BondStretch, ref types }) if types == "Xx_9"
        ));
    }
}
