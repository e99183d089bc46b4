use super::calculation::CalculationKind;
use std::ops::{Add, AddAssign};

/// Energy of a force field split by calculation kind, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyBreakdown {
    pub bond_stretch: f64,
    pub angle_bend: f64,
    pub torsion: f64,
    pub inversion: f64,
    pub van_der_waals: f64,
    pub electrostatic: f64,
}

impl EnergyBreakdown {
    pub fn add_energy(&mut self, kind: CalculationKind, energy: f64) {
        *self.get_mut(kind) += energy;
    }

    pub fn get(&self, kind: CalculationKind) -> f64 {
        match kind {
            CalculationKind::BondStretch => self.bond_stretch,
            CalculationKind::AngleBend => self.angle_bend,
            CalculationKind::Torsion => self.torsion,
            CalculationKind::Inversion => self.inversion,
            CalculationKind::VanDerWaals => self.van_der_waals,
            CalculationKind::Electrostatic => self.electrostatic,
        }
    }

    fn get_mut(&mut self, kind: CalculationKind) -> &mut f64 {
        match kind {
            CalculationKind::BondStretch => &mut self.bond_stretch,
            CalculationKind::AngleBend => &mut self.angle_bend,
            CalculationKind::Torsion => &mut self.torsion,
            CalculationKind::Inversion => &mut self.inversion,
            CalculationKind::VanDerWaals => &mut self.van_der_waals,
            CalculationKind::Electrostatic => &mut self.electrostatic,
        }
    }

    #[inline]
    pub fn bonded(&self) -> f64 {
        self.bond_stretch + self.angle_bend + self.torsion + self.inversion
    }

    #[inline]
    pub fn non_bonded(&self) -> f64 {
        self.van_der_waals + self.electrostatic
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.bonded() + self.non_bonded()
    }
}

impl Add for EnergyBreakdown {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for EnergyBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        for kind in CalculationKind::ALL {
            *self.get_mut(kind) += rhs.get(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_energy_accumulates_into_matching_field() {
        let mut breakdown = EnergyBreakdown::default();
        breakdown.add_energy(CalculationKind::Torsion, 1.5);
        breakdown.add_energy(CalculationKind::Torsion, 0.5);
        breakdown.add_energy(CalculationKind::Electrostatic, -3.0);
        assert_eq!(breakdown.torsion, 2.0);
        assert_eq!(breakdown.electrostatic, -3.0);
        assert_eq!(breakdown.get(CalculationKind::BondStretch), 0.0);
    }

    #[test]
    fn total_returns_sum_of_all_terms() {
        let breakdown = EnergyBreakdown {
            bond_stretch: 1.0,
            angle_bend: 2.0,
            torsion: 3.0,
            inversion: 4.0,
            van_der_waals: -5.0,
            electrostatic: -6.0,
        };
        assert_eq!(breakdown.bonded(), 10.0);
        assert_eq!(breakdown.non_bonded(), -11.0);
        assert_eq!(breakdown.total(), -1.0);
    }

    #[test]
    fn add_sums_each_field_correctly() {
        let mut a = EnergyBreakdown::default();
        a.add_energy(CalculationKind::BondStretch, 1.0);
        let mut b = EnergyBreakdown::default();
        b.add_energy(CalculationKind::BondStretch, 2.0);
        b.add_energy(CalculationKind::VanDerWaals, 4.0);

        let result = a + b;
        assert_eq!(result.bond_stretch, 3.0);
        assert_eq!(result.van_der_waals, 4.0);

        a += b;
        assert_eq!(a, result);
    }

    #[test]
    fn default_initializes_all_fields_to_zero() {
        assert_eq!(EnergyBreakdown::default().total(), 0.0);
    }
}
