pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

const MIN_DISTANCE: f64 = 1e-6;
const CLASH_ENERGY: f64 = 1e10;

/// `½ k (x − x0)²`.
#[inline]
pub fn harmonic(x: f64, x0: f64, force_constant: f64) -> f64 {
    let dx = x - x0;
    0.5 * force_constant * dx * dx
}

#[inline]
pub fn harmonic_derivative(x: f64, x0: f64, force_constant: f64) -> f64 {
    force_constant * (x - x0)
}

/// `½ V [1 − cos(n (φ − φ0))]` with angles in radians.
#[inline]
pub fn cosine_torsion(phi: f64, barrier: f64, periodicity: f64, phase: f64) -> f64 {
    0.5 * barrier * (1.0 - (periodicity * (phi - phase)).cos())
}

#[inline]
pub fn cosine_torsion_derivative(phi: f64, barrier: f64, periodicity: f64, phase: f64) -> f64 {
    0.5 * barrier * periodicity * (periodicity * (phi - phase)).sin()
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return CLASH_ENERGY;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// `dE/dr` of [`lennard_jones_12_6`]. Zero inside the clash guard.
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 0.0;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    -12.0 * well_depth * (rho12 - rho6) / dist
}

#[inline]
pub fn coulomb(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return q1.signum() * q2.signum() * CLASH_ENERGY;
    }
    COULOMB_CONSTANT * q1 * q2 / (dielectric * dist)
}

/// `dE/dr` of [`coulomb`]. Zero inside the clash guard.
#[inline]
pub fn coulomb_derivative(dist: f64, q1: f64, q2: f64, dielectric: f64) -> f64 {
    if dist < MIN_DISTANCE {
        return 0.0;
    }
    -COULOMB_CONSTANT * q1 * q2 / (dielectric * dist * dist)
}
