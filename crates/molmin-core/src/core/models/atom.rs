use nalgebra::Point3;

/// An atom of a [`Molecule`](super::molecule::Molecule).
///
/// Typing and charges are assigned by an external perception step; this crate only
/// consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom (e.g., "CA", "O1").
    pub name: String,
    /// The force field atom type (e.g., "C_3", "H_").
    pub atom_type: String,
    /// The partial atomic charge in elementary charge units.
    pub partial_charge: f64,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
}

impl Atom {
    /// Creates a new uncharged `Atom`.
    pub fn new(name: &str, atom_type: &str, position: Point3<f64>) -> Self {
        Self {
            name: name.to_string(),
            atom_type: atom_type.to_string(),
            partial_charge: 0.0,
            position,
        }
    }

    pub fn with_charge(mut self, partial_charge: f64) -> Self {
        self.partial_charge = partial_charge;
        self
    }
}
