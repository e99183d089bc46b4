use slotmap::new_key_type;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    pub struct AtomId;
}

static NEXT_MOLECULE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a [`Molecule`](super::molecule::Molecule).
///
/// Every molecule, clones included, gets its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoleculeId(u64);

impl MoleculeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MOLECULE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MoleculeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mol#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn molecule_ids_are_unique() {
        let a = MoleculeId::next();
        let b = MoleculeId::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn molecule_id_display_includes_value() {
        let id = MoleculeId(42);
        assert_eq!(id.to_string(), "mol#42");
    }
}
