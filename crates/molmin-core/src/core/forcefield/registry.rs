use super::dreiding::{DREIDING_LITE_NAME, DreidingLite};
use super::forcefield::ForceField;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type Factory = Arc<dyn Fn() -> ForceField + Send + Sync>;

/// Maps force field names to factories producing fresh, empty force fields.
#[derive(Clone)]
pub struct ForceFieldRegistry {
    factories: BTreeMap<String, Factory>,
}

impl fmt::Debug for ForceFieldRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceFieldRegistry")
            .field("names", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ForceFieldRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ForceFieldRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in force fields.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(DREIDING_LITE_NAME, || ForceField::new(DreidingLite::new()));
        registry
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> ForceField + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    pub fn create(&self, name: &str) -> Option<ForceField> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::calculation::CalculationKind;

    #[test]
    fn builtins_include_dreiding_lite() {
        let registry = ForceFieldRegistry::with_builtins();
        assert!(registry.contains("dreiding-lite"));
        let ff = registry.create("dreiding-lite").unwrap();
        assert_eq!(ff.name(), "dreiding-lite");
        assert_eq!(ff.size(), 0);
    }

    #[test]
    fn create_returns_none_for_unknown_name() {
        assert!(ForceFieldRegistry::new().create("dreiding-lite").is_none());
    }

    #[test]
    fn register_and_unregister_custom_factory() {
        let mut registry = ForceFieldRegistry::with_builtins();
        registry.register("bonds-only", || {
            ForceField::new(DreidingLite::with_terms([CalculationKind::BondStretch]))
        });
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["bonds-only", "dreiding-lite"]
        );
        assert!(registry.create("bonds-only").is_some());
        assert!(registry.unregister("bonds-only"));
        assert!(!registry.unregister("bonds-only"));
    }

    #[test]
    fn each_create_yields_independent_instance() {
        let registry = ForceFieldRegistry::default();
        let mut first = registry.create("dreiding-lite").unwrap();
        let second = registry.create("dreiding-lite").unwrap();
        first.set_parameter_set("other");
        assert_eq!(second.parameter_set(), Some("default"));
    }
}
