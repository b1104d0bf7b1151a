//! Pin backend registry.
//!
//! Maps backend names from the `[shield] backend` setting to factories that
//! build a `PinBank` for a board's GPIO lines.

use crate::drivers::register_builtin_backends;
use crate::error::ShieldError;
use lk_common::config::ShieldSection;
use lk_common::pin::{GpioPin, PinBank};
use std::collections::HashMap;
use std::sync::Arc;

/// Factory function creating a pin bank for the given lines.
pub type PinBankFactory =
    fn(config: &ShieldSection, lines: &[GpioPin]) -> Result<Arc<dyn PinBank>, ShieldError>;

/// Registry of available pin backends.
///
/// Built once at startup and handed to `Shield::from_config`.
pub struct PinBackendRegistry {
    factories: HashMap<&'static str, PinBankFactory>,
}

impl PinBackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding the built-in backends ("simulation", "sysfs").
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        register_builtin_backends(&mut registry);
        registry
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: PinBankFactory) {
        if self.factories.contains_key(name) {
            panic!("Pin backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<PinBankFactory> {
        self.factories.get(name).copied()
    }

    /// Create a pin bank by backend name.
    ///
    /// # Errors
    /// Returns `ShieldError::BackendNotFound` if no backend with the given
    /// name is registered, or whatever the factory reports.
    pub fn create(
        &self,
        name: &str,
        config: &ShieldSection,
        lines: &[GpioPin],
    ) -> Result<Arc<dyn PinBank>, ShieldError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| ShieldError::BackendNotFound(name.to_string()))?;
        factory(config, lines)
    }

    /// List all registered backend names, sorted.
    pub fn list_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for PinBackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulatedPinBank;

    fn create_test_bank(
        _config: &ShieldSection,
        lines: &[GpioPin],
    ) -> Result<Arc<dyn PinBank>, ShieldError> {
        Ok(Arc::new(SimulatedPinBank::new(lines.iter().copied())))
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = PinBackendRegistry::new();
        reg.register("test_backend", create_test_bank);

        let bank = reg
            .create("test_backend", &ShieldSection::default(), &[GpioPin(5)])
            .expect("should create");
        assert_eq!(bank.pins(), vec![GpioPin(5)]);
    }

    #[test]
    fn registry_backend_not_found() {
        let reg = PinBackendRegistry::new();
        let result = reg.create("nonexistent", &ShieldSection::default(), &[]);
        assert!(matches!(result, Err(ShieldError::BackendNotFound(_))));
    }

    #[test]
    fn registry_builtin_backends() {
        let reg = PinBackendRegistry::builtin();
        assert_eq!(reg.list_backends(), vec!["simulation", "sysfs"]);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = PinBackendRegistry::new();
        reg.register("dup", create_test_bank);
        reg.register("dup", create_test_bank);
    }
}
