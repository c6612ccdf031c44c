//! Driver registry for rig drivers.
//!
//! A `RigRegistry` is built at startup, populated via `register()`, and
//! asked for a fresh `Box<dyn SensorPort>` by name.

use autopatch_common::prelude::*;
use std::collections::HashMap;

/// Registry of available rig drivers.
pub struct RigRegistry {
    factories: HashMap<&'static str, RigFactory>,
}

impl RigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_builtin(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: RigFactory) {
        if self.factories.contains_key(name) {
            panic!("Rig driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Create a rig instance by name.
    ///
    /// # Errors
    /// Returns `RigError::DriverNotFound` if no driver with the given name is registered.
    pub fn create(&self, name: &str) -> Result<Box<dyn SensorPort>, RigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RigError::DriverNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List registered driver names, sorted.
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for RigRegistry {
    fn default() -> Self {
        Self::new()
    }
}
