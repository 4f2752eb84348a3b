// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Behavior registry
//!
//! Behaviors are registered once during setup, checked against
//! [`BEHAVIOR_API_VERSION`], and then selected by name when a simulation is
//! constructed. A selected behavior is shared through an [`Arc`], so the
//! same instance can drive several simulations.

use crate::error::RegistryError;
use crate::plugins::api::{TokenBehavior, BEHAVIOR_API_VERSION};
use crate::plugins::standard::StandardBehavior;
use semver::Version;
use std::collections::HashMap;
use std::sync::Arc;

/// Named collection of token behaviors
pub struct BehaviorRegistry {
    behaviors: HashMap<String, Arc<dyn TokenBehavior>>,
    /// Registration order, for listing
    order: Vec<String>,
}

impl BehaviorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        BehaviorRegistry {
            behaviors: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Create a registry holding the built-in [`StandardBehavior`]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let standard: Arc<dyn TokenBehavior> = Arc::new(StandardBehavior::new());
        registry.behaviors.insert(standard.name().to_string(), Arc::clone(&standard));
        registry.order.push(standard.name().to_string());
        registry
    }

    /// Register a behavior
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Duplicate`] if the name is taken
    /// - [`RegistryError::InvalidVersion`] if `api_version` is not semver
    /// - [`RegistryError::IncompatibleVersion`] if the API version does not match
    ///
    /// # Example
    ///
    /// ```
    /// use token_swarm::plugins::{BehaviorRegistry, StandardBehavior};
    ///
    /// let mut registry = BehaviorRegistry::new();
    /// registry.register(Box::new(StandardBehavior::new())).unwrap();
    /// assert!(registry.register(Box::new(StandardBehavior::new())).is_err());
    /// ```
    pub fn register(&mut self, behavior: Box<dyn TokenBehavior>) -> Result<(), RegistryError> {
        let name = behavior.name().to_string();
        if self.behaviors.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        check_api_version(&name, behavior.api_version())?;

        tracing::info!(behavior = %name, version = behavior.version(), "registered token behavior");
        self.order.push(name.clone());
        self.behaviors.insert(name, Arc::from(behavior));
        Ok(())
    }

    /// Select a behavior by name
    pub fn select(&self, name: &str) -> Result<Arc<dyn TokenBehavior>, RegistryError> {
        self.behaviors
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownBehavior(name.to_string()))
    }

    /// Whether a behavior with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.behaviors.contains_key(name)
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of registered behaviors
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_api_version(name: &str, declared: &str) -> Result<(), RegistryError> {
    let found = Version::parse(declared).map_err(|_| RegistryError::InvalidVersion {
        name: name.to_string(),
        version: declared.to_string(),
    })?;
    let engine = Version::parse(BEHAVIOR_API_VERSION).map_err(|_| RegistryError::InvalidVersion {
        name: "engine".to_string(),
        version: BEHAVIOR_API_VERSION.to_string(),
    })?;

    if is_version_compatible(&found, &engine) {
        Ok(())
    } else {
        Err(RegistryError::IncompatibleVersion {
            name: name.to_string(),
            found: declared.to_string(),
            expected: BEHAVIOR_API_VERSION.to_string(),
        })
    }
}

/// Semver compatibility between a behavior and the engine API
///
/// - Major version must match
/// - For 0.x.y, minor versions must match
/// - Otherwise the behavior's minor must not exceed the engine's
/// - Patch is ignored
fn is_version_compatible(behavior: &Version, engine: &Version) -> bool {
    if behavior.major != engine.major {
        return false;
    }
    if behavior.major == 0 {
        behavior.minor == engine.minor
    } else {
        behavior.minor <= engine.minor
    }
}
