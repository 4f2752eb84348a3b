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
//! Built-in token behavior
//!
//! [`StandardBehavior`] uses every default hook: the built-in force sources,
//! explicit Euler integration with optional damping and the default
//! collision response. It is what [`Simulation::new`](crate::Simulation::new)
//! installs.

use crate::plugins::api::TokenBehavior;

/// Registered name of [`StandardBehavior`]
pub const STANDARD_BEHAVIOR: &str = "standard";

/// Default token behavior
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBehavior;

impl StandardBehavior {
    /// Create the standard behavior
    pub fn new() -> Self {
        StandardBehavior
    }
}

impl TokenBehavior for StandardBehavior {
    fn name(&self) -> &str {
        STANDARD_BEHAVIOR
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::api::BEHAVIOR_API_VERSION;

    #[test]
    fn test_standard_behavior_metadata() {
        let behavior = StandardBehavior::new();
        assert_eq!(behavior.name(), "standard");
        assert_eq!(behavior.api_version(), BEHAVIOR_API_VERSION);
        assert!(semver::Version::parse(behavior.version()).is_ok());
    }
}
