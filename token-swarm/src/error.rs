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
//! Error types
//!
//! The frame loop itself never fails. Errors only surface at the edges:
//! registering and selecting behaviors ([`RegistryError`]) and inside a
//! single behavior hook ([`BehaviorError`]), where the simulation isolates
//! the affected token instead of aborting the frame.

/// Errors raised while registering or selecting a token behavior
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A behavior with the same name is already registered.
    #[error("behavior '{0}' is already registered")]
    Duplicate(String),

    /// The behavior was built against an incompatible API version.
    #[error("behavior '{name}' API version {found} is incompatible with engine API version {expected}")]
    IncompatibleVersion {
        /// Behavior name.
        name: String,
        /// Version declared by the behavior.
        found: String,
        /// Version of the engine API.
        expected: String,
    },

    /// The behavior declared an API version that is not valid semver.
    #[error("behavior '{name}' declares unparsable API version '{version}'")]
    InvalidVersion {
        /// Behavior name.
        name: String,
        /// The offending version string.
        version: String,
    },

    /// No behavior with the requested name is registered.
    #[error("no behavior named '{0}' is registered")]
    UnknownBehavior(String),
}

/// Failure of a behavior hook for a single token
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BehaviorError {
    /// The hook could not complete.
    #[error("{0}")]
    Failed(String),

    /// The hook produced a non-finite value for the named quantity.
    #[error("non-finite {0} produced")]
    NonFinite(&'static str),
}

impl BehaviorError {
    /// Convenience constructor for [`BehaviorError::Failed`]
    pub fn failed(message: impl Into<String>) -> Self {
        BehaviorError::Failed(message.into())
    }
}
