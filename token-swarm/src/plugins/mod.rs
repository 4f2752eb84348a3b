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
//! Pluggable token behaviors
//!
//! The simulation's frame order is fixed, but what happens to each token at
//! four points of the frame is delegated to a [`TokenBehavior`]:
//!
//! - `apply_forces`: accumulate forces (default: mouse, flocking, home-seeking)
//! - `update_physics`: integrate (default: explicit Euler with damping)
//! - `process_collision`: react to peer contacts and canvas edges
//! - `generate_image`: describe the token for the renderer
//!
//! Behaviors are registered in a [`BehaviorRegistry`], which checks the
//! declared API version with the same semver rules as the engine uses for
//! every extension point, and are selected by name at construction time:
//!
//! ```
//! use token_swarm::plugins::BehaviorRegistry;
//! use token_swarm::Simulation;
//!
//! let registry = BehaviorRegistry::with_builtins();
//! let sim = Simulation::from_registry(Vec::new(), &registry, "standard").unwrap();
//! assert_eq!(sim.behavior_name(), "standard");
//! ```

pub mod api;
pub mod registry;
pub mod standard;

pub use api::{BehaviorContext, TokenAppearance, TokenBehavior, BEHAVIOR_API_VERSION};
pub use registry::BehaviorRegistry;
pub use standard::{StandardBehavior, STANDARD_BEHAVIOR};
