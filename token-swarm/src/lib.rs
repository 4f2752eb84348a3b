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
//! # Token Swarm
//!
//! A per-frame particle simulation for on-screen tokens: a population of
//! mobile entities that move under accumulated forces, bounce off each
//! other, flock, and cycle through a spawn/active/death/respawn lifecycle.
//!
//! ## Features
//!
//! - **Force accumulation**: mouse repulsion with selectable falloff, flocking, home-seeking
//! - **Broad phase**: uniform grid spatial index rebuilt every frame
//! - **Collisions**: circle and axis-aligned rectangle overlap with elastic response
//! - **Lifecycle**: timed fade-in, death at the canvas edge, delayed respawn with collision grace
//! - **Extensibility**: version-checked [`TokenBehavior`](plugins::TokenBehavior) plugins
//! - **Parallelization**: optional Rayon force pass behind the `parallel` feature
//!
//! The engine renders nothing and reads no global state. The host passes a
//! [`SimulationConfig`] snapshot and a [`FrameInput`] into every
//! [`Simulation::step`] and reads the tokens back.
//!
//! ## Example
//!
//! ```rust
//! use token_swarm::{Canvas, FrameInput, Simulation, SimulationConfig, Token, TokenId, Vec2};
//!
//! let tokens: Vec<Token> = (0..4)
//!     .map(|i| Token::new(TokenId::new(i), Vec2::new(20.0 + 40.0 * i as f64, 50.0), Vec2::new(16.0, 16.0)))
//!     .collect();
//! let mut sim = Simulation::new(tokens);
//! let config = SimulationConfig::default();
//! let input = FrameInput::new(Canvas::new(200.0, 100.0)).with_dt(1.0 / 60.0);
//!
//! for _ in 0..60 {
//!     sim.step(&config, &input);
//! }
//! assert_eq!(sim.lifecycle().active_count(), 4);
//! ```
//!
//! ## Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber: `debug`
//! for per-frame detail, `info` for roster and registry changes, `warn` for
//! numerical anomalies and isolated behavior failures.

#![warn(missing_docs)]

/// Collision detection, response and canvas bounds
pub mod collision;

/// Configuration snapshot
pub mod config;

/// Error types
pub mod error;

/// Force sources: mouse, flocking, home-seeking
pub mod forces;

/// Respawn queue and timed transitions
pub mod lifecycle;

/// Pluggable token behaviors
pub mod plugins;

/// Frame orchestration
pub mod simulation;

/// Uniform grid broad phase
pub mod spatial;

/// Token entities and geometry
pub mod token;

pub use collision::Canvas;
pub use config::SimulationConfig;
pub use simulation::{FrameClock, FrameInput, FrameStats, Simulation};
pub use token::{LifecycleState, Shape, Token, TokenId, Vec2};
