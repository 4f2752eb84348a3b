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
//! Boids-style flocking
//!
//! Three rules are combined for each Active token T against its Active
//! neighbors N within `flocking.radius`:
//!
//! - **Alignment**: `(mean(N.velocity) - T.velocity) * alignment`
//! - **Cohesion**: `(mean(N.position) - T.position) * cohesion`
//! - **Separation**: `sum((T.position - N.position) / max(d², SEPARATION_EPSILON)) * separation`
//!
//! The engine only reads a [`Kinematics`] snapshot taken before the force
//! pass, never live tokens, so the result for one token does not depend on
//! the order in which other tokens are processed.

use crate::config::FlockingSettings;
use crate::spatial::SpatialIndex;
use crate::token::{LifecycleState, Token, TokenId, Vec2};

/// Floor for the squared distance in the separation rule
pub const SEPARATION_EPSILON: f64 = 1e-2;

/// Frame-start copy of the state other tokens may observe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    /// Position at frame start
    pub position: Vec2,
    /// Velocity at frame start
    pub velocity: Vec2,
    /// Lifecycle state at frame start
    pub lifecycle: LifecycleState,
}

impl Kinematics {
    /// Capture a token's current state
    pub fn of(token: &Token) -> Self {
        Kinematics {
            position: token.position(),
            velocity: token.velocity(),
            lifecycle: token.lifecycle(),
        }
    }
}

/// Computes flocking forces from a spatial index and a kinematic snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct FlockingEngine;

impl FlockingEngine {
    /// Create a flocking engine
    pub fn new() -> Self {
        FlockingEngine
    }

    /// Flocking force for the token `id`
    ///
    /// Returns zero when flocking is disabled, the token is not Active, or
    /// no Active neighbor lies within the radius.
    pub fn force_for(
        &self,
        id: TokenId,
        index: &SpatialIndex,
        snapshot: &[Kinematics],
        settings: &FlockingSettings,
    ) -> Vec2 {
        if !settings.enabled || !(settings.radius > 0.0) {
            return Vec2::ZERO;
        }
        let Some(me) = snapshot.get(id.index()) else {
            return Vec2::ZERO;
        };
        if me.lifecycle != LifecycleState::Active || !me.position.is_valid() {
            return Vec2::ZERO;
        }

        let radius_sq = settings.radius * settings.radius;
        let mut count = 0usize;
        let mut velocity_sum = Vec2::ZERO;
        let mut position_sum = Vec2::ZERO;
        let mut separation = Vec2::ZERO;

        for other in index.query_neighbors(me.position, settings.radius) {
            if other == id {
                continue;
            }
            let Some(neighbor) = snapshot.get(other.index()) else {
                continue;
            };
            if neighbor.lifecycle != LifecycleState::Active {
                continue;
            }
            let offset = me.position - neighbor.position;
            let dist_sq = offset.length_squared();
            if dist_sq > radius_sq {
                continue;
            }
            count += 1;
            velocity_sum += neighbor.velocity;
            position_sum += neighbor.position;
            separation += offset / dist_sq.max(SEPARATION_EPSILON);
        }

        if count == 0 {
            return Vec2::ZERO;
        }

        let n = count as f64;
        let alignment = (velocity_sum / n - me.velocity) * settings.alignment;
        let cohesion = (position_sum / n - me.position) * settings.cohesion;
        alignment + cohesion + separation * settings.separation
    }
}
