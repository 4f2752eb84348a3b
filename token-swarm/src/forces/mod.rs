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
//! Force sources
//!
//! Each source computes a contribution for one token from the frame context
//! and leaves accumulation to [`Token::apply_force`] (or
//! [`Token::apply_home_force`] for home-seeking). Sources return `None`
//! when they contribute nothing this frame.
//!
//! - Mouse field: repels tokens from the cursor inside `max_distance`, with a
//!   selectable [`Falloff`].
//! - Flocking: see [`flocking`].
//! - Home-seeking: constant-magnitude pull toward `home` once the token has
//!   been idle for `delay_sec`.
//!
//! [`apply_standard_forces`] runs all of them in a fixed order and is what
//! the default behavior uses.

pub mod flocking;

pub use flocking::{FlockingEngine, Kinematics, SEPARATION_EPSILON};

use crate::config::{non_negative, Facing, Falloff, HomeSettings, MouseForceSettings};
use crate::plugins::BehaviorContext;
use crate::token::{Token, Vec2};

/// Mouse input for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseState {
    /// Cursor position, `None` when the cursor is outside the canvas
    pub position: Option<Vec2>,
    /// Cursor velocity in pixels per second
    pub velocity: Vec2,
}

/// Map a distance inside the field radius to a unit magnitude
///
/// Callers only use this for `0 < distance < max_distance`.
pub fn falloff_factor(falloff: Falloff, distance: f64, max_distance: f64) -> f64 {
    let t = (1.0 - distance / max_distance).clamp(0.0, 1.0);
    match falloff {
        Falloff::Linear => t,
        Falloff::Inverse => 1.0 / (distance + 1.0),
        Falloff::Quadratic => t * t,
        Falloff::Smoothstep => t * t * (3.0 - 2.0 * t),
        Falloff::Constant => 1.0,
    }
}

/// Repulsive mouse force on a token at `position`
pub fn mouse_force(position: Vec2, mouse: &MouseState, settings: &MouseForceSettings) -> Option<Vec2> {
    if !settings.enabled {
        return None;
    }
    let cursor = mouse.position?;
    let max_distance = non_negative(settings.max_distance);
    let offset = position - cursor;
    let distance = offset.length();
    if !(distance > 0.0 && distance < max_distance) {
        return None;
    }

    let mut magnitude = settings.force_strength * falloff_factor(settings.falloff, distance, max_distance);
    if settings.scale_by_mouse_speed {
        magnitude *= mouse.velocity.length();
    }
    let force = offset / distance * magnitude;
    force.is_valid().then_some(force)
}

/// Home-seeking force, engaged once the token has been idle long enough
pub fn home_force(token: &Token, settings: &HomeSettings) -> Option<Vec2> {
    if !settings.enabled || !settings.strength.is_finite() {
        return None;
    }
    if token.time_since_last_force() < non_negative(settings.delay_sec) {
        return None;
    }
    let direction = (token.home() - token.position()).normalized()?;
    Some(direction * settings.strength)
}

/// Rotation in degrees that points the token's front at `target`
///
/// Screen space is y-down, so `atan2` already yields a clockwise angle
/// with 0 pointing right.
pub fn look_at_rotation(position: Vec2, target: Vec2, facing: Facing, offset_degrees: f64) -> f64 {
    let delta = target - position;
    let heading = delta.y.atan2(delta.x).to_degrees();
    heading + facing.offset_degrees() + offset_degrees
}

/// Apply every built-in force source to one token
///
/// Dead tokens are left untouched. Flocking only applies to Active tokens;
/// the other sources apply to every live token. Each source honours the
/// token's [`BehaviorGates`](crate::token::BehaviorGates).
pub fn apply_standard_forces(token: &mut Token, ctx: &BehaviorContext<'_>) {
    if !token.lifecycle().is_alive() {
        return;
    }
    let config = ctx.config();
    let gates = token.gates();
    let mouse = ctx.mouse();

    if config.tokens.look_at_mouse {
        if let Some(cursor) = mouse.position {
            token.set_rotation(look_at_rotation(
                token.position(),
                cursor,
                config.tokens.facing,
                config.tokens.rotation_offset_degrees,
            ));
        }
    }

    if gates.mouse_force {
        if let Some(force) = mouse_force(token.position(), &mouse, &config.mouse_force) {
            token.apply_force(force);
        }
    }

    if gates.flocking && token.is_active() {
        let force = FlockingEngine::new().force_for(token.id(), ctx.index(), ctx.snapshot(), &config.tokens.flocking);
        if force != Vec2::ZERO {
            token.apply_force(force);
        }
    }

    if gates.home_seeking {
        if let Some(force) = home_force(token, &config.tokens.finds_home) {
            token.apply_home_force(force);
        }
    }
}
