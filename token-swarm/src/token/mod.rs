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
//! Token entities
//!
//! A [`Token`] is a mobile entity with kinematic state, a collision shape and
//! a lifecycle state. Tokens are created once by the host and handed to the
//! simulation, which owns them for the rest of their life. "Destruction" is
//! logical: a token that leaves the canvas becomes [`LifecycleState::Dead`]
//! and is later reset to its home position.
//!
//! # Lifecycle
//!
//! ```text
//! Spawning --fade-in elapsed--> Active --left canvas--> Dead
//!     ^                            ^                     |
//!     |                            |               respawn delay
//!  (created)                       +---- Respawning <----+
//! ```
//!
//! The transition helpers on [`Token`] are the only code that writes the
//! lifecycle state. Each helper checks the current state and refuses any
//! move that is not in the table above.
//!
//! # Force buffer
//!
//! Forces accumulate into a private per-frame buffer through
//! [`Token::apply_force`] and [`Token::apply_home_force`]. The buffer is
//! cleared by [`Token::clear_forces`] at the start of each frame and consumed
//! by [`Token::integrate`].

mod shape;
mod vector;

pub use shape::{clamp_extent, Shape, MIN_EXTENT};
pub use vector::Vec2;

use crate::config::{non_negative, AnimationSettings, CollisionSettings};
use std::fmt;

/// Forces with a magnitude at or below this count as "no force" for the
/// home-seeking idle timer
pub const FORCE_EPSILON: f64 = 1e-6;

/// Identifier of a token: its index in the simulation roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(usize);

impl TokenId {
    /// Create a new TokenId from a roster index
    pub const fn new(index: usize) -> Self {
        TokenId(index)
    }

    /// Get the roster index
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

/// Lifecycle state of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Fading in after creation; integrates but takes no part in peer collision
    Spawning,
    /// Fully simulated
    Active,
    /// Left the canvas; waiting for the respawn delay
    Dead,
    /// Being reset to home; only observable inside the lifecycle sweep
    Respawning,
}

impl LifecycleState {
    /// Whether tokens in this state integrate and appear in the spatial index
    pub fn is_alive(self) -> bool {
        self != LifecycleState::Dead
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Spawning => "spawning",
            LifecycleState::Active => "active",
            LifecycleState::Dead => "dead",
            LifecycleState::Respawning => "respawning",
        };
        f.write_str(name)
    }
}

/// Per-token switches for the optional force sources
///
/// All gates are open by default. A closed gate removes that force source
/// for the token regardless of the global configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BehaviorGates {
    /// Allow flocking forces
    pub flocking: bool,
    /// Allow the mouse force field
    pub mouse_force: bool,
    /// Allow home-seeking
    pub home_seeking: bool,
}

impl Default for BehaviorGates {
    fn default() -> Self {
        BehaviorGates {
            flocking: true,
            mouse_force: true,
            home_seeking: true,
        }
    }
}

/// Simulated token
///
/// # Examples
///
/// ```
/// use token_swarm::token::{LifecycleState, Token, TokenId, Vec2};
///
/// let mut token = Token::new(TokenId::new(0), Vec2::new(50.0, 50.0), Vec2::new(20.0, 20.0));
/// assert_eq!(token.lifecycle(), LifecycleState::Spawning);
///
/// token.apply_force(Vec2::new(10.0, 0.0));
/// token.integrate(0.5, 0.0);
/// assert_eq!(token.velocity(), Vec2::new(5.0, 0.0));
/// assert_eq!(token.position(), Vec2::new(52.5, 50.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    id: TokenId,
    position: Vec2,
    velocity: Vec2,
    home: Vec2,
    size: Vec2,
    rotation: f64,
    scale: f64,
    opacity: u8,
    shape: Shape,
    mass: f64,
    gates: BehaviorGates,
    lifecycle: LifecycleState,
    state_entered_at: f64,
    last_net_force: Vec2,
    time_since_last_force: f64,
    respawn_collision_grace_until: f64,
    bounce_triggered: bool,
    bounce_started_at: Option<f64>,
    fade_started_at: Option<f64>,
    force: Vec2,
    external_force: bool,
}

impl Token {
    /// Create a token at its home position with a circular collision shape
    ///
    /// Sizes are clamped to [`MIN_EXTENT`]. The token starts in
    /// [`LifecycleState::Spawning`] at time zero with zero opacity.
    pub fn new(id: TokenId, home: Vec2, size: Vec2) -> Self {
        let size = Vec2::new(clamp_extent(size.x), clamp_extent(size.y));
        Token {
            id,
            position: home,
            velocity: Vec2::ZERO,
            home,
            size,
            rotation: 0.0,
            scale: 1.0,
            opacity: 0,
            shape: Shape::circle_for(size),
            mass: 1.0,
            gates: BehaviorGates::default(),
            lifecycle: LifecycleState::Spawning,
            state_entered_at: 0.0,
            last_net_force: Vec2::ZERO,
            time_since_last_force: 0.0,
            respawn_collision_grace_until: 0.0,
            bounce_triggered: false,
            bounce_started_at: None,
            fade_started_at: None,
            force: Vec2::ZERO,
            external_force: false,
        }
    }

    /// Create a token whose shape follows the collision settings
    ///
    /// The shape is derived from `size * bounds_scale`; a shape type starting
    /// with `rect` produces a rectangle, anything else a circle.
    pub fn from_settings(id: TokenId, home: Vec2, size: Vec2, collision: &CollisionSettings) -> Self {
        let token = Token::new(id, home, size);
        let bounds = token.size * collision.effective_bounds_scale();
        let shape = if collision.is_rect_mode() {
            Shape::rect_for(bounds)
        } else {
            Shape::circle_for(bounds)
        };
        token.with_shape(shape)
    }

    /// Replace the collision shape, clamping its dimensions
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape.scaled(1.0);
        self
    }

    /// Override the effective mass; non-positive or non-finite values mean 1.0
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = if mass.is_finite() && mass > 0.0 { mass } else { 1.0 };
        self
    }

    /// Set the per-token behavior gates
    pub fn with_gates(mut self, gates: BehaviorGates) -> Self {
        self.gates = gates;
        self
    }

    pub(crate) fn set_id(&mut self, id: TokenId) {
        self.id = id;
    }

    /// Token identifier
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Current position (centre)
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current velocity in pixels per second
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Set the velocity
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Home position fixed at creation
    pub fn home(&self) -> Vec2 {
        self.home
    }

    /// Nominal width and height
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Rotation in degrees, clockwise from top
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Set the rotation in degrees
    pub fn set_rotation(&mut self, degrees: f64) {
        if degrees.is_finite() {
            self.rotation = degrees;
        }
    }

    /// Animation scale, 1.0 nominal
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Opacity from 0 (invisible) to 255
    pub fn opacity(&self) -> u8 {
        self.opacity
    }

    /// Unscaled collision shape
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Collision shape multiplied by the animation scale
    pub fn scaled_shape(&self) -> Shape {
        self.shape.scaled(self.scale)
    }

    /// Effective mass
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Behavior gates
    pub fn gates(&self) -> BehaviorGates {
        self.gates
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Whether the token is Active
    pub fn is_active(&self) -> bool {
        self.lifecycle == LifecycleState::Active
    }

    /// Simulation time of the last lifecycle change
    pub fn state_entered_at(&self) -> f64 {
        self.state_entered_at
    }

    /// Net force integrated during the last frame
    pub fn last_net_force(&self) -> Vec2 {
        self.last_net_force
    }

    /// Seconds since a non-home force was last applied
    pub fn time_since_last_force(&self) -> f64 {
        self.time_since_last_force
    }

    /// End of the post-respawn collision grace window
    pub fn respawn_collision_grace_until(&self) -> f64 {
        self.respawn_collision_grace_until
    }

    /// Whether the token is excluded from peer collision at time `now`
    pub fn in_collision_grace(&self, now: f64) -> bool {
        now < self.respawn_collision_grace_until
    }

    /// Set when a collision fired the bounce-pop this frame
    pub fn bounce_triggered(&self) -> bool {
        self.bounce_triggered
    }

    /// Force accumulated so far this frame
    pub fn accumulated_force(&self) -> Vec2 {
        self.force
    }

    /// Whether a non-home force above [`FORCE_EPSILON`] was applied this frame
    pub fn has_external_force(&self) -> bool {
        self.external_force
    }

    /// Accumulate a force for this frame
    ///
    /// Non-finite contributions are dropped. Returns whether the force was
    /// accepted.
    pub fn apply_force(&mut self, force: Vec2) -> bool {
        if !self.accumulate(force) {
            return false;
        }
        if force.length() > FORCE_EPSILON {
            self.external_force = true;
        }
        true
    }

    /// Accumulate a home-seeking force
    ///
    /// Unlike [`Token::apply_force`] this does not reset the idle timer, so
    /// home-seeking keeps itself engaged.
    pub fn apply_home_force(&mut self, force: Vec2) -> bool {
        self.accumulate(force)
    }

    fn accumulate(&mut self, force: Vec2) -> bool {
        if !force.is_valid() {
            tracing::debug!(token = %self.id, ?force, "dropping non-finite force contribution");
            return false;
        }
        self.force += force;
        true
    }

    /// Clear the force buffer and the per-frame flags
    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.external_force = false;
        self.bounce_triggered = false;
    }

    /// Advance one explicit Euler step
    ///
    /// `velocity += (force / mass) * dt; position += velocity * dt`, then the
    /// velocity loses `damping * dt` of its magnitude (never reversing).
    pub fn integrate(&mut self, dt: f64, damping: f64) {
        let acceleration = self.force / self.mass;
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        let damping = non_negative(damping);
        if damping > 0.0 {
            self.velocity *= (1.0 - damping * dt).max(0.0);
        }
        self.last_net_force = self.force;
    }

    /// Reset or advance the home-seeking idle timer
    pub fn update_force_timer(&mut self, dt: f64) {
        if self.external_force {
            self.time_since_last_force = 0.0;
        } else {
            self.time_since_last_force += dt;
        }
    }

    /// Whether position and velocity are finite
    pub fn is_kinematically_valid(&self) -> bool {
        self.position.is_valid() && self.velocity.is_valid()
    }

    /// Put the token back at home at rest after a numerical anomaly
    ///
    /// The lifecycle state is left unchanged.
    pub fn recover_to_home(&mut self) {
        self.position = self.home;
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
    }

    /// Restart a Spawning token's fade-in at `now`; other states are untouched
    pub(crate) fn restart_spawn(&mut self, now: f64) {
        if self.lifecycle == LifecycleState::Spawning {
            self.state_entered_at = now;
            self.opacity = 0;
            self.fade_started_at = None;
        }
    }

    pub(crate) fn restore_kinematics(&mut self, position: Vec2, velocity: Vec2) {
        self.position = position;
        self.velocity = velocity;
        self.force = Vec2::ZERO;
        self.external_force = false;
    }

    fn enter(&mut self, state: LifecycleState, now: f64) {
        tracing::debug!(token = %self.id, from = %self.lifecycle, to = %state, now, "lifecycle transition");
        self.lifecycle = state;
        self.state_entered_at = now;
    }

    /// Spawning to Active: opacity becomes full
    pub fn activate(&mut self, now: f64) -> bool {
        if self.lifecycle != LifecycleState::Spawning {
            return false;
        }
        self.enter(LifecycleState::Active, now);
        self.opacity = u8::MAX;
        self.fade_started_at = None;
        true
    }

    /// Active to Dead: velocity is zeroed
    ///
    /// The caller is responsible for scheduling the respawn.
    pub fn kill(&mut self, now: f64) -> bool {
        if self.lifecycle != LifecycleState::Active {
            return false;
        }
        self.enter(LifecycleState::Dead, now);
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
        true
    }

    /// Dead to Respawning: position returns to home
    pub fn begin_respawn(&mut self, now: f64) -> bool {
        if self.lifecycle != LifecycleState::Dead {
            return false;
        }
        self.enter(LifecycleState::Respawning, now);
        self.position = self.home;
        true
    }

    /// Respawning to Active: at rest with a collision grace window of `grace` seconds
    pub fn reset_to_home(&mut self, now: f64, grace: f64) -> bool {
        if self.lifecycle != LifecycleState::Respawning {
            return false;
        }
        self.position = self.home;
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
        self.scale = 1.0;
        self.bounce_started_at = None;
        self.time_since_last_force = 0.0;
        self.respawn_collision_grace_until = now + non_negative(grace);
        self.opacity = u8::MAX;
        self.enter(LifecycleState::Active, now);
        true
    }

    /// Raise the trigger flag and start the bounce-pop animation
    ///
    /// A running animation is not restarted, so tokens resting against each
    /// other still complete the pop.
    pub fn trigger_bounce(&mut self, now: f64) {
        self.bounce_triggered = true;
        if self.bounce_started_at.is_none() {
            self.bounce_started_at = Some(now);
        }
    }

    /// Whether the bounce-pop animation is running
    pub fn is_bouncing(&self) -> bool {
        self.bounce_started_at.is_some()
    }

    /// Drive `scale` from the bounce-pop clock
    ///
    /// Scale ramps linearly to `bounce_scale` over the first half of the
    /// animation and back to 1.0 over the second half.
    pub fn advance_bounce(&mut self, now: f64, animation: &AnimationSettings) {
        let Some(started) = self.bounce_started_at else {
            return;
        };
        let duration = non_negative(animation.bounce_duration_ms) / 1000.0;
        let elapsed = now - started;
        if duration <= 0.0 || elapsed >= duration {
            self.scale = 1.0;
            self.bounce_started_at = None;
            return;
        }
        let half = duration * 0.5;
        let peak = if animation.bounce_scale.is_finite() {
            animation.bounce_scale.max(0.0)
        } else {
            1.0
        };
        let progress = if elapsed < half {
            elapsed / half
        } else {
            1.0 - (elapsed - half) / half
        };
        self.scale = 1.0 + (peak - 1.0) * progress.clamp(0.0, 1.0);
    }

    /// Start a visual fade-in from zero opacity
    pub fn start_fade(&mut self, now: f64) {
        self.fade_started_at = Some(now);
        self.opacity = 0;
    }

    /// Update opacity for a running fade-in. Returns true once the fade is complete.
    pub fn advance_fade(&mut self, now: f64, duration: f64) -> bool {
        let started = match (self.lifecycle, self.fade_started_at) {
            (LifecycleState::Spawning, _) => self.state_entered_at,
            (_, Some(started)) => started,
            (_, None) => return true,
        };
        let duration = non_negative(duration);
        let elapsed = now - started;
        if duration <= 0.0 || elapsed >= duration {
            self.opacity = u8::MAX;
            self.fade_started_at = None;
            return true;
        }
        let progress = (elapsed / duration).clamp(0.0, 1.0);
        self.opacity = (f64::from(u8::MAX) * progress) as u8;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new(TokenId::new(3), Vec2::new(10.0, 20.0), Vec2::new(8.0, 8.0))
    }

    fn active_token() -> Token {
        let mut t = token();
        assert!(t.activate(0.0));
        t
    }

    #[test]
    fn test_token_creation() {
        let t = token();
        assert_eq!(t.id().index(), 3);
        assert_eq!(t.position(), t.home());
        assert_eq!(t.lifecycle(), LifecycleState::Spawning);
        assert_eq!(t.opacity(), 0);
        assert_eq!(t.shape(), Shape::Circle { radius: 4.0 });
    }

    #[test]
    fn test_shape_from_settings() {
        let mut collision = CollisionSettings::default();
        collision.bounds_scale = 2.0;
        let t = Token::from_settings(TokenId::new(0), Vec2::ZERO, Vec2::new(10.0, 6.0), &collision);
        assert_eq!(t.shape(), Shape::Circle { radius: 6.0 });

        collision.kind = "rect".to_string();
        let t = Token::from_settings(TokenId::new(0), Vec2::ZERO, Vec2::new(10.0, 6.0), &collision);
        assert_eq!(t.shape(), Shape::Rect { width: 20.0, height: 12.0 });
    }

    #[test]
    fn test_invalid_mass_falls_back() {
        assert_eq!(token().with_mass(-2.0).mass(), 1.0);
        assert_eq!(token().with_mass(f64::NAN).mass(), 1.0);
        assert_eq!(token().with_mass(4.0).mass(), 4.0);
    }

    #[test]
    fn test_force_accumulation_and_integration() {
        let mut t = token().with_mass(2.0);
        t.apply_force(Vec2::new(4.0, 0.0));
        t.apply_force(Vec2::new(0.0, -2.0));
        assert!(t.has_external_force());

        t.integrate(1.0, 0.0);
        assert_eq!(t.velocity(), Vec2::new(2.0, -1.0));
        assert_eq!(t.position(), Vec2::new(12.0, 19.0));
        assert_eq!(t.last_net_force(), Vec2::new(4.0, -2.0));
    }

    #[test]
    fn test_non_finite_force_dropped() {
        let mut t = token();
        assert!(!t.apply_force(Vec2::new(f64::NAN, 1.0)));
        assert!(!t.apply_force(Vec2::new(f64::INFINITY, 0.0)));
        assert_eq!(t.accumulated_force(), Vec2::ZERO);
        assert!(!t.has_external_force());
    }

    #[test]
    fn test_home_force_keeps_idle_timer() {
        let mut t = token();
        t.apply_home_force(Vec2::new(1.0, 0.0));
        t.update_force_timer(0.5);
        assert_eq!(t.time_since_last_force(), 0.5);

        t.clear_forces();
        t.apply_force(Vec2::new(1.0, 0.0));
        t.update_force_timer(0.5);
        assert_eq!(t.time_since_last_force(), 0.0);
    }

    #[test]
    fn test_negligible_force_is_not_external() {
        let mut t = token();
        t.apply_force(Vec2::new(1e-9, 0.0));
        assert!(!t.has_external_force());
    }

    #[test]
    fn test_damping_reduces_velocity() {
        let mut t = token();
        t.set_velocity(Vec2::new(10.0, 0.0));
        t.integrate(0.5, 1.0);
        assert_eq!(t.velocity(), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_lifecycle_table() {
        let mut t = token();
        assert!(!t.kill(0.0), "spawning tokens cannot die");
        assert!(t.activate(0.1));
        assert_eq!(t.opacity(), 255);

        t.set_position(Vec2::new(-5.0, 0.0));
        t.set_velocity(Vec2::new(-3.0, 0.0));
        assert!(t.kill(1.0));
        assert_eq!(t.lifecycle(), LifecycleState::Dead);
        assert_eq!(t.velocity(), Vec2::ZERO);
        assert_eq!(t.state_entered_at(), 1.0);

        assert!(!t.reset_to_home(1.5, 0.5), "dead tokens must pass through respawning");
        assert!(t.begin_respawn(1.5));
        assert_eq!(t.position(), t.home());
        assert!(t.reset_to_home(1.5, 0.5));
        assert!(t.is_active());
        assert_eq!(t.respawn_collision_grace_until(), 2.0);
        assert!(t.in_collision_grace(1.9));
        assert!(!t.in_collision_grace(2.0));
    }

    #[test]
    fn test_recover_to_home() {
        let mut t = active_token();
        t.set_position(Vec2::new(f64::NAN, 0.0));
        assert!(!t.is_kinematically_valid());
        t.recover_to_home();
        assert!(t.is_kinematically_valid());
        assert_eq!(t.position(), t.home());
        assert!(t.is_active());
    }

    #[test]
    fn test_bounce_animation_peaks_halfway() {
        let animation = AnimationSettings::default();
        let mut t = active_token();
        t.trigger_bounce(0.0);
        assert!(t.bounce_triggered());

        t.advance_bounce(0.075, &animation);
        assert!((t.scale() - 1.2).abs() < 1e-9);

        t.advance_bounce(0.1125, &animation);
        assert!((t.scale() - 1.1).abs() < 1e-9);

        t.advance_bounce(0.2, &animation);
        assert_eq!(t.scale(), 1.0);
        assert!(!t.is_bouncing());

        t.clear_forces();
        assert!(!t.bounce_triggered());
    }

    #[test]
    fn test_retrigger_keeps_running_bounce() {
        let animation = AnimationSettings::default();
        let mut t = active_token();
        t.trigger_bounce(0.0);
        t.clear_forces();
        t.trigger_bounce(0.075);
        t.advance_bounce(0.075, &animation);
        assert!(t.bounce_triggered());
        assert!((t.scale() - 1.2).abs() < 1e-9);

        // A finished animation can be triggered again
        t.advance_bounce(0.2, &animation);
        t.trigger_bounce(0.2);
        assert!(t.is_bouncing());
    }

    #[test]
    fn test_restart_spawn_only_touches_spawning() {
        let mut t = token();
        t.restart_spawn(3.0);
        assert_eq!(t.state_entered_at(), 3.0);
        assert!(!t.advance_fade(3.25, 0.5));

        let mut a = active_token();
        a.restart_spawn(3.0);
        assert_eq!(a.state_entered_at(), 0.0);
        assert_eq!(a.opacity(), 255);
    }

    #[test]
    fn test_fade_while_spawning() {
        let mut t = token();
        assert!(!t.advance_fade(0.25, 0.5));
        assert_eq!(t.opacity(), 127);
        assert!(t.advance_fade(0.5, 0.5));
        assert_eq!(t.opacity(), 255);
    }
}
