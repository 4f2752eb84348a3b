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
//! Configuration snapshot
//!
//! [`SimulationConfig`] is an immutable value holding every tunable the
//! simulation reads during a frame. The host parses and validates its own
//! configuration source and hands the engine a snapshot by reference each
//! frame; the engine never mutates it and never reads settings from anywhere
//! else.
//!
//! Every section derives `Deserialize` with `#[serde(default)]`, so a partial
//! document fills the missing keys with the defaults documented on each
//! field.
//!
//! # Behavior arrays
//!
//! `spawn_behavior`, `collision_behavior` and `exit_behavior` are ordered
//! sequences so that behaviors can be stacked in a later revision. Only the
//! first element is consulted today.
//!
//! # Reserved collision fields
//!
//! [`CollisionSettings::strength`], [`CollisionSettings::separation_strength`],
//! [`CollisionSettings::elastic`] and [`CollisionSettings::friction`] are
//! carried for compatibility with existing configuration files. They do not
//! affect the physics.

use serde::{Deserialize, Serialize};

/// Complete per-frame configuration snapshot
///
/// # Examples
///
/// ```
/// use token_swarm::config::SimulationConfig;
///
/// let config = SimulationConfig::default();
/// assert_eq!(config.physics.bounce_factor, 0.8);
/// assert!(!config.tokens.enable_wall_bounce);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Token behavior settings
    pub tokens: TokenSettings,
    /// Mouse force field
    pub mouse_force: MouseForceSettings,
    /// Global physics constants
    pub physics: PhysicsSettings,
    /// Lifecycle timers
    pub timing: TimingSettings,
    /// Visual animation triggers
    pub animation: AnimationSettings,
}

/// Settings under the `tokens` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Reflect off canvas edges (true) or die on exit (false). Default false.
    pub enable_wall_bounce: bool,
    /// Rotate tokens to face the mouse. Default false.
    pub look_at_mouse: bool,
    /// Which side of the token artwork is its front. Default top.
    pub facing: Facing,
    /// Extra rotation added when facing the mouse, in degrees. Default 0.
    pub rotation_offset_degrees: f64,
    /// How tokens appear. Only index 0 is used. Default `[fade_in]`.
    pub spawn_behavior: Vec<SpawnBehavior>,
    /// How tokens react to collisions. Only index 0 is used. Default `[bounce_pop]`.
    pub collision_behavior: Vec<CollisionBehavior>,
    /// How tokens leave. Only index 0 is used. Default `[die]`.
    pub exit_behavior: Vec<ExitBehavior>,
    /// Peer collision settings
    pub collision: CollisionSettings,
    /// Home-seeking settings
    pub finds_home: HomeSettings,
    /// Flocking settings
    pub flocking: FlockingSettings,
}

impl Default for TokenSettings {
    fn default() -> Self {
        TokenSettings {
            enable_wall_bounce: false,
            look_at_mouse: false,
            facing: Facing::Top,
            rotation_offset_degrees: 0.0,
            spawn_behavior: vec![SpawnBehavior::FadeIn],
            collision_behavior: vec![CollisionBehavior::BouncePop],
            exit_behavior: vec![ExitBehavior::Die],
            collision: CollisionSettings::default(),
            finds_home: HomeSettings::default(),
            flocking: FlockingSettings::default(),
        }
    }
}

impl TokenSettings {
    /// Active spawn behavior (index 0, or the default when the list is empty)
    pub fn spawn_behavior(&self) -> SpawnBehavior {
        self.spawn_behavior.first().copied().unwrap_or_default()
    }

    /// Active collision behavior (index 0, or the default when the list is empty)
    pub fn collision_behavior(&self) -> CollisionBehavior {
        self.collision_behavior.first().copied().unwrap_or_default()
    }
}

/// Token artwork orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Front points up
    #[default]
    Top,
    /// Front points right
    Right,
    /// Front points down
    Bottom,
    /// Front points left
    Left,
}

impl Facing {
    /// Offset in degrees that aligns the artwork front with a screen-space heading
    pub fn offset_degrees(self) -> f64 {
        match self {
            Facing::Top => 90.0,
            Facing::Right => 0.0,
            Facing::Bottom => -90.0,
            Facing::Left => 180.0,
        }
    }
}

/// Spawn behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnBehavior {
    /// Opacity ramps from 0 to full over `timing.fade_in_duration_sec`
    #[default]
    FadeIn,
    /// Fully visible and active immediately
    InstantIn,
}

/// Collision reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionBehavior {
    /// Strong collisions trigger the scale-bounce animation
    #[default]
    BouncePop,
    /// Unrecognized behaviors: physics only, no animation trigger
    #[serde(other)]
    None,
}

/// Exit reaction, carried for compatibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitBehavior {
    /// Token dies and respawns at home
    #[default]
    Die,
    /// Unrecognized exit behavior
    #[serde(other)]
    Other,
}

/// Settings under `tokens.collision`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionSettings {
    /// Peer collisions enabled. Default true.
    pub enabled: bool,
    /// Shape type; any value starting with `rect` selects rectangles. Default `circle`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Multiplier from token size to collision bounds. Default 1.0.
    pub bounds_scale: f64,
    /// Reserved, inert. Default 1.0.
    pub strength: f64,
    /// Reserved, inert. Default 1.0.
    pub separation_strength: f64,
    /// Reserved, inert. Default true.
    pub elastic: bool,
    /// Reserved, inert. Default 0.0.
    pub friction: f64,
}

impl Default for CollisionSettings {
    fn default() -> Self {
        CollisionSettings {
            enabled: true,
            kind: "circle".to_string(),
            bounds_scale: 1.0,
            strength: 1.0,
            separation_strength: 1.0,
            elastic: true,
            friction: 0.0,
        }
    }
}

impl CollisionSettings {
    /// Whether the configured shape type selects rectangle mode
    pub fn is_rect_mode(&self) -> bool {
        self.kind.trim().to_ascii_lowercase().starts_with("rect")
    }

    /// Bounds scale with non-finite or negative values replaced by 1.0
    pub fn effective_bounds_scale(&self) -> f64 {
        if self.bounds_scale.is_finite() && self.bounds_scale >= 0.0 {
            self.bounds_scale
        } else {
            1.0
        }
    }
}

/// Settings under `tokens.finds_home`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeSettings {
    /// Default false.
    pub enabled: bool,
    /// Idle time before the home force engages, seconds. Default 2.0.
    pub delay_sec: f64,
    /// Force magnitude. Default 0.5.
    pub strength: f64,
}

impl Default for HomeSettings {
    fn default() -> Self {
        HomeSettings {
            enabled: false,
            delay_sec: 2.0,
            strength: 0.5,
        }
    }
}

/// Settings under `tokens.flocking`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingSettings {
    /// Default false.
    pub enabled: bool,
    /// Neighbor radius. Default 100.
    pub radius: f64,
    /// Velocity matching weight. Default 0.5.
    pub alignment: f64,
    /// Centre-of-mass attraction weight. Default 0.5.
    pub cohesion: f64,
    /// Crowding repulsion weight. Default 0.5.
    pub separation: f64,
}

impl Default for FlockingSettings {
    fn default() -> Self {
        FlockingSettings {
            enabled: false,
            radius: 100.0,
            alignment: 0.5,
            cohesion: 0.5,
            separation: 0.5,
        }
    }
}

/// Distance-to-magnitude mapping for the mouse force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Falloff {
    /// `1 - d / max`
    #[default]
    Linear,
    /// `1 / (d + 1)`
    Inverse,
    /// `(1 - d / max)^2`
    Quadratic,
    /// Hermite smoothstep of `1 - d / max`
    Smoothstep,
    /// Unrecognized names: full strength everywhere inside `max_distance`
    #[serde(other)]
    Constant,
}

/// Settings under `mouse_force`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MouseForceSettings {
    /// Default false.
    pub enabled: bool,
    /// Radius of influence. Default 200.
    pub max_distance: f64,
    /// Peak magnitude. Default 1.0.
    pub force_strength: f64,
    /// Default linear.
    pub falloff: Falloff,
    /// Multiply the force by the mouse speed (pixels per second). Default false.
    pub scale_by_mouse_speed: bool,
}

impl Default for MouseForceSettings {
    fn default() -> Self {
        MouseForceSettings {
            enabled: false,
            max_distance: 200.0,
            force_strength: 1.0,
            falloff: Falloff::Linear,
            scale_by_mouse_speed: false,
        }
    }
}

/// Settings under `physics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Energy retained by wall and peer bounces. Default 0.8.
    pub bounce_factor: f64,
    /// Fraction of velocity removed per second. Default 0.0.
    pub damping: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        PhysicsSettings {
            bounce_factor: 0.8,
            damping: 0.0,
        }
    }
}

impl PhysicsSettings {
    /// Bounce factor clamped to `[0, 1]`; non-finite values fall back to the default
    pub fn effective_bounce_factor(&self) -> f64 {
        if self.bounce_factor.is_finite() {
            self.bounce_factor.clamp(0.0, 1.0)
        } else {
            PhysicsSettings::default().bounce_factor
        }
    }
}

/// Settings under `timing`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Spawning to Active delay. Default 0.5.
    pub fade_in_duration_sec: f64,
    /// Dead to Respawning delay. Default 0.5.
    pub respawn_delay_sec: f64,
    /// Peer-collision grace after respawn. Default 0.5.
    pub respawn_collision_delay_sec: f64,
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            fade_in_duration_sec: 0.5,
            respawn_delay_sec: 0.5,
            respawn_collision_delay_sec: 0.5,
        }
    }
}

/// Settings under `animation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Minimum collision intensity that fires the bounce-pop. Default 0.3.
    pub bounce_threshold: f64,
    /// Length of the bounce-pop. Default 150.
    pub bounce_duration_ms: f64,
    /// Peak scale reached halfway through the bounce-pop. Default 1.2.
    pub bounce_scale: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        AnimationSettings {
            bounce_threshold: 0.3,
            bounce_duration_ms: 150.0,
            bounce_scale: 1.2,
        }
    }
}

/// Treat negative or non-finite durations as zero
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
