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
//! Token behavior API
//!
//! A [`TokenBehavior`] customises how every token in a simulation is drawn,
//! pushed, integrated and how it reacts to collisions, while the frame
//! order stays fixed. Each hook has a default, so an implementation only
//! overrides what it changes.
//!
//! # Contracts
//!
//! Behaviors must:
//! - Only mutate the token they are handed
//! - Return an error instead of panicking; the simulation then restores the
//!   token's frame-start kinematics and skips it for the rest of the frame
//! - Be `Send + Sync`, since the force hook may run on several threads

use crate::collision::{self, Canvas, CollisionEvent};
use crate::config::SimulationConfig;
use crate::error::BehaviorError;
use crate::forces::{self, Kinematics, MouseState};
use crate::spatial::SpatialIndex;
use crate::token::{LifecycleState, Shape, Token, TokenId, Vec2};

/// Version of the behavior API
///
/// Format: MAJOR.MINOR.PATCH following semantic versioning.
pub const BEHAVIOR_API_VERSION: &str = "0.1.0";

/// Read-only view of the frame handed to behavior hooks
///
/// Everything here is fixed for the duration of the frame.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorContext<'a> {
    config: &'a SimulationConfig,
    index: &'a SpatialIndex,
    snapshot: &'a [Kinematics],
    mouse: MouseState,
    canvas: Canvas,
    now: f64,
    dt: f64,
}

impl<'a> BehaviorContext<'a> {
    /// Only the simulation builds contexts.
    pub(crate) fn new(
        config: &'a SimulationConfig,
        index: &'a SpatialIndex,
        snapshot: &'a [Kinematics],
        mouse: MouseState,
        canvas: Canvas,
        now: f64,
        dt: f64,
    ) -> Self {
        BehaviorContext {
            config,
            index,
            snapshot,
            mouse,
            canvas,
            now,
            dt,
        }
    }

    /// Configuration snapshot for this frame
    pub fn config(&self) -> &'a SimulationConfig {
        self.config
    }

    /// Spatial index built at the start of the frame
    pub fn index(&self) -> &'a SpatialIndex {
        self.index
    }

    /// Frame-start kinematics of every token, indexed by [`TokenId`]
    pub fn snapshot(&self) -> &'a [Kinematics] {
        self.snapshot
    }

    /// Frame-start kinematics of one token
    pub fn kinematics(&self, id: TokenId) -> Option<&'a Kinematics> {
        self.snapshot.get(id.index())
    }

    /// Mouse input
    pub fn mouse(&self) -> MouseState {
        self.mouse
    }

    /// Canvas bounds
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Simulation time at the end of this frame, seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Frame delta, seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }
}

/// Render description of one token
///
/// The simulation draws nothing itself; this is what a renderer needs to
/// draw the token this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenAppearance {
    /// Token the description belongs to
    pub id: TokenId,
    /// Centre position
    pub position: Vec2,
    /// Nominal size before animation scale
    pub size: Vec2,
    /// Collision shape, unscaled
    pub shape: Shape,
    /// Degrees clockwise from top
    pub rotation: f64,
    /// Animation scale
    pub scale: f64,
    /// 0 to 255
    pub opacity: u8,
    /// Whether the bounce-pop fired this frame
    pub bounce_triggered: bool,
    /// False for Dead tokens
    pub visible: bool,
}

impl From<&Token> for TokenAppearance {
    fn from(token: &Token) -> Self {
        TokenAppearance {
            id: token.id(),
            position: token.position(),
            size: token.size(),
            shape: token.shape(),
            rotation: token.rotation(),
            scale: token.scale(),
            opacity: token.opacity(),
            bounce_triggered: token.bounce_triggered(),
            visible: token.lifecycle() != LifecycleState::Dead,
        }
    }
}

/// Pluggable per-token behavior
///
/// # Example
///
/// ```
/// use token_swarm::error::BehaviorError;
/// use token_swarm::plugins::{BehaviorContext, TokenBehavior};
/// use token_swarm::token::{Token, Vec2};
///
/// /// Constant downward wind on top of nothing else
/// struct Wind;
///
/// impl TokenBehavior for Wind {
///     fn name(&self) -> &str { "wind" }
///     fn version(&self) -> &str { "1.0.0" }
///
///     fn apply_forces(&self, token: &mut Token, _ctx: &BehaviorContext<'_>) -> Result<(), BehaviorError> {
///         token.apply_force(Vec2::new(0.0, 9.8));
///         Ok(())
///     }
/// }
/// ```
pub trait TokenBehavior: Send + Sync {
    /// Name used for registration and selection; must be unique
    fn name(&self) -> &str;

    /// Version of this behavior
    fn version(&self) -> &str;

    /// Behavior API version this behavior was built against
    fn api_version(&self) -> &str {
        BEHAVIOR_API_VERSION
    }

    /// Describe how to draw the token
    fn generate_image(&self, token: &Token) -> TokenAppearance {
        TokenAppearance::from(token)
    }

    /// Accumulate this frame's forces
    ///
    /// Runs for every live token after the force buffers were cleared.
    fn apply_forces(&self, token: &mut Token, ctx: &BehaviorContext<'_>) -> Result<(), BehaviorError> {
        forces::apply_standard_forces(token, ctx);
        Ok(())
    }

    /// Advance the token's kinematics by one frame
    ///
    /// Fails with [`BehaviorError::NonFinite`] when integration leaves the
    /// position or velocity non-finite.
    fn update_physics(&self, token: &mut Token, ctx: &BehaviorContext<'_>) -> Result<(), BehaviorError> {
        token.integrate(ctx.dt(), ctx.config().physics.damping);
        if !token.is_kinematically_valid() {
            return Err(BehaviorError::NonFinite("kinematics"));
        }
        Ok(())
    }

    /// React to a peer contact or a boundary crossing
    fn process_collision(
        &self,
        token: &mut Token,
        event: &CollisionEvent,
        ctx: &BehaviorContext<'_>,
    ) -> Result<(), BehaviorError> {
        collision::respond(token, event, ctx.config(), ctx.now());
        Ok(())
    }
}
