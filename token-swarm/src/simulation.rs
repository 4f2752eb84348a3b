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
//! Frame orchestration
//!
//! [`Simulation::step`] advances every token by one frame in a fixed order:
//!
//! 1. Compute `dt` (explicit input, or the [`FrameClock`]) and advance time.
//!    Only wall-clock deltas are capped at [`MAX_FRAME_DT`].
//! 2. Clear force buffers and animation-trigger flags
//! 3. Snapshot kinematics and rebuild the spatial index
//! 4. Accumulate forces (`TokenBehavior::apply_forces`)
//! 5. Integrate (`TokenBehavior::update_physics`)
//! 6. Peer collisions, then the canvas boundary (`TokenBehavior::process_collision`)
//! 7. Lifecycle sweep: respawns, fade-in, bounce-pop
//! 8. Update each token's idle timer
//!
//! # Failure isolation
//!
//! Nothing in a frame returns an error. If a behavior hook fails for one
//! token, that token gets its frame-start position and velocity back and
//! is skipped for the remaining hooks of the frame; every other token
//! proceeds. Non-finite kinematics after integration or collision send the
//! token home at rest and are counted in [`FrameStats::anomalies`].
//!
//! # Parallelism
//!
//! With the `parallel` feature the force pass (step 4) runs on rayon. Each
//! token's force only reads the frame-start snapshot, so the result equals
//! the sequential pass.

use crate::collision::{boundary_hit, Canvas, CollisionEvent, CollisionResolver};
use crate::config::SimulationConfig;
use crate::error::{BehaviorError, RegistryError};
use crate::forces::{Kinematics, MouseState};
use crate::lifecycle::LifecycleManager;
use crate::plugins::{BehaviorContext, BehaviorRegistry, StandardBehavior, TokenAppearance, TokenBehavior};
use crate::spatial::{suggest_cell_size, SpatialIndex};
use crate::token::{LifecycleState, Token, TokenId, Vec2};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Largest wall-clock `dt` a single frame may advance, seconds
///
/// Longer gaps measured by [`FrameClock::Wall`] (a paused window, a
/// debugger stop) are clamped so tokens don't tunnel across the canvas in
/// one step. Explicit and fixed steps are used as given.
pub const MAX_FRAME_DT: f64 = 0.1;

/// Default fixed step: 60 updates per second
pub const DEFAULT_FIXED_STEP: f64 = 1.0 / 60.0;

/// Source of `dt` when the frame input does not supply one
#[derive(Debug, Clone)]
pub enum FrameClock {
    /// Always the same step
    Fixed(f64),
    /// Wall-clock time since the previous frame; zero on the first frame
    Wall(Option<Instant>),
}

impl FrameClock {
    /// Fixed-step clock
    pub fn fixed(step: f64) -> Self {
        FrameClock::Fixed(step)
    }

    /// Wall-clock clock
    pub fn wall() -> Self {
        FrameClock::Wall(None)
    }

    /// Produce the delta for the next frame
    ///
    /// Wall-clock deltas are capped at [`MAX_FRAME_DT`].
    pub fn tick(&mut self) -> f64 {
        match self {
            FrameClock::Fixed(step) => sanitize_dt(*step),
            FrameClock::Wall(last) => {
                let now = Instant::now();
                let dt = last.map_or(0.0, |prev| now.duration_since(prev).as_secs_f64());
                *last = Some(now);
                sanitize_dt(dt).min(MAX_FRAME_DT)
            }
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        FrameClock::Fixed(DEFAULT_FIXED_STEP)
    }
}

/// External input for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Explicit delta in seconds; `None` asks the [`FrameClock`]
    pub dt: Option<f64>,
    /// Cursor position, `None` when outside the canvas
    pub mouse: Option<Vec2>,
    /// Cursor velocity; derived from the previous position when `None`
    pub mouse_velocity: Option<Vec2>,
    /// Canvas bounds
    pub canvas: Canvas,
}

impl FrameInput {
    /// Input with no mouse and no explicit dt
    pub fn new(canvas: Canvas) -> Self {
        FrameInput {
            dt: None,
            mouse: None,
            mouse_velocity: None,
            canvas,
        }
    }

    /// Set an explicit dt
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    /// Set the cursor position
    pub fn with_mouse(mut self, position: Vec2) -> Self {
        self.mouse = Some(position);
        self
    }

    /// Set the cursor velocity
    pub fn with_mouse_velocity(mut self, velocity: Vec2) -> Self {
        self.mouse_velocity = Some(velocity);
        self
    }
}

/// Per-frame diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Delta used, after clamping
    pub dt: f64,
    /// Simulation time at the end of the frame
    pub now: f64,
    /// Active tokens after the frame
    pub active: usize,
    /// Dead tokens after the frame
    pub dead: usize,
    /// Exact overlap tests performed
    pub collision_checks: usize,
    /// Candidate pairs from the broad phase
    pub potential_collisions: usize,
    /// Overlapping pairs found
    pub collisions: usize,
    /// Tokens sent home after non-finite kinematics
    pub anomalies: usize,
    /// Tokens isolated after a behavior hook failure
    pub skipped: usize,
    /// Tokens respawned this frame
    pub respawned: usize,
}

/// Negative and non-finite deltas become zero
pub fn sanitize_dt(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        if raw != 0.0 {
            tracing::debug!(raw, "discarding invalid frame delta");
        }
        return 0.0;
    }
    raw
}

/// The token simulation
pub struct Simulation {
    tokens: Vec<Token>,
    index: SpatialIndex,
    resolver: CollisionResolver,
    lifecycle: LifecycleManager,
    behavior: Arc<dyn TokenBehavior>,
    clock: FrameClock,
    now: f64,
    frame: u64,
    last_mouse: Option<Vec2>,
    snapshot: Vec<Kinematics>,
    skipped: Vec<bool>,
    last_stats: FrameStats,
}

impl Simulation {
    /// Create a simulation using the [`StandardBehavior`]
    ///
    /// Token ids are renumbered to their roster index.
    ///
    /// # Examples
    ///
    /// ```
    /// use token_swarm::{Canvas, FrameInput, Simulation, SimulationConfig, Token, TokenId, Vec2};
    ///
    /// let tokens = vec![Token::new(TokenId::new(0), Vec2::new(50.0, 50.0), Vec2::new(10.0, 10.0))];
    /// let mut sim = Simulation::new(tokens);
    /// let config = SimulationConfig::default();
    ///
    /// let stats = sim.step(&config, &FrameInput::new(Canvas::new(100.0, 100.0)).with_dt(0.5));
    /// assert_eq!(stats.now, 0.5);
    /// ```
    pub fn new(tokens: Vec<Token>) -> Self {
        Self::with_behavior(tokens, Arc::new(StandardBehavior::new()))
    }

    /// Create a simulation driven by the given behavior
    pub fn with_behavior(tokens: Vec<Token>, behavior: Arc<dyn TokenBehavior>) -> Self {
        let mut sim = Simulation {
            tokens: Vec::new(),
            index: SpatialIndex::new(),
            resolver: CollisionResolver::new(),
            lifecycle: LifecycleManager::new(),
            behavior,
            clock: FrameClock::default(),
            now: 0.0,
            frame: 0,
            last_mouse: None,
            snapshot: Vec::new(),
            skipped: Vec::new(),
            last_stats: FrameStats::default(),
        };
        sim.replace_tokens(tokens);
        sim
    }

    /// Create a simulation with a behavior selected from a registry
    pub fn from_registry(tokens: Vec<Token>, registry: &BehaviorRegistry, name: &str) -> Result<Self, RegistryError> {
        let behavior = registry.select(name)?;
        Ok(Self::with_behavior(tokens, behavior))
    }

    /// Use a different clock when frames don't carry an explicit dt
    pub fn with_clock(mut self, clock: FrameClock) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the whole roster, e.g. after the canvas was resized
    ///
    /// Ids are renumbered and the respawn queue is rebuilt from any Dead
    /// tokens in the new roster. Spawning tokens start their fade-in at the
    /// current simulation time.
    pub fn replace_tokens(&mut self, mut tokens: Vec<Token>) {
        for (index, token) in tokens.iter_mut().enumerate() {
            token.set_id(TokenId::new(index));
        }
        tracing::info!(
            previous = self.tokens.len(),
            tokens = tokens.len(),
            behavior = self.behavior.name(),
            "token roster replaced"
        );
        for token in tokens.iter_mut() {
            token.restart_spawn(self.now);
        }
        self.tokens = tokens;
        self.lifecycle.reset(&self.tokens);
        self.snapshot.clear();
        self.skipped.clear();
    }

    /// Advance one frame
    pub fn step(&mut self, config: &SimulationConfig, input: &FrameInput) -> FrameStats {
        // 1. Time
        let dt = match input.dt {
            Some(dt) => sanitize_dt(dt),
            None => self.clock.tick(),
        };
        self.now += dt;
        self.frame += 1;
        let now = self.now;
        let frame = self.frame;
        let mouse = self.mouse_state(input, dt);

        let Simulation {
            tokens,
            index,
            resolver,
            lifecycle,
            behavior,
            snapshot,
            skipped,
            ..
        } = self;
        let behavior: &dyn TokenBehavior = behavior.as_ref();
        let mut stats = FrameStats {
            frame,
            dt,
            now,
            ..FrameStats::default()
        };

        // 2. Per-frame buffers
        for token in tokens.iter_mut() {
            token.clear_forces();
        }
        skipped.clear();
        skipped.resize(tokens.len(), false);

        // 3. Snapshot and broad phase
        snapshot.clear();
        snapshot.extend(tokens.iter().map(Kinematics::of));
        index.rebuild(tokens, suggest_cell_size(tokens));

        let ctx = BehaviorContext::new(config, index, snapshot, mouse, input.canvas, now, dt);

        // 4. Forces
        for (i, err) in force_pass(tokens, behavior, &ctx) {
            isolate(&mut tokens[i], &snapshot[i], &mut skipped[i], behavior.name(), "apply_forces", &err);
        }

        // 5. Integration
        for (i, token) in tokens.iter_mut().enumerate() {
            if skipped[i] || !token.lifecycle().is_alive() {
                continue;
            }
            if let Err(err) = behavior.update_physics(token, &ctx) {
                isolate(token, &snapshot[i], &mut skipped[i], behavior.name(), "update_physics", &err);
            }
        }
        stats.anomalies += recover_anomalies(tokens);

        // 6. Peer collisions, then boundary
        let pairs = resolver.find_peer_collisions(tokens, index, snapshot, skipped, config, now);
        for pair in pairs {
            for (id, contact) in [(pair.a, pair.contact_for_a()), (pair.b, pair.contact_for_b())] {
                let i = id.index();
                if skipped[i] {
                    continue;
                }
                let event = CollisionEvent::Peer(contact);
                if let Err(err) = behavior.process_collision(&mut tokens[i], &event, &ctx) {
                    isolate(&mut tokens[i], &snapshot[i], &mut skipped[i], behavior.name(), "process_collision", &err);
                }
            }
        }
        let collision_stats = resolver.stats();
        stats.collision_checks = collision_stats.collision_checks;
        stats.potential_collisions = collision_stats.potential_collisions;
        stats.collisions = collision_stats.collisions;

        for (i, token) in tokens.iter_mut().enumerate() {
            if skipped[i] || !token.lifecycle().is_alive() {
                continue;
            }
            let Some(hit) = boundary_hit(token.position(), &input.canvas) else {
                continue;
            };
            let event = CollisionEvent::Boundary(hit);
            if let Err(err) = behavior.process_collision(token, &event, &ctx) {
                isolate(token, &snapshot[i], &mut skipped[i], behavior.name(), "process_collision", &err);
            }
        }
        stats.anomalies += recover_anomalies(tokens);

        for (token, start) in tokens.iter().zip(snapshot.iter()) {
            if token.lifecycle() == LifecycleState::Dead && start.lifecycle != LifecycleState::Dead {
                lifecycle.schedule(token.id(), token.state_entered_at());
            }
        }

        // 7. Lifecycle
        let report = lifecycle.sweep(tokens, now, config);
        stats.respawned = report.respawned;

        // 8. Idle timers
        for (token, &skip) in tokens.iter_mut().zip(skipped.iter()) {
            if !skip {
                token.update_force_timer(dt);
            }
        }

        stats.active = lifecycle.active_count();
        stats.dead = lifecycle.dead_count();
        stats.skipped = skipped.iter().filter(|&&s| s).count();
        self.last_stats = stats;
        stats
    }

    fn mouse_state(&mut self, input: &FrameInput, dt: f64) -> MouseState {
        let position = input.mouse.filter(Vec2::is_valid);
        let velocity = match (input.mouse_velocity, position, self.last_mouse) {
            (Some(velocity), _, _) => velocity,
            (None, Some(current), Some(previous)) if dt > 0.0 => (current - previous) / dt,
            _ => Vec2::ZERO,
        };
        self.last_mouse = position;
        MouseState {
            position,
            velocity: if velocity.is_valid() { velocity } else { Vec2::ZERO },
        }
    }

    /// All tokens, indexed by [`TokenId`]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// One token
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id.index())
    }

    /// Mutable access to one token between frames
    pub fn token_mut(&mut self, id: TokenId) -> Option<&mut Token> {
        self.tokens.get_mut(id.index())
    }

    /// Render descriptions of every token, from the behavior's `generate_image`
    pub fn appearances(&self) -> Vec<TokenAppearance> {
        self.tokens.iter().map(|t| self.behavior.generate_image(t)).collect()
    }

    /// Simulation time in seconds: the sum of all frame deltas
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Frames stepped so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Name of the active behavior
    pub fn behavior_name(&self) -> &str {
        self.behavior.name()
    }

    /// Lifecycle counters and respawn queue
    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    /// Spatial index from the last frame
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Stats of the last frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }
}

#[cfg(not(feature = "parallel"))]
fn force_pass(tokens: &mut [Token], behavior: &dyn TokenBehavior, ctx: &BehaviorContext<'_>) -> Vec<(usize, BehaviorError)> {
    tokens
        .iter_mut()
        .enumerate()
        .filter(|(_, t)| t.lifecycle().is_alive())
        .filter_map(|(i, t)| behavior.apply_forces(t, ctx).err().map(|e| (i, e)))
        .collect()
}

#[cfg(feature = "parallel")]
fn force_pass(tokens: &mut [Token], behavior: &dyn TokenBehavior, ctx: &BehaviorContext<'_>) -> Vec<(usize, BehaviorError)> {
    tokens
        .par_iter_mut()
        .enumerate()
        .filter(|(_, t)| t.lifecycle().is_alive())
        .filter_map(|(i, t)| behavior.apply_forces(t, ctx).err().map(|e| (i, e)))
        .collect()
}

fn isolate(token: &mut Token, start: &Kinematics, skipped: &mut bool, behavior: &str, hook: &str, err: &BehaviorError) {
    tracing::warn!(token = %token.id(), behavior, hook, error = %err, "behavior hook failed, token skipped for this frame");
    token.restore_kinematics(start.position, start.velocity);
    *skipped = true;
}

fn recover_anomalies(tokens: &mut [Token]) -> usize {
    let mut recovered = 0;
    for token in tokens.iter_mut() {
        if token.is_kinematically_valid() {
            continue;
        }
        tracing::warn!(
            token = %token.id(),
            position = ?token.position(),
            velocity = ?token.velocity(),
            "non-finite kinematics, sending token home"
        );
        token.recover_to_home();
        recovered += 1;
    }
    recovered
}
