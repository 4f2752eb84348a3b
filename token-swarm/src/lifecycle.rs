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
//! Respawn queue and timed transitions
//!
//! The [`LifecycleManager`] owns the queue of dead tokens and, once per
//! frame, drives every timer-based transition:
//!
//! - Dead tokens whose respawn delay has elapsed go Dead → Respawning →
//!   Active at their home position, with a collision grace window
//! - Spawning tokens become Active when their fade-in completes
//! - Running fade-in and bounce-pop animations advance
//!
//! It never computes physics.

use crate::config::{non_negative, SimulationConfig, SpawnBehavior};
use crate::token::{LifecycleState, Token, TokenId};
use std::collections::VecDeque;

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Tokens reset to home this sweep
    pub respawned: usize,
    /// Spawning tokens that became Active
    pub activated: usize,
}

/// Respawn queue and lifecycle counters
#[derive(Debug, Clone, Default)]
pub struct LifecycleManager {
    /// `(token, died_at)`, ordered by death time
    queue: VecDeque<(TokenId, f64)>,
    active: usize,
    dead: usize,
}

impl LifecycleManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a dead token for respawn
    pub fn schedule(&mut self, id: TokenId, died_at: f64) {
        // Deaths arrive in time order; fall back to an ordered insert otherwise
        let position = self
            .queue
            .iter()
            .rposition(|&(_, t)| t <= died_at)
            .map_or(0, |i| i + 1);
        self.queue.insert(position, (id, died_at));
    }

    /// Rebuild the queue and counters from a fresh roster
    pub fn reset(&mut self, tokens: &[Token]) {
        self.queue.clear();
        for token in tokens {
            if token.lifecycle() == LifecycleState::Dead {
                self.schedule(token.id(), token.state_entered_at());
            }
        }
        self.recount(tokens);
    }

    /// Run all timed transitions for time `now`
    pub fn sweep(&mut self, tokens: &mut [Token], now: f64, config: &SimulationConfig) -> SweepReport {
        let timing = &config.timing;
        let spawn = config.tokens.spawn_behavior();
        let delay = non_negative(timing.respawn_delay_sec);
        let mut report = SweepReport::default();

        while let Some(&(id, died_at)) = self.queue.front() {
            if now - died_at < delay {
                break;
            }
            self.queue.pop_front();
            let Some(token) = tokens.get_mut(id.index()) else {
                tracing::warn!(token = %id, "respawn queued for a token outside the roster");
                continue;
            };
            if !token.begin_respawn(now) {
                continue;
            }
            token.reset_to_home(now, timing.respawn_collision_delay_sec);
            if spawn == SpawnBehavior::FadeIn {
                token.start_fade(now);
            }
            report.respawned += 1;
        }

        for token in tokens.iter_mut() {
            match token.lifecycle() {
                LifecycleState::Spawning => {
                    let done = spawn == SpawnBehavior::InstantIn
                        || token.advance_fade(now, timing.fade_in_duration_sec);
                    if done && token.activate(now) {
                        report.activated += 1;
                    }
                }
                LifecycleState::Active => {
                    token.advance_fade(now, timing.fade_in_duration_sec);
                }
                LifecycleState::Dead | LifecycleState::Respawning => {}
            }
            token.advance_bounce(now, &config.animation);
        }

        self.recount(tokens);
        if report.respawned > 0 {
            tracing::debug!(respawned = report.respawned, pending = self.queue.len(), now, "respawn sweep");
        }
        report
    }

    fn recount(&mut self, tokens: &[Token]) {
        self.active = tokens.iter().filter(|t| t.is_active()).count();
        self.dead = tokens.iter().filter(|t| t.lifecycle() == LifecycleState::Dead).count();
    }

    /// Active tokens after the last sweep
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Dead tokens after the last sweep
    pub fn dead_count(&self) -> usize {
        self.dead
    }

    /// Queued respawns
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
