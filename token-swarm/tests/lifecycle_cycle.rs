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
//! Lifecycle tests: canvas exit, wall bounce, respawn timing and fade-in

use token_swarm::config::SpawnBehavior;
use token_swarm::lifecycle::LifecycleManager;
use token_swarm::{Canvas, FrameInput, LifecycleState, Simulation, SimulationConfig, Token, TokenId, Vec2};

const CANVAS: Canvas = Canvas::new(200.0, 200.0);

fn active_token(position: Vec2, velocity: Vec2) -> Token {
    let mut token = Token::new(TokenId::new(0), position, Vec2::new(10.0, 10.0));
    token.activate(0.0);
    token.set_velocity(velocity);
    token
}

#[test]
fn test_boundary_exit_kills_in_same_frame() {
    let token = active_token(Vec2::new(195.0, 100.0), Vec2::new(100.0, 0.0));
    let mut sim = Simulation::new(vec![token]);
    let config = SimulationConfig::default();

    let stats = sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.1));

    let token = &sim.tokens()[0];
    assert_eq!(token.lifecycle(), LifecycleState::Dead);
    assert_eq!(token.velocity(), Vec2::ZERO);
    assert_eq!(stats.dead, 1);
    assert_eq!(stats.active, 0);
    assert_eq!(sim.lifecycle().pending(), 1);
}

#[test]
fn test_wall_bounce_reflects_and_keeps_state() {
    let token = active_token(Vec2::new(195.0, 100.0), Vec2::new(100.0, 0.0));
    let mut sim = Simulation::new(vec![token]);
    let mut config = SimulationConfig::default();
    config.tokens.enable_wall_bounce = true;
    config.physics.bounce_factor = 0.8;

    sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.1));

    let token = &sim.tokens()[0];
    assert_eq!(token.lifecycle(), LifecycleState::Active);
    assert_eq!(token.position(), Vec2::new(200.0, 100.0));
    assert!((token.velocity().x + 80.0).abs() < 1e-9);
    assert_eq!(token.velocity().y, 0.0);
}

#[test]
fn test_spawning_tokens_are_not_killed_off_canvas() {
    let mut token = Token::new(TokenId::new(0), Vec2::new(199.0, 100.0), Vec2::new(10.0, 10.0));
    token.set_velocity(Vec2::new(100.0, 0.0));
    let mut sim = Simulation::new(vec![token]);
    let config = SimulationConfig::default();

    sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.05));
    assert_eq!(sim.tokens()[0].lifecycle(), LifecycleState::Spawning);
    assert!(sim.tokens()[0].position().x > 200.0);
}

#[test]
fn test_respawn_cycle_from_time_zero() {
    let mut config = SimulationConfig::default();
    config.timing.respawn_delay_sec = 1.5;
    config.timing.respawn_collision_delay_sec = 0.5;

    let mut tokens = vec![active_token(Vec2::new(50.0, 50.0), Vec2::new(-30.0, 0.0))];
    tokens[0].set_position(Vec2::new(-1.0, 50.0));
    assert!(tokens[0].kill(0.0));

    let mut manager = LifecycleManager::new();
    manager.schedule(TokenId::new(0), 0.0);

    // Quarter-second steps are exact in binary floating point
    for step in 1..6 {
        let now = step as f64 * 0.25;
        manager.sweep(&mut tokens, now, &config);
        assert_eq!(tokens[0].lifecycle(), LifecycleState::Dead, "still dead at t={now}");
    }

    manager.sweep(&mut tokens, 1.5, &config);
    let token = &tokens[0];
    assert_eq!(token.lifecycle(), LifecycleState::Active);
    assert_eq!(token.position(), Vec2::new(50.0, 50.0));
    assert_eq!(token.velocity(), Vec2::ZERO);
    assert_eq!(token.respawn_collision_grace_until(), 2.0);
    assert_eq!(token.state_entered_at(), 1.5);
}

#[test]
fn test_simulation_respawns_after_delay() {
    let mut config = SimulationConfig::default();
    config.timing.respawn_delay_sec = 1.5;
    let dt = 0.0625;
    let input = FrameInput::new(CANVAS).with_dt(dt);

    let token = active_token(Vec2::new(199.0, 100.0), Vec2::new(100.0, 0.0));
    let home = token.home();
    let mut sim = Simulation::new(vec![token]);

    sim.step(&config, &input);
    assert_eq!(sim.tokens()[0].lifecycle(), LifecycleState::Dead);
    let died_at = sim.tokens()[0].state_entered_at();
    assert_eq!(died_at, dt);

    // Dead until 1.5 s have passed since death
    for _ in 0..23 {
        let stats = sim.step(&config, &input);
        assert_eq!(stats.dead, 1);
    }
    assert_eq!(sim.now(), 1.5);

    let stats = sim.step(&config, &input);
    assert_eq!(stats.respawned, 1);
    let token = &sim.tokens()[0];
    assert_eq!(token.lifecycle(), LifecycleState::Active);
    assert_eq!(token.position(), home);
    assert_eq!(token.velocity(), Vec2::ZERO);
    assert_eq!(token.respawn_collision_grace_until(), sim.now() + 0.5);
}

#[test]
fn test_fade_in_then_active() {
    let token = Token::new(TokenId::new(0), Vec2::new(100.0, 100.0), Vec2::new(10.0, 10.0));
    let mut sim = Simulation::new(vec![token]);
    let config = SimulationConfig::default();
    let input = FrameInput::new(CANVAS).with_dt(0.0625);

    let mut last_opacity = 0;
    for _ in 0..7 {
        sim.step(&config, &input);
        let token = &sim.tokens()[0];
        assert_eq!(token.lifecycle(), LifecycleState::Spawning);
        assert!(token.opacity() > last_opacity);
        last_opacity = token.opacity();
    }

    sim.step(&config, &input);
    let token = &sim.tokens()[0];
    assert_eq!(sim.now(), 0.5);
    assert_eq!(token.lifecycle(), LifecycleState::Active);
    assert_eq!(token.opacity(), 255);
}

#[test]
fn test_instant_in_activates_on_first_frame() {
    let token = Token::new(TokenId::new(0), Vec2::new(100.0, 100.0), Vec2::new(10.0, 10.0));
    let mut sim = Simulation::new(vec![token]);
    let mut config = SimulationConfig::default();
    config.tokens.spawn_behavior = vec![SpawnBehavior::InstantIn];

    let stats = sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.01));
    assert_eq!(stats.active, 1);
    assert_eq!(sim.tokens()[0].opacity(), 255);
}
