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
//! Degenerate inputs must never panic or poison the simulation

use token_swarm::token::MIN_EXTENT;
use token_swarm::{Canvas, FrameInput, LifecycleState, Simulation, SimulationConfig, Token, TokenId, Vec2};

const CANVAS: Canvas = Canvas::new(300.0, 300.0);

fn active_token(position: Vec2, size: f64) -> Token {
    let mut token = Token::new(TokenId::new(0), position, Vec2::new(size, size));
    token.activate(0.0);
    token
}

#[test]
fn test_empty_simulation_steps() {
    let mut sim = Simulation::new(Vec::new());
    let stats = sim.step(&SimulationConfig::default(), &FrameInput::new(CANVAS).with_dt(0.02));
    assert_eq!(stats.frame, 1);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.collisions, 0);
    assert!(sim.appearances().is_empty());
}

#[test]
fn test_zero_sized_coincident_tokens_stay_finite() {
    let tokens = vec![active_token(Vec2::new(100.0, 100.0), 0.0), active_token(Vec2::new(100.0, 100.0), 0.0)];
    assert_eq!(tokens[0].size(), Vec2::new(MIN_EXTENT, MIN_EXTENT));
    let mut sim = Simulation::new(tokens);

    let config = SimulationConfig::default();
    for _ in 0..10 {
        let stats = sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.02));
        assert_eq!(stats.anomalies, 0);
    }
    assert!(sim.tokens().iter().all(Token::is_kinematically_valid));
}

#[test]
fn test_invalid_dt_advances_nothing() {
    let mut token = active_token(Vec2::new(100.0, 100.0), 10.0);
    token.set_velocity(Vec2::new(50.0, 0.0));
    let mut sim = Simulation::new(vec![token]);
    let config = SimulationConfig::default();

    for raw in [f64::NAN, f64::INFINITY, -0.5] {
        let stats = sim.step(&config, &FrameInput::new(CANVAS).with_dt(raw));
        assert_eq!(stats.dt, 0.0);
    }
    assert_eq!(sim.now(), 0.0);
    assert_eq!(sim.frame(), 3);
    assert_eq!(sim.tokens()[0].position(), Vec2::new(100.0, 100.0));

    // A supplied delta above the wall-clock cap is used as given
    let stats = sim.step(&config, &FrameInput::new(CANVAS).with_dt(0.25));
    assert_eq!(stats.dt, 0.25);
    assert_eq!(sim.now(), 0.25);
    assert_eq!(sim.tokens()[0].position(), Vec2::new(112.5, 100.0));
}

#[test]
fn test_invalid_canvas_skips_boundary_checks() {
    let mut token = active_token(Vec2::new(100.0, 100.0), 10.0);
    token.set_velocity(Vec2::new(-5_000.0, 0.0));
    let mut sim = Simulation::new(vec![token]);
    let config = SimulationConfig::default();

    for canvas in [Canvas::new(0.0, 0.0), Canvas::new(f64::NAN, 300.0)] {
        sim.step(&config, &FrameInput::new(canvas).with_dt(0.1));
        assert_eq!(sim.tokens()[0].lifecycle(), LifecycleState::Active);
    }
    assert!(sim.tokens()[0].position().x < 0.0);
}

#[test]
fn test_non_finite_velocity_recovers_home() {
    let mut token = active_token(Vec2::new(100.0, 100.0), 10.0);
    token.set_position(Vec2::new(120.0, 100.0));
    token.set_velocity(Vec2::new(f64::INFINITY, 0.0));
    let mut sim = Simulation::new(vec![token]);

    let stats = sim.step(&SimulationConfig::default(), &FrameInput::new(CANVAS).with_dt(0.02));
    assert_eq!(stats.anomalies, 1);
    assert_eq!(stats.skipped, 1);
    let token = &sim.tokens()[0];
    assert_eq!(token.position(), token.home());
    assert_eq!(token.velocity(), Vec2::ZERO);
    assert_eq!(token.lifecycle(), LifecycleState::Active);
}

#[test]
fn test_replace_tokens_renumbers_and_requeues_dead() {
    let mut sim = Simulation::new(vec![active_token(Vec2::new(10.0, 10.0), 10.0)]);
    sim.step(&SimulationConfig::default(), &FrameInput::new(CANVAS).with_dt(0.02));

    let mut dead = active_token(Vec2::new(50.0, 50.0), 10.0);
    dead.kill(0.0);
    let roster = vec![
        Token::new(TokenId::new(7), Vec2::new(20.0, 20.0), Vec2::new(10.0, 10.0)),
        dead,
        active_token(Vec2::new(80.0, 80.0), 10.0),
    ];
    sim.replace_tokens(roster);

    let ids: Vec<usize> = sim.tokens().iter().map(|t| t.id().index()).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(sim.lifecycle().pending(), 1);
    assert_eq!(sim.lifecycle().dead_count(), 1);
    assert_eq!(sim.token(TokenId::new(1)).map(Token::lifecycle), Some(LifecycleState::Dead));
    assert!(sim.token(TokenId::new(3)).is_none());
}

#[test]
fn test_resized_roster_fades_in_from_resize_time() {
    let config = SimulationConfig::default();
    let input = FrameInput::new(CANVAS).with_dt(0.125);
    let mut sim = Simulation::new(vec![active_token(Vec2::new(100.0, 100.0), 10.0)]);
    for _ in 0..40 {
        sim.step(&config, &input);
    }
    assert_eq!(sim.now(), 5.0);

    sim.replace_tokens(vec![
        active_token(Vec2::new(100.0, 100.0), 10.0),
        Token::new(TokenId::new(1), Vec2::new(200.0, 200.0), Vec2::new(10.0, 10.0)),
    ]);
    assert_eq!(sim.tokens()[1].state_entered_at(), 5.0);

    let mut last_opacity = 0;
    for _ in 0..3 {
        sim.step(&config, &input);
        let fresh = &sim.tokens()[1];
        assert_eq!(fresh.lifecycle(), LifecycleState::Spawning, "fade cut short at t={}", sim.now());
        assert!(fresh.opacity() > last_opacity && fresh.opacity() < 255);
        last_opacity = fresh.opacity();
    }
    assert_eq!(sim.tokens()[0].lifecycle(), LifecycleState::Active);

    sim.step(&config, &input);
    assert_eq!(sim.tokens()[1].lifecycle(), LifecycleState::Active);
    assert_eq!(sim.tokens()[1].opacity(), 255);
}
