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
//! Headless Token Swarm Example
//!
//! Runs a swarm of tokens on a virtual canvas with a scripted mouse sweeping
//! through it and prints lifecycle and collision counters once per second.
//!
//! # Running
//!
//! ```bash
//! # 150 tokens for 10 seconds
//! cargo run --example swarm --release
//!
//! # Custom population, flocking on, wall bounce on
//! cargo run --example swarm --release -- --tokens 400 --flocking --bounce
//!
//! # Load settings from a JSON document
//! cargo run --example swarm --release -- --config swarm.json
//!
//! # Per-frame engine logs
//! RUST_LOG=token_swarm=debug cargo run --example swarm
//! ```

use token_swarm::plugins::BehaviorRegistry;
use token_swarm::{Canvas, FrameInput, Simulation, SimulationConfig, Token, TokenId, Vec2};
use tracing_subscriber::EnvFilter;

/// Linear congruential generator, good enough for scattering tokens
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        SimpleRng { state: seed }
    }

    fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.state >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }
}

struct DemoOptions {
    tokens: usize,
    duration: f64,
    timestep: f64,
    seed: u64,
    flocking: bool,
    bounce: bool,
    config_path: Option<String>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        DemoOptions {
            tokens: 150,
            duration: 10.0,
            timestep: 1.0 / 60.0,
            seed: 12345,
            flocking: false,
            bounce: false,
            config_path: None,
        }
    }
}

fn parse_args() -> DemoOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut options = DemoOptions::default();

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--tokens", Some(v)) => {
                options.tokens = v.parse().unwrap_or_else(|_| {
                    eprintln!("Warning: Invalid token count '{v}', using default 150");
                    150
                });
                i += 2;
            }
            ("--duration", Some(v)) => {
                options.duration = v.parse().unwrap_or_else(|_| {
                    eprintln!("Warning: Invalid duration '{v}', using default 10.0 s");
                    10.0
                });
                i += 2;
            }
            ("--timestep", Some(v)) => {
                options.timestep = v.parse().unwrap_or_else(|_| {
                    eprintln!("Warning: Invalid timestep '{v}', using default 1/60 s");
                    1.0 / 60.0
                });
                i += 2;
            }
            ("--seed", Some(v)) => {
                options.seed = v.parse().unwrap_or_else(|_| {
                    eprintln!("Warning: Invalid seed '{v}', using default 12345");
                    12345
                });
                i += 2;
            }
            ("--config", Some(v)) => {
                options.config_path = Some(v.clone());
                i += 2;
            }
            ("--flocking", _) => {
                options.flocking = true;
                i += 1;
            }
            ("--bounce", _) => {
                options.bounce = true;
                i += 1;
            }
            (flag @ ("--tokens" | "--duration" | "--timestep" | "--seed" | "--config"), None) => {
                eprintln!("Error: {flag} requires an argument");
                std::process::exit(1);
            }
            _ => {
                i += 1;
            }
        }
    }
    options
}

fn load_config(options: &DemoOptions) -> SimulationConfig {
    let mut config = match &options.config_path {
        Some(path) => {
            let loaded = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));
            match loaded {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: could not load {path}: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            let mut config = SimulationConfig::default();
            config.mouse_force.enabled = true;
            config.mouse_force.force_strength = 400.0;
            config.tokens.finds_home.enabled = true;
            config.tokens.finds_home.strength = 60.0;
            config.physics.damping = 0.5;
            config
        }
    };
    if options.flocking {
        config.tokens.flocking.enabled = true;
    }
    if options.bounce {
        config.tokens.enable_wall_bounce = true;
    }
    config
}

fn create_tokens(count: usize, canvas: Canvas, rng: &mut SimpleRng, config: &SimulationConfig) -> Vec<Token> {
    (0..count)
        .map(|i| {
            let home = Vec2::new(rng.range(20.0, canvas.width - 20.0), rng.range(20.0, canvas.height - 20.0));
            let side = rng.range(12.0, 28.0);
            Token::from_settings(TokenId::new(i), home, Vec2::new(side, side), &config.tokens.collision)
        })
        .collect()
}

/// Cursor sweeping a figure eight across the canvas
fn mouse_at(t: f64, canvas: Canvas) -> Vec2 {
    Vec2::new(
        canvas.width * (0.5 + 0.4 * (0.6 * t).sin()),
        canvas.height * (0.5 + 0.3 * (1.2 * t).sin()),
    )
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("token_swarm=info")))
        .init();

    println!("==========================================================");
    println!("                 Headless Token Swarm");
    println!("==========================================================");
    println!();

    let options = parse_args();
    let config = load_config(&options);
    let canvas = Canvas::new(800.0, 600.0);

    println!("Configuration:");
    println!("  Tokens: {}", options.tokens);
    println!("  Timestep: {:.4} s", options.timestep);
    println!("  Duration: {:.1} s", options.duration);
    println!("  Flocking: {}", config.tokens.flocking.enabled);
    println!("  Wall bounce: {}", config.tokens.enable_wall_bounce);
    println!("  Random seed: {}", options.seed);
    println!();

    let mut rng = SimpleRng::new(options.seed);
    let tokens = create_tokens(options.tokens, canvas, &mut rng, &config);
    let registry = BehaviorRegistry::with_builtins();
    let mut sim = match Simulation::from_registry(tokens, &registry, "standard") {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let frames = (options.duration / options.timestep).ceil().max(0.0) as u64;
    let report_every = (1.0 / options.timestep).round().max(1.0) as u64;
    let mut collisions = 0usize;
    let mut respawned = 0usize;
    let started = std::time::Instant::now();

    println!("{:>8} {:>8} {:>6} {:>11} {:>10}", "time", "active", "dead", "collisions", "respawned");
    for frame in 1..=frames {
        let t = sim.now();
        let input = FrameInput::new(canvas)
            .with_dt(options.timestep)
            .with_mouse(mouse_at(t, canvas));
        let stats = sim.step(&config, &input);
        collisions += stats.collisions;
        respawned += stats.respawned;

        if frame % report_every == 0 {
            println!(
                "{:>7.2}s {:>8} {:>6} {:>11} {:>10}",
                stats.now, stats.active, stats.dead, collisions, respawned
            );
            collisions = 0;
            respawned = 0;
        }
    }

    let elapsed = started.elapsed();
    println!();
    println!(
        "Simulated {} frames in {:.2?} ({:.1} µs/frame)",
        frames,
        elapsed,
        elapsed.as_secs_f64() * 1e6 / frames.max(1) as f64
    );
}
