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
//! Benchmarks for the per-frame pipeline
//!
//! These benchmarks measure:
//! - Full frame cost for growing token counts, with and without flocking
//! - Spatial index rebuild and neighbor queries in isolation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use token_swarm::spatial::{suggest_cell_size, SpatialIndex};
use token_swarm::{Canvas, FrameInput, Simulation, SimulationConfig, Token, TokenId, Vec2};

const CANVAS: Canvas = Canvas::new(1024.0, 768.0);

// Tokens on a jittered grid, all Active
fn grid_tokens(count: usize) -> Vec<Token> {
    let columns = (count as f64).sqrt().ceil() as usize;
    let spacing_x = CANVAS.width / (columns + 1) as f64;
    let spacing_y = CANVAS.height / (columns + 1) as f64;
    (0..count)
        .map(|i| {
            let (col, row) = (i % columns, i / columns);
            let jitter = ((i * 7919) % 11) as f64 - 5.0;
            let home = Vec2::new(spacing_x * (col + 1) as f64 + jitter, spacing_y * (row + 1) as f64 - jitter);
            let mut token = Token::new(TokenId::new(i), home, Vec2::new(18.0, 18.0));
            token.activate(0.0);
            token.set_velocity(Vec2::new(jitter * 4.0, -jitter * 3.0));
            token
        })
        .collect()
}

fn busy_config(flocking: bool) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.tokens.enable_wall_bounce = true;
    config.tokens.flocking.enabled = flocking;
    config.mouse_force.enabled = true;
    config.tokens.finds_home.enabled = true;
    config
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for count in [50, 200, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        for flocking in [false, true] {
            let config = busy_config(flocking);
            let label = if flocking { "flocking" } else { "plain" };
            group.bench_with_input(BenchmarkId::new(label, count), count, |b, &count| {
                let mut sim = Simulation::new(grid_tokens(count));
                let input = FrameInput::new(CANVAS)
                    .with_dt(1.0 / 60.0)
                    .with_mouse(Vec2::new(CANVAS.width * 0.5, CANVAS.height * 0.5));
                b.iter(|| black_box(sim.step(&config, &input)));
            });
        }
    }

    group.finish();
}

fn bench_spatial_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_index");

    for count in [200, 1000].iter() {
        let tokens = grid_tokens(*count);
        let cell_size = suggest_cell_size(&tokens);

        group.bench_with_input(BenchmarkId::new("rebuild", count), count, |b, _| {
            let mut index = SpatialIndex::new();
            b.iter(|| index.rebuild(black_box(&tokens), cell_size));
        });

        let mut index = SpatialIndex::new();
        index.rebuild(&tokens, cell_size);
        group.bench_with_input(BenchmarkId::new("query_all", count), count, |b, _| {
            let mut out = Vec::new();
            b.iter(|| {
                for token in &tokens {
                    out.clear();
                    index.query_into(token.position(), 40.0, &mut out);
                }
                black_box(out.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame, bench_spatial_index);
criterion_main!(benches);
