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
//! Broad-phase queries against a brute-force scan

use std::collections::HashSet;
use token_swarm::spatial::{suggest_cell_size, SpatialIndex};
use token_swarm::{Token, TokenId, Vec2};

/// Deterministic scatter of active tokens over a 500x500 area
fn scattered(count: usize) -> Vec<Token> {
    let mut state: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state % 50_000) as f64 / 100.0
    };
    (0..count)
        .map(|i| {
            let mut token = Token::new(TokenId::new(i), Vec2::new(next(), next()), Vec2::new(12.0, 12.0));
            token.activate(0.0);
            token
        })
        .collect()
}

#[test]
fn test_query_is_superset_of_brute_force() {
    let tokens = scattered(300);
    let mut index = SpatialIndex::new();
    index.rebuild(&tokens, suggest_cell_size(&tokens));
    assert_eq!(index.occupied(), 300);

    for radius in [5.0, 12.0, 40.0, 150.0] {
        for token in tokens.iter().step_by(7) {
            let found: HashSet<TokenId> = index.query_neighbors(token.position(), radius).into_iter().collect();
            for other in &tokens {
                if token.position().distance(other.position()) <= radius {
                    assert!(found.contains(&other.id()), "{} missing near {} at r={radius}", other.id(), token.id());
                }
            }
        }
    }
}

#[test]
fn test_query_is_idempotent() {
    let tokens = scattered(120);
    let mut index = SpatialIndex::new();
    index.rebuild(&tokens, 24.0);

    let probe = Vec2::new(250.0, 250.0);
    for radius in [10.0, 60.0, 1_000.0] {
        let mut first = index.query_neighbors(probe, radius);
        let mut second = index.query_neighbors(probe, radius);
        first.sort();
        second.sort();
        assert_eq!(first, second);
    }
}

#[test]
fn test_rebuild_replaces_previous_contents() {
    let mut tokens = scattered(50);
    let mut index = SpatialIndex::new();
    index.rebuild(&tokens, 24.0);
    assert_eq!(index.occupied(), 50);

    for token in tokens.iter_mut().take(10) {
        token.kill(1.0);
    }
    index.rebuild(&tokens, 24.0);
    assert_eq!(index.occupied(), 40);

    let everything = index.query_neighbors(Vec2::new(250.0, 250.0), 10_000.0);
    assert_eq!(everything.len(), 40);
    assert!(everything.iter().all(|id| id.index() >= 10));
}
