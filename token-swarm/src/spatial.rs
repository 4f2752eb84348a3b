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
//! Uniform grid broad phase
//!
//! The index buckets token ids by the integer cell `floor(position / cell)`.
//! It is rebuilt once per frame and then only read. Queries are broad-phase:
//! they return every id in the square of cells around the query point and
//! leave the exact distance test to the caller.

use crate::token::{Token, TokenId, Vec2};
use std::collections::HashMap;

/// Fallback cell size used when no usable size is available
pub const MIN_CELL_SIZE: f64 = 1.0;

/// Grid cell coordinate
pub type Cell = (i32, i32);

/// Suggest a cell size for the given tokens: twice the largest bounding radius
///
/// Dead tokens are ignored. Returns [`MIN_CELL_SIZE`] when no token is left.
pub fn suggest_cell_size(tokens: &[Token]) -> f64 {
    let largest = tokens
        .iter()
        .filter(|t| t.lifecycle().is_alive())
        .map(|t| t.scaled_shape().bounding_radius())
        .filter(|r| r.is_finite())
        .fold(0.0_f64, f64::max);
    if largest > 0.0 {
        (largest * 2.0).max(MIN_CELL_SIZE)
    } else {
        MIN_CELL_SIZE
    }
}

/// Uniform grid over token positions
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    buckets: HashMap<Cell, Vec<TokenId>>,
    entries: usize,
}

impl SpatialIndex {
    /// Create an empty index with [`MIN_CELL_SIZE`] cells
    pub fn new() -> Self {
        SpatialIndex {
            cell_size: MIN_CELL_SIZE,
            buckets: HashMap::new(),
            entries: 0,
        }
    }

    /// Clear and repopulate the index
    ///
    /// Every non-Dead token with a finite position is inserted in roster
    /// order. Non-positive or non-finite `cell_size` falls back to
    /// [`MIN_CELL_SIZE`].
    pub fn rebuild(&mut self, tokens: &[Token], cell_size: f64) {
        self.cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            MIN_CELL_SIZE
        };

        // Keep allocated buckets around between frames
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        self.entries = 0;

        for token in tokens {
            if !token.lifecycle().is_alive() || !token.position().is_valid() {
                continue;
            }
            let cell = self.cell_of(token.position());
            self.buckets.entry(cell).or_default().push(token.id());
            self.entries += 1;
        }

        self.buckets.retain(|_, bucket| !bucket.is_empty());
    }

    /// Cell containing `position`
    pub fn cell_of(&self, position: Vec2) -> Cell {
        // `as` saturates for out-of-range floats
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    /// Ids in the cells overlapping the square around `position`
    ///
    /// The square spans `ceil(radius / cell_size)` cells in each direction.
    /// A negative or NaN radius only inspects the query cell.
    pub fn query_neighbors(&self, position: Vec2, radius: f64) -> Vec<TokenId> {
        let mut out = Vec::new();
        self.query_into(position, radius, &mut out);
        out
    }

    /// Same as [`SpatialIndex::query_neighbors`], appending into `out`
    pub fn query_into(&self, position: Vec2, radius: f64, out: &mut Vec<TokenId>) {
        if !position.is_valid() || self.buckets.is_empty() {
            return;
        }
        let span = if radius > 0.0 {
            (radius / self.cell_size).ceil()
        } else {
            0.0
        };
        let (cx, cy) = self.cell_of(position);

        let side = 2.0 * span + 1.0;
        if side * side > self.buckets.len() as f64 {
            // Query square is bigger than the occupied area: walk the buckets
            let start = out.len();
            for (&(x, y), bucket) in &self.buckets {
                let dx = (i64::from(x) - i64::from(cx)).abs() as f64;
                let dy = (i64::from(y) - i64::from(cy)).abs() as f64;
                if dx <= span && dy <= span {
                    out.extend_from_slice(bucket);
                }
            }
            // HashMap order is not stable across runs
            out[start..].sort_unstable();
            return;
        }

        let span = span as i32;
        for x in cx.saturating_sub(span)..=cx.saturating_add(span) {
            for y in cy.saturating_sub(span)..=cy.saturating_add(span) {
                if let Some(bucket) = self.buckets.get(&(x, y)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Cell size in use since the last rebuild
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of tokens inserted by the last rebuild
    pub fn occupied(&self) -> usize {
        self.entries
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn active_at(index: usize, x: f64, y: f64) -> Token {
        let mut t = Token::new(TokenId::new(index), Vec2::new(x, y), Vec2::new(10.0, 10.0));
        t.activate(0.0);
        t
    }

    fn ids(v: &[TokenId]) -> HashSet<usize> {
        v.iter().map(|id| id.index()).collect()
    }

    #[test]
    fn test_cell_of_floors_negative_coordinates() {
        let mut index = SpatialIndex::new();
        index.rebuild(&[], 10.0);
        assert_eq!(index.cell_of(Vec2::new(-0.5, 9.99)), (-1, 0));
        assert_eq!(index.cell_of(Vec2::new(10.0, -10.0)), (1, -1));
    }

    #[test]
    fn test_query_returns_nearby_cells_only() {
        let tokens = vec![
            active_at(0, 5.0, 5.0),
            active_at(1, 15.0, 5.0),
            active_at(2, 95.0, 95.0),
        ];
        let mut index = SpatialIndex::new();
        index.rebuild(&tokens, 10.0);

        let found = ids(&index.query_neighbors(Vec2::new(5.0, 5.0), 10.0));
        assert!(found.contains(&0));
        assert!(found.contains(&1));
        assert!(!found.contains(&2));
    }

    #[test]
    fn test_dead_and_non_finite_tokens_skipped() {
        let mut dead = active_at(0, 5.0, 5.0);
        dead.kill(1.0);
        let mut broken = active_at(1, 5.0, 5.0);
        broken.set_position(Vec2::new(f64::NAN, 5.0));
        let tokens = vec![dead, broken, active_at(2, 5.0, 5.0)];

        let mut index = SpatialIndex::new();
        index.rebuild(&tokens, 10.0);
        assert_eq!(index.occupied(), 1);
        assert_eq!(ids(&index.query_neighbors(Vec2::new(5.0, 5.0), 1.0)), HashSet::from([2]));
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        let mut index = SpatialIndex::new();
        index.rebuild(&[active_at(0, 0.0, 0.0)], -3.0);
        assert_eq!(index.cell_size(), MIN_CELL_SIZE);
        index.rebuild(&[active_at(0, 0.0, 0.0)], f64::NAN);
        assert_eq!(index.cell_size(), MIN_CELL_SIZE);
    }

    #[test]
    fn test_large_radius_walks_buckets() {
        let tokens: Vec<Token> = (0..5).map(|i| active_at(i, i as f64 * 100.0, 0.0)).collect();
        let mut index = SpatialIndex::new();
        index.rebuild(&tokens, 10.0);

        let found = index.query_neighbors(Vec2::new(0.0, 0.0), 250.0);
        assert_eq!(ids(&found), HashSet::from([0, 1, 2]));

        let all = index.query_neighbors(Vec2::new(0.0, 0.0), f64::INFINITY);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_suggest_cell_size() {
        assert_eq!(suggest_cell_size(&[]), MIN_CELL_SIZE);
        let tokens = vec![active_at(0, 0.0, 0.0)];
        assert_eq!(suggest_cell_size(&tokens), 10.0);
    }
}
