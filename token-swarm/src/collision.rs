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
//! Peer collision and canvas boundary handling
//!
//! Detection and response are split. [`CollisionResolver`] finds
//! overlapping pairs of Active tokens using the spatial index; it never
//! touches token state. The response for each token is a
//! [`CollisionEvent`] handed to the behavior's `process_collision` hook,
//! whose default is [`respond`].
//!
//! # Shape modes
//!
//! Rectangle mode is used when the configured shape type starts with
//! `rect` or when either token carries a [`Shape::Rect`]. Otherwise both
//! tokens are circles and overlap is a squared-distance test. Sizes are
//! always multiplied by the token's animation scale first.
//!
//! # Intensity
//!
//! Circle intensity is `1 - d / (r_a + r_b)`: 1.0 for coincident centres,
//! approaching 0 at first contact. Rectangle intensity is the intersection
//! area over the smaller rectangle's area. Both lie in `[0, 1]`.
//!
//! # Response
//!
//! A token whose velocity points into its partner has the normal component
//! reflected and scaled by `physics.bounce_factor`. A token already moving
//! apart is left alone.

use crate::config::{CollisionBehavior, SimulationConfig};
use crate::forces::Kinematics;
use crate::spatial::SpatialIndex;
use crate::token::{Shape, Token, TokenId, Vec2};

/// Canvas bounds: positions are valid inside `[0, width] x [0, height]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Canvas {
    /// Create canvas bounds
    pub const fn new(width: f64, height: f64) -> Self {
        Canvas { width, height }
    }

    /// Whether both dimensions are positive and finite
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Whether `position` lies inside the bounds (edges included)
    pub fn contains(&self, position: Vec2) -> bool {
        (0.0..=self.width).contains(&position.x) && (0.0..=self.height).contains(&position.y)
    }
}

/// Geometry used for a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionMode {
    /// Squared-distance test on scaled radii
    Circle,
    /// AABB intersection on scaled extents
    Rect,
}

impl CollisionMode {
    /// Pick the mode for two shapes
    pub fn select(rect_configured: bool, a: &Shape, b: &Shape) -> Self {
        if rect_configured || a.is_rect() || b.is_rect() {
            CollisionMode::Rect
        } else {
            CollisionMode::Circle
        }
    }
}

/// Result of a positive overlap test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    /// Unit normal pointing from B toward A
    pub normal: Vec2,
    /// Collision intensity in `[0, 1]`
    pub intensity: f64,
    /// Penetration depth (circles) or intersection area (rectangles)
    pub magnitude: f64,
}

/// Circle overlap test
///
/// Overlap iff `|a - b|² < (ra + rb)²`. Coincident centres use `(1, 0)`
/// as the normal.
pub fn circle_overlap(a: Vec2, ra: f64, b: Vec2, rb: f64) -> Option<Overlap> {
    let combined = ra + rb;
    let delta = a - b;
    let dist_sq = delta.length_squared();
    if !(dist_sq < combined * combined) {
        return None;
    }
    let distance = dist_sq.sqrt();
    let normal = delta.normalized().unwrap_or(Vec2::new(1.0, 0.0));
    Some(Overlap {
        normal,
        intensity: (1.0 - distance / combined).clamp(0.0, 1.0),
        magnitude: combined - distance,
    })
}

/// Width and height of the intersection of two centred boxes, if any
pub fn aabb_intersection(a: Vec2, extents_a: Vec2, b: Vec2, extents_b: Vec2) -> Option<Vec2> {
    let (ha, hb) = (extents_a * 0.5, extents_b * 0.5);
    let width = (a.x + ha.x).min(b.x + hb.x) - (a.x - ha.x).max(b.x - hb.x);
    let height = (a.y + ha.y).min(b.y + hb.y) - (a.y - ha.y).max(b.y - hb.y);
    (width > 0.0 && height > 0.0).then_some(Vec2::new(width, height))
}

/// Rectangle overlap test
///
/// The normal lies on the axis of least overlap.
pub fn rect_overlap(a: Vec2, extents_a: Vec2, b: Vec2, extents_b: Vec2) -> Option<Overlap> {
    let overlap = aabb_intersection(a, extents_a, b, extents_b)?;
    let area = overlap.x * overlap.y;
    let smaller = (extents_a.x * extents_a.y).min(extents_b.x * extents_b.y);
    let side = |d: f64| if d >= 0.0 { 1.0 } else { -1.0 };
    let normal = if overlap.x < overlap.y {
        Vec2::new(side(a.x - b.x), 0.0)
    } else {
        Vec2::new(0.0, side(a.y - b.y))
    };
    Some(Overlap {
        normal,
        intensity: (area / smaller).clamp(0.0, 1.0),
        magnitude: area,
    })
}

/// Overlap test between two tokens at their current positions
pub fn detect(a: &Token, b: &Token, mode: CollisionMode) -> Option<Overlap> {
    let (sa, sb) = (a.scaled_shape(), b.scaled_shape());
    match (mode, sa, sb) {
        (CollisionMode::Circle, Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_overlap(a.position(), ra, b.position(), rb)
        }
        _ => rect_overlap(a.position(), sa.extents(), b.position(), sb.extents()),
    }
}

/// One side of a peer collision, as seen by the token receiving it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// The other token
    pub other: TokenId,
    /// Unit normal pointing away from the other token
    pub normal: Vec2,
    /// Collision intensity in `[0, 1]`
    pub intensity: f64,
    /// Penetration depth or intersection area
    pub magnitude: f64,
}

/// Overlapping pair found by the resolver, `a < b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerCollision {
    /// Lower id
    pub a: TokenId,
    /// Higher id
    pub b: TokenId,
    /// Overlap with the normal pointing from `b` to `a`
    pub overlap: Overlap,
}

impl PeerCollision {
    /// Contact as seen by `a`
    pub fn contact_for_a(&self) -> Contact {
        Contact {
            other: self.b,
            normal: self.overlap.normal,
            intensity: self.overlap.intensity,
            magnitude: self.overlap.magnitude,
        }
    }

    /// Contact as seen by `b`
    pub fn contact_for_b(&self) -> Contact {
        Contact {
            other: self.a,
            normal: -self.overlap.normal,
            intensity: self.overlap.intensity,
            magnitude: self.overlap.magnitude,
        }
    }
}

/// A token crossed the canvas edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryHit {
    /// Per axis: -1 past the low edge, +1 past the high edge, 0 inside
    pub outward: Vec2,
    /// Position clamped into the canvas
    pub clamped: Vec2,
}

/// Check a position against the canvas
///
/// Returns `None` inside the bounds, for an invalid canvas, or for a
/// non-finite position.
pub fn boundary_hit(position: Vec2, canvas: &Canvas) -> Option<BoundaryHit> {
    if !canvas.is_valid() || !position.is_valid() || canvas.contains(position) {
        return None;
    }
    let axis = |value: f64, high: f64| {
        if value < 0.0 {
            -1.0
        } else if value > high {
            1.0
        } else {
            0.0
        }
    };
    Some(BoundaryHit {
        outward: Vec2::new(axis(position.x, canvas.width), axis(position.y, canvas.height)),
        clamped: Vec2::new(position.x.clamp(0.0, canvas.width), position.y.clamp(0.0, canvas.height)),
    })
}

/// Something a token collided with this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    /// Another token
    Peer(Contact),
    /// The canvas edge
    Boundary(BoundaryHit),
}

/// Default collision response
pub fn respond(token: &mut Token, event: &CollisionEvent, config: &SimulationConfig, now: f64) {
    match event {
        CollisionEvent::Peer(contact) => respond_to_contact(token, contact, config, now),
        CollisionEvent::Boundary(hit) => respond_to_boundary(token, hit, config, now),
    }
}

/// Elastic response and bounce-pop trigger for one side of a peer collision
pub fn respond_to_contact(token: &mut Token, contact: &Contact, config: &SimulationConfig, now: f64) {
    let bounce = config.physics.effective_bounce_factor();
    let velocity = token.velocity();
    let closing = velocity.dot(contact.normal);
    if closing < 0.0 {
        token.set_velocity(velocity - contact.normal * ((1.0 + bounce) * closing));
    }

    if contact.intensity >= config.animation.bounce_threshold
        && config.tokens.collision_behavior() == CollisionBehavior::BouncePop
    {
        token.trigger_bounce(now);
    }
}

/// Wall bounce or death at the canvas edge
///
/// With wall bounce the position is clamped and any outward velocity
/// component is reflected and scaled by the bounce factor. Without it an
/// Active token dies; other states are left to keep moving.
pub fn respond_to_boundary(token: &mut Token, hit: &BoundaryHit, config: &SimulationConfig, now: f64) {
    if !config.tokens.enable_wall_bounce {
        token.kill(now);
        return;
    }
    let bounce = config.physics.effective_bounce_factor();
    let mut velocity = token.velocity();
    if velocity.x * hit.outward.x > 0.0 {
        velocity.x = -velocity.x * bounce;
    }
    if velocity.y * hit.outward.y > 0.0 {
        velocity.y = -velocity.y * bounce;
    }
    token.set_position(hit.clamped);
    token.set_velocity(velocity);
}

/// Counters from the last peer pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionStats {
    /// Ordered candidate pairs returned by the broad phase
    pub potential_collisions: usize,
    /// Exact overlap tests performed
    pub collision_checks: usize,
    /// Overlapping pairs found
    pub collisions: usize,
}

/// Broad- and narrow-phase peer collision detection
#[derive(Debug, Clone, Default)]
pub struct CollisionResolver {
    pairs: Vec<PeerCollision>,
    candidates: Vec<TokenId>,
    stats: CollisionStats,
}

impl CollisionResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Find every overlapping pair of eligible tokens
    ///
    /// A token is eligible when it is Active, outside its collision grace
    /// window and not marked in `excluded`. Each pair is tested once, with
    /// `b > a`.
    ///
    /// The index was built from the frame-start `snapshot`, so the search
    /// radius is padded by twice the largest distance any token moved since.
    pub fn find_peer_collisions(
        &mut self,
        tokens: &[Token],
        index: &SpatialIndex,
        snapshot: &[Kinematics],
        excluded: &[bool],
        config: &SimulationConfig,
        now: f64,
    ) -> &[PeerCollision] {
        self.pairs.clear();
        self.stats = CollisionStats::default();
        let settings = &config.tokens.collision;
        if !settings.enabled {
            return &self.pairs;
        }

        let eligible = |token: &Token| {
            token.is_active()
                && !token.in_collision_grace(now)
                && !excluded.get(token.id().index()).copied().unwrap_or(false)
        };

        let mut max_reach = 0.0_f64;
        let mut max_travel = 0.0_f64;
        for (token, start) in tokens.iter().zip(snapshot) {
            if !eligible(token) {
                continue;
            }
            max_reach = max_reach.max(token.scaled_shape().bounding_radius());
            let travel = token.position().distance(start.position);
            if travel.is_finite() {
                max_travel = max_travel.max(travel);
            }
        }

        let rect_configured = settings.is_rect_mode();
        for (a, start) in tokens.iter().zip(snapshot) {
            if !eligible(a) {
                continue;
            }
            let reach = a.scaled_shape().bounding_radius() + max_reach + 2.0 * max_travel;
            self.candidates.clear();
            index.query_into(start.position, reach, &mut self.candidates);

            for &other in &self.candidates {
                if other <= a.id() {
                    continue;
                }
                self.stats.potential_collisions += 1;
                let Some(b) = tokens.get(other.index()) else {
                    continue;
                };
                if !eligible(b) {
                    continue;
                }
                self.stats.collision_checks += 1;
                let mode = CollisionMode::select(rect_configured, &a.shape(), &b.shape());
                if let Some(overlap) = detect(a, b, mode) {
                    self.pairs.push(PeerCollision {
                        a: a.id(),
                        b: other,
                        overlap,
                    });
                }
            }
        }

        self.stats.collisions = self.pairs.len();
        tracing::debug!(
            potential = self.stats.potential_collisions,
            checks = self.stats.collision_checks,
            collisions = self.stats.collisions,
            "peer collision pass"
        );
        &self.pairs
    }

    /// Pairs found by the last pass
    pub fn pairs(&self) -> &[PeerCollision] {
        &self.pairs
    }

    /// Counters from the last pass
    pub fn stats(&self) -> CollisionStats {
        self.stats
    }
}
