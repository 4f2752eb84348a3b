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
//! Collision shape descriptors

use super::Vec2;

/// Smallest extent any shape may have
///
/// Zero, negative and non-finite sizes are clamped up to this value so that
/// every shape keeps a positive area.
pub const MIN_EXTENT: f64 = 1e-3;

/// Clamp a configured extent to a usable positive value
pub fn clamp_extent(value: f64) -> f64 {
    if value.is_finite() && value > MIN_EXTENT {
        value
    } else {
        MIN_EXTENT
    }
}

/// Geometry used for peer collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// Circle centred on the token position
    Circle {
        /// Radius, always > 0
        radius: f64,
    },
    /// Axis-aligned rectangle centred on the token position
    Rect {
        /// Full width, always > 0
        width: f64,
        /// Full height, always > 0
        height: f64,
    },
}

impl Shape {
    /// Circle inscribed in the given size: radius is half the smaller side
    ///
    /// Each side is clamped first, so a NaN side yields the minimum radius.
    pub fn circle_for(size: Vec2) -> Self {
        Shape::Circle {
            radius: clamp_extent(clamp_extent(size.x).min(clamp_extent(size.y)) * 0.5),
        }
    }

    /// Rectangle covering the given size
    pub fn rect_for(size: Vec2) -> Self {
        Shape::Rect {
            width: clamp_extent(size.x),
            height: clamp_extent(size.y),
        }
    }

    /// Return the shape with every dimension multiplied by `factor`
    ///
    /// The result is clamped so dimensions stay positive even for a zero or
    /// negative factor.
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Shape::Circle { radius } => Shape::Circle {
                radius: clamp_extent(radius * factor),
            },
            Shape::Rect { width, height } => Shape::Rect {
                width: clamp_extent(width * factor),
                height: clamp_extent(height * factor),
            },
        }
    }

    /// Full width and height of the axis-aligned bounds
    pub fn extents(&self) -> Vec2 {
        match *self {
            Shape::Circle { radius } => Vec2::new(radius * 2.0, radius * 2.0),
            Shape::Rect { width, height } => Vec2::new(width, height),
        }
    }

    /// Radius of the smallest circle containing the shape
    pub fn bounding_radius(&self) -> f64 {
        match *self {
            Shape::Circle { radius } => radius,
            Shape::Rect { width, height } => 0.5 * (width * width + height * height).sqrt(),
        }
    }

    /// Whether this is the rectangle variant
    pub fn is_rect(&self) -> bool {
        matches!(self, Shape::Rect { .. })
    }
}
