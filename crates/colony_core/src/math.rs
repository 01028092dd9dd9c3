//! Geometry primitives for the simulation.
//!
//! Positions are pixel-space `f64` vectors. Every operation returns a new
//! value, so vectors and rectangles can be freely copied between entities
//! without aliasing.

use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// 2D vector in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Vec2 {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == 0.0 {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Bit pattern of both components, for hashing.
    #[must_use]
    pub fn to_bits(self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

/// Axis-aligned rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Rect {
    /// Create a rectangle from its corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle from a top-left position and a size.
    #[must_use]
    pub fn from_origin_size(origin: Vec2, width: f64, height: f64) -> Self {
        Self {
            min: origin,
            max: Vec2::new(origin.x + width, origin.y + height),
        }
    }

    /// Width of the rectangle.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.min.x + self.width() / 2.0,
            self.min.y + self.height() / 2.0,
        )
    }

    /// Whether the two rectangles share any interior area.
    ///
    /// Rectangles that only touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Whether `point` lies inside the rectangle (half-open on the max edges).
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x < self.max.x && point.y >= self.min.y && point.y < self.max.y
    }

    /// The point on or inside the rectangle closest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Distance from the rectangle's nearest edge to `point`.
    ///
    /// Zero when the point is inside the rectangle.
    #[must_use]
    pub fn edge_distance_to(&self, point: Vec2) -> f64 {
        point.distance(self.closest_point(point))
    }

    /// Whether a circle intersects the rectangle (closest-point test).
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f64) -> bool {
        center.distance_squared(self.closest_point(center)) <= radius * radius
    }

    /// The same rectangle moved so its top-left corner sits at `origin`.
    #[must_use]
    pub fn moved_to(&self, origin: Vec2) -> Self {
        Self::from_origin_size(origin, self.width(), self.height())
    }
}

/// Wrap an angle into `[-π, π]`.
#[must_use]
pub fn normalize_angle(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Turn `current` toward `target` by at most `max_delta` radians.
///
/// Takes the short way around the circle.
#[must_use]
pub fn rotate_toward(current: f64, target: f64, max_delta: f64) -> f64 {
    let diff = normalize_angle(target - current);
    if diff.abs() < max_delta {
        target
    } else if diff > 0.0 {
        current + max_delta
    } else {
        current - max_delta
    }
}

/// Facing angle for a displacement; 0 points up the screen.
#[must_use]
pub fn facing_angle(delta: Vec2) -> f64 {
    delta.y.atan2(delta.x) + PI / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vec2::ZERO.normalize(), Vec2::ZERO);
    }

    #[test]
    fn test_normalize_has_unit_length() {
        let v = Vec2::new(3.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_distance() {
        assert!((Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_rect_edge_overlap_is_not_overlap() {
        let a = Rect::from_origin_size(Vec2::ZERO, 10.0, 10.0);
        let b = Rect::from_origin_size(Vec2::new(10.0, 0.0), 10.0, 10.0);
        let c = Rect::from_origin_size(Vec2::new(9.0, 9.0), 10.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_edge_distance() {
        let r = Rect::from_origin_size(Vec2::ZERO, 64.0, 64.0);
        assert_eq!(r.edge_distance_to(Vec2::new(32.0, 32.0)), 0.0);
        assert!((r.edge_distance_to(Vec2::new(100.0, 32.0)) - 36.0).abs() < 1e-12);
        assert!((r.edge_distance_to(Vec2::new(67.0, 68.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_circle_intersection() {
        let r = Rect::from_origin_size(Vec2::new(100.0, 0.0), 50.0, 50.0);
        assert!(r.intersects_circle(Vec2::new(90.0, 25.0), 10.0));
        assert!(!r.intersects_circle(Vec2::new(80.0, 25.0), 10.0));
    }

    #[test]
    fn test_normalize_angle_wraps() {
        let wrapped = normalize_angle(3.0 * PI);
        assert!((wrapped - PI).abs() < 1e-9);
        assert!((normalize_angle(-1.5 * PI) - 0.5 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_rotate_toward_clamps_turn_rate() {
        assert!((rotate_toward(0.0, 2.0, 1.0) - 1.0).abs() < 1e-12);
        assert!((rotate_toward(0.0, -2.0, 1.0) + 1.0).abs() < 1e-12);
        assert_eq!(rotate_toward(0.0, 0.5, 1.0), 0.5);
    }

    #[test]
    fn test_rotate_toward_takes_short_way() {
        // From just below +π to just above -π is a small positive turn.
        let current = PI - 0.1;
        let target = -PI + 0.1;
        let next = rotate_toward(current, target, 0.05);
        assert!(next > current);
    }

    #[test]
    fn test_facing_angle_convention() {
        assert!((facing_angle(Vec2::new(1.0, 0.0)) - PI / 2.0).abs() < 1e-12);
        assert!(facing_angle(Vec2::new(0.0, -1.0)).abs() < 1e-12);
    }
}
