//! Circle/box geometry helpers
//!
//! Every collider in the simulation is a circle. Boxes only exist for the
//! broad phase in the quadtree.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box (min corner + size)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Bounding square of a circle (side = 2 × radius)
    #[inline]
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self {
            x: center.x - radius,
            y: center.y - radius,
            w: radius * 2.0,
            h: radius * 2.0,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Touching edges count as intersecting (broad phase must be conservative)
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Whether `other` lies entirely inside this box
    #[inline]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Strict circle overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Penetration depth of two circles (positive when overlapping)
#[inline]
pub fn overlap_depth(a: Vec2, ra: f32, b: Vec2, rb: f32) -> f32 {
    ra + rb - a.distance(b)
}

#[inline]
pub fn lerp_vec(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a + (b - a) * t
}

/// Direction from `from` to `to`, or `fallback` when the points coincide
#[inline]
pub fn direction_or(from: Vec2, to: Vec2, fallback: Vec2) -> Vec2 {
    let d = to - from;
    if d.length_squared() < 1e-8 {
        fallback
    } else {
        d.normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0));
        // Touching is not overlapping
        assert!(!circles_overlap(Vec2::ZERO, 10.0, Vec2::new(20.0, 0.0), 10.0));
        assert!(!circles_overlap(Vec2::ZERO, 5.0, Vec2::new(30.0, 30.0), 5.0));
    }

    #[test]
    fn test_overlap_depth() {
        let d = overlap_depth(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0);
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_aabb_intersects_and_contains() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let b = Aabb::new(5.0, 5.0, 10.0, 10.0);
        let c = Aabb::new(20.0, 20.0, 1.0, 1.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains(&Aabb::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_around_circle() {
        let bb = Aabb::around_circle(Vec2::new(50.0, 40.0), 10.0);
        assert_eq!(bb, Aabb::new(40.0, 30.0, 20.0, 20.0));
    }

    #[test]
    fn test_lerp() {
        let v = lerp_vec(Vec2::ZERO, Vec2::new(10.0, 20.0), 0.5);
        assert_eq!(v, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_direction_or_coincident() {
        let d = direction_or(Vec2::ONE, Vec2::ONE, Vec2::X);
        assert_eq!(d, Vec2::X);
    }
}
