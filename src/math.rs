//! 2D vector algebra
//!
//! `Vector2` is glam's double-precision `DVec2`. Add, sub, scale, dot and
//! length come from glam directly; the trait below covers the rest in the
//! form the physics code wants it.

use glam::DVec2;

/// 2D vector (x, y) in world units
pub type Vector2 = DVec2;

/// Operations the physics core uses that glam names differently or not at all
pub trait Vector2Ext {
    /// Scalar 2D cross product (z of the 3D cross product)
    fn cross(self, rhs: Self) -> f64;

    /// Unit vector in the same direction, or zero for a zero-length vector
    fn safe_normalize(self) -> Self;

    /// Rotate counter-clockwise by an angle in degrees
    fn rotate_deg(self, angle_deg: f64) -> Self;

    /// Left-hand perpendicular (-y, x)
    fn perpendicular(self) -> Self;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn cross(self, rhs: Self) -> f64 {
        self.perp_dot(rhs)
    }

    #[inline]
    fn safe_normalize(self) -> Self {
        self.normalize_or_zero()
    }

    #[inline]
    fn rotate_deg(self, angle_deg: f64) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        DVec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    fn perpendicular(self) -> Self {
        DVec2::new(-self.y, self.x)
    }
}

/// Arithmetic mean of a set of points (zero for an empty set)
pub fn centroid(points: &[Vector2]) -> Vector2 {
    if points.is_empty() {
        return Vector2::ZERO;
    }
    let sum = points.iter().fold(Vector2::ZERO, |acc, p| acc + *p);
    sum / points.len() as f64
}
