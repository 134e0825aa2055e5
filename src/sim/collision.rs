//! Collision detection and response for convex polygons
//!
//! Detection is the separating axis test over every edge normal of both
//! polygons. Response is a single normal impulse, a positional push-out and
//! a dent in each side's damage zones.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::damage::DeformParams;
use super::part::CarPart;
use crate::config::PhysicsSettings;
use crate::math::centroid;
use crate::{Vector2, Vector2Ext};

/// Result of a SAT test that found overlap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Unit normal pointing from the first polygon toward the second
    pub normal: Vector2,
    /// Overlap along the normal
    pub depth: f64,
    /// Midpoint of the edge that produced the normal
    pub point: Vector2,
}

/// What a resolution did, for building the collision record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Impulse magnitude applied along the normal
    pub impulse: f64,
    /// Closing speed along the normal before the impulse
    pub relative_speed: f64,
}

/// Project a polygon onto an axis, returning (min, max)
pub fn project(vertices: &[Vector2], axis: Vector2) -> (f64, f64) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p), hi.max(p)))
}

/// Overlap of two projections along an axis (<= 0 means separated)
pub fn overlap_on_axis(a: &[Vector2], b: &[Vector2], axis: Vector2) -> f64 {
    let (min_a, max_a) = project(a, axis);
    let (min_b, max_b) = project(b, axis);
    (max_a - min_b).min(max_b - min_a)
}

/// Separating axis test for two convex polygons in world space
///
/// Axes are the edge normals of `a` followed by those of `b`, in vertex
/// order. The first axis with the smallest overlap wins ties. Returns
/// `None` as soon as any axis separates the shapes.
pub fn sat_collision(a: &[Vector2], b: &[Vector2]) -> Option<Contact> {
    if a.len() < 3 || b.len() < 3 {
        return None;
    }

    let mut best: Option<(f64, Vector2, Vector2)> = None;

    for poly in [a, b] {
        let n = poly.len();
        for i in 0..n {
            let start = poly[i];
            let end = poly[(i + 1) % n];
            let axis = (end - start).perpendicular().safe_normalize();

            let depth = overlap_on_axis(a, b, axis);
            if depth <= 0.0 {
                return None;
            }

            let better = match best {
                Some((min_depth, _, _)) => depth < min_depth,
                None => true,
            };
            if better {
                best = Some((depth, axis, (start + end) * 0.5));
            }
        }
    }

    let (depth, mut normal, point) = best?;
    if (centroid(b) - centroid(a)).dot(normal) < 0.0 {
        normal = -normal;
    }

    Some(Contact {
        normal,
        depth,
        point,
    })
}

/// Resolve one contact between two parts
///
/// Returns `None` when the parts are already separating or neither can
/// move. Otherwise applies the impulse, pushes movable parts apart and
/// dents both sides.
pub fn resolve<R: Rng + ?Sized>(
    a: &mut CarPart,
    b: &mut CarPart,
    contact: &Contact,
    settings: &PhysicsSettings,
    rng: &mut R,
) -> Option<Resolution> {
    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return None;
    }

    let n = contact.normal;
    let v_rel = b.velocity - a.velocity;
    let vn = v_rel.dot(n);
    if vn > 0.0 {
        return None;
    }

    let e = a.material.elasticity.min(b.material.elasticity);
    let j = settings.clamp_impulse(-(1.0 + e) * vn / inv_sum);
    let impulse = n * j;

    a.velocity -= impulse * inv_a;
    b.velocity += impulse * inv_b;

    let push = n * (contact.depth * settings.correction_factor);
    if !a.is_fixed() {
        a.position -= push;
    }
    if !b.is_fixed() {
        b.position += push;
    }

    let dent = j * settings.deformation_transfer;
    if dent > 0.0 {
        let params = DeformParams::from(settings);
        a.deform(contact.point, -n * dent, &params, rng);
        b.deform(contact.point, n * dent, &params, rng);
    }

    Some(Resolution {
        impulse: j,
        relative_speed: -vn,
    })
}
