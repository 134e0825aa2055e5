//! Crumple - 2D car crash physics with progressive deformation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (parts, cars, collisions, world step)
//! - `math`: `Vector2` and the few vector operations glam spells differently
//! - `config`: Data-driven physics tuning
//! - `scoring`: Crash counting and score from the collision stream
//! - `error`: Construction-time failures

pub mod config;
pub mod error;
pub mod math;
pub mod scoring;
pub mod sim;

pub use config::PhysicsSettings;
pub use error::{ConfigError, GeometryError};
pub use math::{Vector2, Vector2Ext};
pub use scoring::CrashTally;

/// Tuned simulation constants
///
/// These are "feel" values. They are kept literal so that a car driven the
/// same way crumples the same way.
pub mod consts {
    /// Largest timestep a single `step` will integrate (seconds)
    pub const MAX_DT: f64 = 0.1;

    /// Radius around an impact point inside which zone vertices move
    pub const INFLUENCE_RADIUS: f64 = 50.0;
    /// Displacement per unit of force at the impact point
    pub const DEFORMATION_SCALE: f64 = 0.01;
    /// Share of a collision impulse that is fed into the damage zones
    pub const DEFORMATION_TRANSFER: f64 = 0.1;
    /// Share of the penetration depth each body is pushed out per resolution
    pub const POSITION_CORRECTION: f64 = 0.5;

    /// Per-tick angular velocity damping (not scaled by dt)
    pub const ANGULAR_DAMPING: f64 = 0.99;
    /// Moment of inertia approximation: I = mass * INERTIA_FACTOR
    pub const INERTIA_FACTOR: f64 = 100.0;
    /// A part breaks when summed zone deformation exceeds strength * this
    pub const BREAK_MULTIPLIER: f64 = 3.0;

    /// Crack records kept per zone
    pub const MAX_CRACKS_PER_ZONE: usize = 24;

    /// Reverse gear gets this share of engine force
    pub const REVERSE_FACTOR: f64 = 0.5;
    /// Per-tick velocity fraction removed at full brake
    pub const BRAKE_DECEL: f64 = 0.08;
    /// Minimum speed for steering to have any effect
    pub const STEER_MIN_SPEED: f64 = 0.5;

    /// Relative speed above which a collision is scored as a crash
    pub const CRASH_THRESHOLD: f64 = 2.0;
    /// Score per unit of crash speed
    pub const CRASH_SCORE_FACTOR: f64 = 5.0;
}

/// Normalize an angle in degrees to [-180, 180)
#[inline]
pub fn normalize_degrees(mut angle: f64) -> f64 {
    while angle >= 180.0 {
        angle -= 360.0;
    }
    while angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Unit vector pointing along a heading given in degrees
#[inline]
pub fn heading_vector(angle_deg: f64) -> Vector2 {
    let rad = angle_deg.to_radians();
    Vector2::new(rad.cos(), rad.sin())
}

/// Transform a local-space point into world space
#[inline]
pub fn local_to_world(position: Vector2, angle_deg: f64, local: Vector2) -> Vector2 {
    position + local.rotate_deg(angle_deg)
}

/// Transform a world-space point into a body's local space
#[inline]
pub fn world_to_local(position: Vector2, angle_deg: f64, world: Vector2) -> Vector2 {
    (world - position).rotate_deg(-angle_deg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert!((normalize_degrees(190.0) - (-170.0)).abs() < 1e-9);
        assert!((normalize_degrees(-540.0) - (-180.0)).abs() < 1e-9);
        assert!((normalize_degrees(45.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_local_world_roundtrip_at_angle() {
        let pos = Vector2::new(10.0, -4.0);
        let local = Vector2::new(3.0, 2.0);
        let world = local_to_world(pos, 90.0, local);
        // 90 degrees maps +x onto +y
        assert!((world - Vector2::new(8.0, -1.0)).length() < 1e-9);
        assert!((world_to_local(pos, 90.0, world) - local).length() < 1e-9);
    }
}
