//! Surface materials
//!
//! A material is copied onto every part and zone that uses it; nothing
//! depends on material identity.

use serde::{Deserialize, Serialize};

/// Smallest strength/threshold a material may carry
const MIN_STRENGTH: f64 = 1e-6;

/// Physical constants for one surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Mass per unit area (used to derive mass from polygon area)
    pub density: f64,
    /// Restitution in [0, 1] (1 = perfectly bouncy)
    pub elasticity: f64,
    /// Linear damping coefficient in [0, 1]
    pub friction: f64,
    /// Deformation a zone absorbs before it breaks
    pub strength: f64,
    /// Per-vertex displacement above which cracks may appear
    pub deformation_threshold: f64,
}

impl Material {
    /// Create a material, clamping every value into its valid range
    pub fn new(
        density: f64,
        elasticity: f64,
        friction: f64,
        strength: f64,
        deformation_threshold: f64,
    ) -> Self {
        Self {
            density: density.max(0.0),
            elasticity: elasticity.clamp(0.0, 1.0),
            friction: friction.clamp(0.0, 1.0),
            strength: strength.max(MIN_STRENGTH),
            deformation_threshold: deformation_threshold.max(MIN_STRENGTH),
        }
    }

    /// Body panels
    pub fn steel() -> Self {
        Self::new(7.8, 0.2, 0.3, 40.0, 0.8)
    }

    /// Light body panels: dents sooner than steel
    pub fn aluminum() -> Self {
        Self::new(2.7, 0.25, 0.3, 25.0, 0.5)
    }

    /// Bumpers and trim
    pub fn plastic() -> Self {
        Self::new(1.2, 0.4, 0.35, 15.0, 0.6)
    }

    /// Windows: cracks easily, breaks early
    pub fn glass() -> Self {
        Self::new(2.5, 0.1, 0.2, 6.0, 0.15)
    }

    /// Tyres
    pub fn rubber() -> Self {
        Self::new(1.1, 0.8, 0.9, 60.0, 2.0)
    }

    /// Walls and barriers
    pub fn concrete() -> Self {
        Self::new(2.4, 0.1, 0.6, 400.0, 5.0)
    }

    /// Crates and cones
    pub fn wood() -> Self {
        Self::new(0.7, 0.3, 0.5, 12.0, 0.4)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::steel()
    }
}
