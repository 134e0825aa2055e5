//! Physics tuning settings
//!
//! Loaded from JSON so tuning can change without a rebuild. Every field has a
//! default, so a settings file only needs to list what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Vector2;
use crate::consts::*;
use crate::error::ConfigError;

/// Simulation tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Constant acceleration applied to every movable part (zero for top-down)
    pub gravity: Vector2,
    /// Largest dt a single step will integrate
    pub max_dt: f64,

    // === Deformation ===
    /// Radius around an impact inside which zone vertices are displaced
    pub influence_radius: f64,
    /// Displacement per unit force at the impact point
    pub deformation_scale: f64,
    /// Share of the collision impulse fed into damage zones
    pub deformation_transfer: f64,
    /// Crack records kept per zone
    pub max_cracks_per_zone: usize,

    // === Resolution ===
    /// Share of penetration depth each movable body is pushed out by
    pub correction_factor: f64,
    /// Optional cap on impulse magnitude (None = unclamped)
    pub max_impulse: Option<f64>,

    // === Game rules ===
    /// Rebuild a car at its spawn point once its chassis breaks
    pub respawn_wrecked: bool,
    /// Relative speed above which a collision counts as a crash
    pub crash_threshold: f64,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: Vector2::ZERO,
            max_dt: MAX_DT,

            influence_radius: INFLUENCE_RADIUS,
            deformation_scale: DEFORMATION_SCALE,
            deformation_transfer: DEFORMATION_TRANSFER,
            max_cracks_per_zone: MAX_CRACKS_PER_ZONE,

            correction_factor: POSITION_CORRECTION,
            max_impulse: None,

            respawn_wrecked: true,
            crash_threshold: CRASH_THRESHOLD,
        }
    }
}

impl PhysicsSettings {
    /// Parse settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded physics settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Load settings from a JSON file, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!(
                    "Using default physics settings ({}: {})",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamp a frame dt into [0, max_dt]
    pub fn effective_dt(&self, dt: f64) -> f64 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        dt.min(self.max_dt)
    }

    /// Apply the optional impulse cap
    pub fn clamp_impulse(&self, j: f64) -> f64 {
        match self.max_impulse {
            Some(max) => j.min(max),
            None => j,
        }
    }
}
