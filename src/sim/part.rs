//! Rigid parts
//!
//! A part is one convex polygon with its own kinematic state. Its outline is
//! split into damage zones at construction: zone `i` owns vertex `i` and the
//! midpoint of edge `i -> i+1`, so walking the zones in order walks the
//! whole outline exactly once.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::damage::{DamageZone, DeformParams};
use super::material::Material;
use crate::consts::*;
use crate::error::GeometryError;
use crate::{Vector2, Vector2Ext, local_to_world, world_to_local};

/// Edges shorter than this count as degenerate
const MIN_EDGE_LENGTH: f64 = 1e-9;

/// Stable identifier of a part within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartId(pub u32);

/// What a part represents (drives naming and default colours)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartKind {
    Chassis,
    Hood,
    Trunk,
    Door,
    Bumper,
    Wheel,
    Obstacle,
    Wall,
}

impl PartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartKind::Chassis => "chassis",
            PartKind::Hood => "hood",
            PartKind::Trunk => "trunk",
            PartKind::Door => "door",
            PartKind::Bumper => "bumper",
            PartKind::Wheel => "wheel",
            PartKind::Obstacle => "obstacle",
            PartKind::Wall => "wall",
        }
    }
}

/// Check that a polygon can be used for SAT
pub fn validate_polygon(vertices: &[Vector2]) -> Result<(), GeometryError> {
    if vertices.len() < 3 {
        return Err(GeometryError::TooFewVertices {
            count: vertices.len(),
        });
    }
    if let Some(index) = vertices.iter().position(|v| !v.is_finite()) {
        return Err(GeometryError::NonFiniteVertex { index });
    }
    for i in 0..vertices.len() {
        let next = vertices[(i + 1) % vertices.len()];
        if (next - vertices[i]).length() < MIN_EDGE_LENGTH {
            return Err(GeometryError::ZeroLengthEdge { index: i });
        }
    }
    Ok(())
}

/// Polygon area (shoelace, absolute value)
pub fn polygon_area(vertices: &[Vector2]) -> f64 {
    let n = vertices.len();
    let twice: f64 = (0..n)
        .map(|i| vertices[i].cross(vertices[(i + 1) % n]))
        .sum();
    twice.abs() * 0.5
}

/// Axis-aligned box centred on the origin, wound counter-clockwise
pub fn rect(width: f64, height: f64) -> Vec<Vector2> {
    let (hw, hh) = (width / 2.0, height / 2.0);
    vec![
        Vector2::new(-hw, -hh),
        Vector2::new(hw, -hh),
        Vector2::new(hw, hh),
        Vector2::new(-hw, hh),
    ]
}

/// Split an outline into one zone per vertex (vertex + following edge midpoint)
fn build_zones(vertices: &[Vector2], material: Material) -> Result<Vec<DamageZone>, GeometryError> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            DamageZone::new(vec![a, (a + b) * 0.5], material)
        })
        .collect()
}

/// A rigid, deformable body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarPart {
    pub id: PartId,
    pub kind: PartKind,
    /// Display/damage-report name ("chassis", "door_left", ...)
    pub name: String,

    // === Kinematic state ===
    pub position: Vector2,
    pub velocity: Vector2,
    /// Rotation in degrees
    pub angle: f64,
    /// Degrees per second
    pub angular_velocity: f64,

    // === Shape and body ===
    vertices: Vec<Vector2>,
    pub material: Material,
    mass: f64,
    is_fixed: bool,
    zones: Vec<DamageZone>,
    broken: bool,

    /// Offset from the chassis in chassis space, for parts attached to a car
    pub mount: Option<Vector2>,
    /// RGB colour for renderers
    pub color: u32,
}

impl CarPart {
    /// Create a movable part at the origin
    pub fn new(
        id: PartId,
        kind: PartKind,
        vertices: Vec<Vector2>,
        material: Material,
        mass: f64,
    ) -> Result<Self, GeometryError> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(GeometryError::InvalidMass { mass });
        }
        Self::build(id, kind, vertices, material, mass, false)
    }

    /// Create a movable part whose mass comes from area * density
    pub fn from_density(
        id: PartId,
        kind: PartKind,
        vertices: Vec<Vector2>,
        material: Material,
    ) -> Result<Self, GeometryError> {
        validate_polygon(&vertices)?;
        let mass = polygon_area(&vertices) * material.density;
        Self::new(id, kind, vertices, material, mass)
    }

    /// Create an immovable part (wall, anchored obstacle)
    pub fn new_fixed(
        id: PartId,
        kind: PartKind,
        vertices: Vec<Vector2>,
        material: Material,
    ) -> Result<Self, GeometryError> {
        Self::build(id, kind, vertices, material, f64::INFINITY, true)
    }

    fn build(
        id: PartId,
        kind: PartKind,
        vertices: Vec<Vector2>,
        material: Material,
        mass: f64,
        is_fixed: bool,
    ) -> Result<Self, GeometryError> {
        validate_polygon(&vertices)?;
        let zones = build_zones(&vertices, material)?;

        Ok(Self {
            id,
            kind,
            name: kind.as_str().to_string(),
            position: Vector2::ZERO,
            velocity: Vector2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            vertices,
            material,
            mass,
            is_fixed,
            zones,
            broken: false,
            mount: None,
            color: 0xB0B0B0,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, position: Vector2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle_deg: f64) -> Self {
        self.angle = angle_deg;
        self
    }

    pub fn with_velocity(mut self, velocity: Vector2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    /// Integrate one step (semi-implicit Euler)
    pub fn update_physics(&mut self, dt: f64, gravity: Vector2) {
        if self.broken || self.is_fixed {
            return;
        }

        self.velocity += gravity * dt;
        self.velocity += -self.velocity * self.material.friction * dt;
        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
        // Per tick, not per second
        self.angular_velocity *= ANGULAR_DAMPING;
    }

    /// Change linear and angular velocity without touching the damage zones
    ///
    /// Fixed parts have zero inverse mass and are unaffected.
    pub fn apply_impulse(&mut self, force: Vector2, application_point: Vector2) {
        if self.broken {
            return;
        }

        let inv_mass = self.inverse_mass();
        self.velocity += force * inv_mass;

        let r = application_point - self.position;
        let torque = r.cross(force);
        self.angular_velocity += torque * inv_mass / INERTIA_FACTOR;
    }

    /// Apply a force: kinematics plus deformation of every zone
    ///
    /// Returns the total zone displacement.
    pub fn apply_force<R: Rng + ?Sized>(
        &mut self,
        force: Vector2,
        application_point: Vector2,
        params: &DeformParams,
        rng: &mut R,
    ) -> f64 {
        if self.broken {
            return 0.0;
        }
        self.apply_impulse(force, application_point);
        self.deform(application_point, force, params, rng)
    }

    /// Feed an impact into the damage zones only
    ///
    /// `point` and `force` are in world space. Works on fixed parts too.
    pub fn deform<R: Rng + ?Sized>(
        &mut self,
        point: Vector2,
        force: Vector2,
        params: &DeformParams,
        rng: &mut R,
    ) -> f64 {
        if self.broken {
            return 0.0;
        }

        let local_point = world_to_local(self.position, self.angle, point);
        let local_force = force.rotate_deg(-self.angle);
        let moved: f64 = self
            .zones
            .iter_mut()
            .map(|zone| zone.apply_force(local_point, local_force, params, rng))
            .sum();

        if self.total_deformation() > BREAK_MULTIPLIER * self.material.strength {
            // Debris stays where it broke
            self.broken = true;
            self.velocity = Vector2::ZERO;
            self.angular_velocity = 0.0;
            log::info!("Part {} ({}) broke", self.id.0, self.name);
        }

        moved
    }

    /// Zero when fixed; otherwise 1 / mass
    pub fn inverse_mass(&self) -> f64 {
        if self.is_fixed { 0.0 } else { 1.0 / self.mass }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn is_fixed(&self) -> bool {
        self.is_fixed
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Rigid outline in local space
    pub fn vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    pub fn zones(&self) -> &[DamageZone] {
        &self.zones
    }

    /// Rigid outline in world space (used for collision)
    pub fn world_vertices(&self) -> Vec<Vector2> {
        self.vertices
            .iter()
            .map(|v| local_to_world(self.position, self.angle, *v))
            .collect()
    }

    /// Deformed outline in world space (used for drawing)
    pub fn deformed_outline(&self) -> Vec<Vector2> {
        self.zones
            .iter()
            .flat_map(|z| z.current_vertices().iter())
            .map(|v| local_to_world(self.position, self.angle, *v))
            .collect()
    }

    /// Summed deformation over all zones
    pub fn total_deformation(&self) -> f64 {
        self.zones.iter().map(|z| z.deformation()).sum()
    }

    /// Damage as a percentage of the break point, in [0, 100]
    pub fn damage_percent(&self) -> f64 {
        if self.broken {
            return 100.0;
        }
        let limit = BREAK_MULTIPLIER * self.material.strength;
        (self.total_deformation() / limit * 100.0).clamp(0.0, 100.0)
    }

    /// Largest rigid vertex distance from the centre (bounding circle radius)
    pub fn bounding_radius(&self) -> f64 {
        self.vertices.iter().map(|v| v.length()).fold(0.0, f64::max)
    }
}
