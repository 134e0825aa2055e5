//! Cars
//!
//! A car is an ordered list of parts. Part 0 is the chassis: it carries the
//! engine, steering and the car's overall motion. Every other part is
//! mounted at a fixed offset in chassis space and rides along with it until
//! it breaks off.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::material::Material;
use super::part::{CarPart, PartId, PartKind, rect};
use crate::consts::*;
use crate::error::GeometryError;
use crate::{Vector2, heading_vector, local_to_world, normalize_degrees};

/// Stable identifier of a car within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CarHandle(pub u32);

/// Tuning for a computer driver
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiParams {
    /// Throttle held while chasing, in [0, 1]
    pub aggression: f64,
    /// Steering per degree of heading error (full lock at 45 / gain degrees)
    pub steer_gain: f64,
    /// Random steering jitter amplitude
    pub wobble: f64,
}

impl Default for AiParams {
    fn default() -> Self {
        Self {
            aggression: 0.7,
            steer_gain: 1.0,
            wobble: 0.1,
        }
    }
}

/// Who drives the car
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CarRole {
    /// Driven by external input only
    Player,
    /// Drives itself toward the nearest other car
    Ai(AiParams),
}

/// Throttle/brake/steering for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    /// [-1, 1], negative is reverse
    pub throttle: f64,
    /// [0, 1]
    pub brake: f64,
    /// [-1, 1], positive turns counter-clockwise
    pub steering: f64,
}

impl ControlInput {
    pub fn new(throttle: f64, brake: f64, steering: f64) -> Self {
        Self {
            throttle: throttle.clamp(-1.0, 1.0),
            brake: brake.clamp(0.0, 1.0),
            steering: steering.clamp(-1.0, 1.0),
        }
    }
}

/// Blueprint for one part of a car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartTemplate {
    pub kind: PartKind,
    pub name: String,
    /// Local-space outline
    pub vertices: Vec<Vector2>,
    /// Offset from the chassis centre (zero for the chassis itself)
    pub mount: Vector2,
    pub material: Material,
    pub mass: f64,
    pub color: u32,
}

impl PartTemplate {
    pub fn new(
        kind: PartKind,
        name: &str,
        vertices: Vec<Vector2>,
        mount: Vector2,
        material: Material,
        mass: f64,
        color: u32,
    ) -> Self {
        Self {
            kind,
            name: name.to_string(),
            vertices,
            mount,
            material,
            mass,
            color,
        }
    }
}

/// Full description of a car: handling numbers plus its parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarSpec {
    pub name: String,
    /// Speed cap for the chassis
    pub max_speed: f64,
    /// Force at full throttle
    pub engine_force: f64,
    /// Angular velocity added per tick at full lock and full speed (deg/s)
    pub steer_rate: f64,
    /// First entry is the chassis
    pub parts: Vec<PartTemplate>,
}

impl CarSpec {
    /// A car that is nothing but a chassis
    pub fn single_body(name: &str, vertices: Vec<Vector2>, material: Material, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            max_speed: 180.0,
            engine_force: 40.0,
            steer_rate: 1.2,
            parts: vec![PartTemplate::new(
                PartKind::Chassis,
                "chassis",
                vertices,
                Vector2::ZERO,
                material,
                mass,
                0xC0392B,
            )],
        }
    }
}

/// Built-in car presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CarType {
    #[default]
    Sedan,
    Sports,
    Truck,
    Buggy,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Sedan => "Sedan",
            CarType::Sports => "Sports",
            CarType::Truck => "Truck",
            CarType::Buggy => "Buggy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sedan" => Some(CarType::Sedan),
            "sports" | "sport" => Some(CarType::Sports),
            "truck" => Some(CarType::Truck),
            "buggy" => Some(CarType::Buggy),
            _ => None,
        }
    }

    /// Body colour of the chassis and panels
    pub fn color(&self) -> u32 {
        match self {
            CarType::Sedan => 0x2E86C1,
            CarType::Sports => 0xE74C3C,
            CarType::Truck => 0x7D6608,
            CarType::Buggy => 0x27AE60,
        }
    }

    /// Build the blueprint for this preset (facing +x)
    pub fn spec(&self) -> CarSpec {
        match self {
            CarType::Sedan => body_with_panels(
                self,
                30.0,
                16.0,
                Material::steel(),
                80.0,
                (180.0, 40.0, 1.2),
                true,
            ),
            CarType::Sports => body_with_panels(
                self,
                32.0,
                14.0,
                Material::aluminum(),
                60.0,
                (260.0, 45.0, 1.6),
                true,
            ),
            CarType::Truck => body_with_panels(
                self,
                44.0,
                20.0,
                Material::steel(),
                160.0,
                (130.0, 70.0, 0.8),
                true,
            ),
            CarType::Buggy => body_with_panels(
                self,
                22.0,
                14.0,
                Material::plastic(),
                45.0,
                (200.0, 30.0, 1.8),
                false,
            ),
        }
    }
}

/// Chassis plus hood, trunk, bumpers, optional doors and four wheels
fn body_with_panels(
    car_type: &CarType,
    length: f64,
    width: f64,
    body: Material,
    chassis_mass: f64,
    (max_speed, engine_force, steer_rate): (f64, f64, f64),
    doors: bool,
) -> CarSpec {
    let color = car_type.color();
    let (hl, hw) = (length / 2.0, width / 2.0);
    let panel = length * 0.25;
    let mut parts = vec![
        PartTemplate::new(PartKind::Chassis, "chassis", rect(length, width), Vector2::ZERO, body, chassis_mass, color),
        PartTemplate::new(PartKind::Hood, "hood", rect(panel, width - 2.0), Vector2::new(hl - panel / 2.0 - 1.0, 0.0), body, chassis_mass * 0.08, color),
        PartTemplate::new(PartKind::Trunk, "trunk", rect(panel * 0.8, width - 2.0), Vector2::new(-hl + panel * 0.4 + 1.0, 0.0), body, chassis_mass * 0.06, color),
        PartTemplate::new(PartKind::Bumper, "bumper_front", rect(2.0, width), Vector2::new(hl + 1.0, 0.0), Material::plastic(), chassis_mass * 0.04, 0x222222),
        PartTemplate::new(PartKind::Bumper, "bumper_rear", rect(2.0, width), Vector2::new(-hl - 1.0, 0.0), Material::plastic(), chassis_mass * 0.04, 0x222222),
    ];
    if doors {
        parts.push(PartTemplate::new(PartKind::Door, "door_left", rect(length * 0.3, 1.5), Vector2::new(0.0, hw + 0.75), body, chassis_mass * 0.05, color));
        parts.push(PartTemplate::new(PartKind::Door, "door_right", rect(length * 0.3, 1.5), Vector2::new(0.0, -hw - 0.75), body, chassis_mass * 0.05, color));
    }
    let wheel_x = hl * 0.6;
    for (name, mount) in [
        ("wheel_front_left", Vector2::new(wheel_x, hw)),
        ("wheel_front_right", Vector2::new(wheel_x, -hw)),
        ("wheel_rear_left", Vector2::new(-wheel_x, hw)),
        ("wheel_rear_right", Vector2::new(-wheel_x, -hw)),
    ] {
        parts.push(PartTemplate::new(PartKind::Wheel, name, rect(6.0, 3.0), mount, Material::rubber(), chassis_mass * 0.05, 0x111111));
    }

    CarSpec {
        name: car_type.as_str().to_string(),
        max_speed,
        engine_force,
        steer_rate,
        parts,
    }
}

/// One vehicle: chassis, attached parts, controls and damage state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedCar {
    pub handle: CarHandle,
    pub role: CarRole,
    pub spec: CarSpec,
    /// Where the car respawns
    pub spawn_position: Vector2,
    pub spawn_angle: f64,
    /// Last applied control input
    pub controls: ControlInput,
    parts: Vec<CarPart>,
    part_damage: BTreeMap<String, f64>,
    wreck_reported: bool,
}

impl AdvancedCar {
    /// Build a car from a blueprint; parts get consecutive ids from `first_part_id`
    pub fn from_spec(
        handle: CarHandle,
        spec: CarSpec,
        position: Vector2,
        angle: f64,
        role: CarRole,
        first_part_id: u32,
    ) -> Result<Self, GeometryError> {
        if spec.parts.is_empty() {
            return Err(GeometryError::NoParts);
        }

        let parts = spec
            .parts
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let mut part = CarPart::new(
                    PartId(first_part_id + i as u32),
                    template.kind,
                    template.vertices.clone(),
                    template.material,
                    template.mass,
                )?
                .with_name(template.name.clone())
                .with_color(template.color)
                .with_angle(angle)
                .at(local_to_world(position, angle, template.mount));
                if i > 0 {
                    part.mount = Some(template.mount);
                }
                Ok(part)
            })
            .collect::<Result<Vec<_>, GeometryError>>()?;

        let mut car = Self {
            handle,
            role,
            spec,
            spawn_position: position,
            spawn_angle: angle,
            controls: ControlInput::default(),
            parts,
            part_damage: BTreeMap::new(),
            wreck_reported: false,
        };
        car.refresh_damage();
        Ok(car)
    }

    /// Same car, fresh parts, back at the spawn point
    pub fn respawned(&self) -> Result<Self, GeometryError> {
        Self::from_spec(
            self.handle,
            self.spec.clone(),
            self.spawn_position,
            self.spawn_angle,
            self.role,
            self.parts[0].id.0,
        )
    }

    pub fn root(&self) -> &CarPart {
        &self.parts[0]
    }

    pub fn root_mut(&mut self) -> &mut CarPart {
        &mut self.parts[0]
    }

    pub fn parts(&self) -> &[CarPart] {
        &self.parts
    }

    pub(crate) fn parts_mut(&mut self) -> &mut [CarPart] {
        &mut self.parts
    }

    pub fn part(&self, name: &str) -> Option<&CarPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn position(&self) -> Vector2 {
        self.parts[0].position
    }

    pub fn velocity(&self) -> Vector2 {
        self.parts[0].velocity
    }

    pub fn angle(&self) -> f64 {
        self.parts[0].angle
    }

    /// Total mass of all parts still attached
    pub fn mass(&self) -> f64 {
        self.parts
            .iter()
            .enumerate()
            .filter(|(i, p)| *i == 0 || (p.mount.is_some() && !p.is_broken()))
            .map(|(_, p)| p.mass())
            .sum()
    }

    pub fn is_ai(&self) -> bool {
        matches!(self.role, CarRole::Ai(_))
    }

    /// The chassis is broken
    pub fn is_wrecked(&self) -> bool {
        self.parts[0].is_broken()
    }

    /// Returns true the first time it's called after the car was wrecked
    pub(crate) fn take_wreck_report(&mut self) -> bool {
        if self.is_wrecked() && !self.wreck_reported {
            self.wreck_reported = true;
            return true;
        }
        false
    }

    /// Drive the chassis
    pub fn apply_control(&mut self, throttle: f64, brake: f64, steering: f64) {
        let input = ControlInput::new(throttle, brake, steering);
        self.controls = input;

        let max_speed = self.spec.max_speed;
        let engine_force = self.spec.engine_force;
        let steer_rate = self.spec.steer_rate;
        let root = &mut self.parts[0];
        if root.is_broken() {
            return;
        }

        let forward = heading_vector(root.angle);
        let engine_power = input.throttle * engine_force;
        if engine_power > 0.0 {
            root.apply_impulse(forward * engine_power, root.position);
        } else if engine_power < 0.0 {
            root.apply_impulse(forward * engine_power * REVERSE_FACTOR, root.position);
        }

        if input.brake > 0.0 {
            let share = (input.brake * BRAKE_DECEL).min(1.0);
            let brake_force = -root.velocity * root.mass() * share;
            root.apply_impulse(brake_force, root.position);
        }

        let speed = root.velocity.length();
        if speed > STEER_MIN_SPEED && input.steering != 0.0 {
            // Steering flips when rolling backwards
            let direction = if root.velocity.dot(forward) >= 0.0 { 1.0 } else { -1.0 };
            let grip = (speed / max_speed).min(1.0);
            root.angular_velocity += input.steering * steer_rate * grip * direction;
        }

        if speed > max_speed {
            root.velocity = root.velocity / speed * max_speed;
        }
    }

    /// Control input for an AI driver chasing `target`
    ///
    /// Returns `None` for player cars.
    pub fn ai_control<R: Rng + ?Sized>(&self, target: Option<Vector2>, rng: &mut R) -> Option<ControlInput> {
        let CarRole::Ai(params) = self.role else {
            return None;
        };

        let Some(target) = target else {
            return Some(ControlInput::new(params.aggression * 0.5, 0.0, 0.0));
        };

        let to_target = target - self.position();
        let desired = to_target.y.atan2(to_target.x).to_degrees();
        let error = normalize_degrees(desired - self.angle());

        let jitter = if params.wobble > 0.0 {
            rng.random_range(-params.wobble..params.wobble)
        } else {
            0.0
        };
        let steering = (error / 45.0 * params.steer_gain + jitter).clamp(-1.0, 1.0);
        // Ease off when facing away from the target
        let (throttle, brake) = if error.abs() > 120.0 {
            (params.aggression * 0.3, 0.3)
        } else {
            (params.aggression, 0.0)
        };

        Some(ControlInput::new(throttle, brake, steering))
    }

    /// Integrate the chassis and carry attached parts along
    ///
    /// Velocity an attached part picked up from collisions since the last
    /// tick is handed to the chassis as momentum before integrating.
    pub fn update_physics(&mut self, dt: f64, gravity: Vector2) {
        let Some((root, rest)) = self.parts.split_first_mut() else {
            return;
        };

        for child in rest.iter_mut() {
            if child.mount.is_none() || child.is_broken() {
                continue;
            }
            let excess = child.velocity - root.velocity;
            if excess != Vector2::ZERO {
                root.apply_impulse(excess * child.mass(), child.position);
            }
        }

        root.update_physics(dt, gravity);

        for child in rest.iter_mut() {
            match child.mount {
                Some(mount) if !child.is_broken() => {
                    child.position = local_to_world(root.position, root.angle, mount);
                    child.angle = root.angle;
                    child.velocity = root.velocity;
                    child.angular_velocity = root.angular_velocity;
                }
                _ => child.update_physics(dt, gravity),
            }
        }
    }

    /// Recompute per-part damage percentages
    pub fn refresh_damage(&mut self) {
        self.part_damage.clear();
        for part in &self.parts {
            self.part_damage.insert(part.name.clone(), part.damage_percent());
        }
    }

    /// Damage percentage per part name
    pub fn part_damage(&self) -> &BTreeMap<String, f64> {
        &self.part_damage
    }

    /// Mean of all part damage percentages (0 with no parts)
    pub fn get_total_damage(&self) -> f64 {
        if self.part_damage.is_empty() {
            return 0.0;
        }
        self.part_damage.values().sum::<f64>() / self.part_damage.len() as f64
    }
}
