//! World state
//!
//! The world owns every car and every standalone obstacle. Iteration order
//! is always cars in insertion order (each car's parts in order), then
//! obstacles in insertion order.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::car::{AdvancedCar, CarHandle, CarRole, CarSpec, CarType};
use super::events::{CollisionRecord, EventSink, NullSink, Owner};
use super::material::Material;
use super::part::{CarPart, PartId, PartKind, polygon_area, validate_polygon};
use super::tick;
use crate::Vector2;
use crate::config::PhysicsSettings;
use crate::math::centroid;

/// Where a part lives inside the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PartLoc {
    Car { car: usize, part: usize },
    Obstacle(usize),
}

/// Frozen view of one part for renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSnapshot {
    pub id: PartId,
    pub owner: Owner,
    pub kind: PartKind,
    pub name: String,
    /// Rigid outline (world space)
    pub hull: Vec<Vector2>,
    /// Deformed outline (world space)
    pub outline: Vec<Vector2>,
    /// Crack positions (world space)
    pub cracks: Vec<Vector2>,
    pub broken: bool,
    pub damage_percent: f64,
    pub color: u32,
}

/// The simulated world
#[derive(Debug, Clone)]
pub struct World {
    pub settings: PhysicsSettings,
    /// Seed the cosmetic/AI RNG was created from
    pub seed: u64,
    /// Steps taken
    pub time_ticks: u64,
    pub(crate) rng: Pcg32,
    pub(crate) cars: Vec<AdvancedCar>,
    pub(crate) obstacles: Vec<CarPart>,
    pub(crate) last_collisions: Vec<CollisionRecord>,
    next_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(PhysicsSettings::default())
    }
}

impl World {
    /// Create an empty world (seed 0)
    pub fn new(settings: PhysicsSettings) -> Self {
        Self::with_seed(settings, 0)
    }

    /// Create an empty world with a specific RNG seed
    pub fn with_seed(settings: PhysicsSettings, seed: u64) -> Self {
        Self {
            settings,
            seed,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            cars: Vec::new(),
            obstacles: Vec::new(),
            last_collisions: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate `count` consecutive ids, returning the first
    fn allocate_ids(&mut self, count: usize) -> u32 {
        let first = self.next_id;
        self.next_id += count as u32;
        first
    }

    /// Add a player car from a preset
    pub fn add_car(&mut self, position: Vector2, car_type: CarType) -> Result<CarHandle, crate::GeometryError> {
        self.add_car_with(position, 0.0, car_type.spec(), CarRole::Player)
    }

    /// Add a car from a full blueprint
    pub fn add_car_with(
        &mut self,
        position: Vector2,
        angle: f64,
        spec: CarSpec,
        role: CarRole,
    ) -> Result<CarHandle, crate::GeometryError> {
        let handle = CarHandle(self.allocate_ids(1));
        let first_part = self.next_id;
        let car = AdvancedCar::from_spec(handle, spec, position, angle, role, first_part)?;
        self.allocate_ids(car.parts().len());
        log::info!(
            "Added car {} ({}, {} parts) at ({:.1}, {:.1})",
            handle.0,
            car.spec.name,
            car.parts().len(),
            position.x,
            position.y
        );
        self.cars.push(car);
        Ok(handle)
    }

    /// Add a standalone obstacle from a world-space polygon
    ///
    /// The part is centred on the polygon's vertex centroid. Movable
    /// obstacles get their mass from area and material density.
    pub fn add_obstacle(
        &mut self,
        polygon: Vec<Vector2>,
        material: Material,
        is_fixed: bool,
    ) -> Result<PartId, crate::GeometryError> {
        validate_polygon(&polygon)?;
        let center = centroid(&polygon);
        let local: Vec<Vector2> = polygon.iter().map(|v| *v - center).collect();
        let id = PartId(self.next_id);

        let part = if is_fixed {
            CarPart::new_fixed(id, PartKind::Wall, local, material)?.with_color(0x7F8C8D)
        } else {
            let mass = polygon_area(&local) * material.density;
            CarPart::new(id, PartKind::Obstacle, local, material, mass)?.with_color(0xD35400)
        };
        self.allocate_ids(1);
        self.obstacles.push(part.at(center));
        Ok(id)
    }

    pub fn cars(&self) -> &[AdvancedCar] {
        &self.cars
    }

    pub fn obstacles(&self) -> &[CarPart] {
        &self.obstacles
    }

    pub fn car(&self, handle: CarHandle) -> Option<&AdvancedCar> {
        self.cars.iter().find(|c| c.handle == handle)
    }

    pub fn car_mut(&mut self, handle: CarHandle) -> Option<&mut AdvancedCar> {
        self.cars.iter_mut().find(|c| c.handle == handle)
    }

    pub fn obstacle(&self, id: PartId) -> Option<&CarPart> {
        self.obstacles.iter().find(|p| p.id == id)
    }

    pub fn obstacle_mut(&mut self, id: PartId) -> Option<&mut CarPart> {
        self.obstacles.iter_mut().find(|p| p.id == id)
    }

    /// Look up any part by id
    pub fn part(&self, id: PartId) -> Option<&CarPart> {
        self.cars
            .iter()
            .flat_map(|c| c.parts().iter())
            .chain(self.obstacles.iter())
            .find(|p| p.id == id)
    }

    /// Total number of parts (car parts plus obstacles)
    pub fn part_count(&self) -> usize {
        self.cars.iter().map(|c| c.parts().len()).sum::<usize>() + self.obstacles.len()
    }

    /// Feed driver input to a car. Returns false for an unknown handle.
    pub fn apply_control(&mut self, handle: CarHandle, throttle: f64, brake: f64, steering: f64) -> bool {
        match self.car_mut(handle) {
            Some(car) => {
                car.apply_control(throttle, brake, steering);
                true
            }
            None => false,
        }
    }

    /// Let every AI car pick its input for this tick
    ///
    /// Each AI chases the nearest other car that isn't wrecked.
    pub fn drive_ai(&mut self) {
        for i in 0..self.cars.len() {
            if !self.cars[i].is_ai() || self.cars[i].is_wrecked() {
                continue;
            }

            let me = self.cars[i].position();
            let target = self
                .cars
                .iter()
                .enumerate()
                .filter(|(j, c)| *j != i && !c.is_wrecked())
                .map(|(_, c)| c.position())
                .min_by(|a, b| {
                    a.distance_squared(me)
                        .partial_cmp(&b.distance_squared(me))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

            if let Some(input) = self.cars[i].ai_control(target, &mut self.rng) {
                self.cars[i].apply_control(input.throttle, input.brake, input.steering);
            }
        }
    }

    /// Advance one step; returns this step's collisions
    pub fn step(&mut self, dt: f64) -> &[CollisionRecord] {
        self.step_with_sink(dt, &mut NullSink);
        &self.last_collisions
    }

    /// Advance one step, reporting into a caller-supplied sink
    ///
    /// The step's collisions are also kept for `last_collisions`.
    pub fn step_with_sink<S: EventSink + ?Sized>(&mut self, dt: f64, sink: &mut S) {
        let mut records: Vec<CollisionRecord> = Vec::new();
        tick::step(self, dt, &mut (&mut records, sink));
        self.last_collisions = records;
    }

    /// Collisions from the most recent step (either entry point)
    pub fn last_collisions(&self) -> &[CollisionRecord] {
        &self.last_collisions
    }

    /// Every part with its owner, in simulation order
    pub(crate) fn part_locations(&self) -> Vec<(PartLoc, Owner)> {
        let mut locs = Vec::with_capacity(self.part_count());
        for (ci, car) in self.cars.iter().enumerate() {
            for pi in 0..car.parts().len() {
                locs.push((PartLoc::Car { car: ci, part: pi }, Owner::Car(car.handle)));
            }
        }
        for (oi, part) in self.obstacles.iter().enumerate() {
            locs.push((PartLoc::Obstacle(oi), Owner::Obstacle(part.id)));
        }
        locs
    }

    /// Frozen per-part view for drawing
    pub fn snapshot(&self) -> Vec<PartSnapshot> {
        let car_parts = self
            .cars
            .iter()
            .flat_map(|c| c.parts().iter().map(move |p| (p, Owner::Car(c.handle))));
        let obstacles = self.obstacles.iter().map(|p| (p, Owner::Obstacle(p.id)));

        car_parts
            .chain(obstacles)
            .map(|(part, owner)| PartSnapshot {
                id: part.id,
                owner,
                kind: part.kind,
                name: part.name.clone(),
                hull: part.world_vertices(),
                outline: part.deformed_outline(),
                cracks: part
                    .zones()
                    .iter()
                    .flat_map(|z| z.cracks().iter())
                    .map(|c| crate::local_to_world(part.position, part.angle, c.point))
                    .collect(),
                broken: part.is_broken(),
                damage_percent: part.damage_percent(),
                color: part.color,
            })
            .collect()
    }
}

/// Borrow two parts at once. `None` if they are the same part, on the same
/// car, or out of range.
pub(crate) fn pair_mut<'a>(
    cars: &'a mut [AdvancedCar],
    obstacles: &'a mut [CarPart],
    a: PartLoc,
    b: PartLoc,
) -> Option<(&'a mut CarPart, &'a mut CarPart)> {
    match (a, b) {
        (PartLoc::Car { car: ca, part: pa }, PartLoc::Car { car: cb, part: pb }) => {
            if ca == cb {
                return None;
            }
            let swapped = ca > cb;
            let (lo, hi) = if swapped { (cb, ca) } else { (ca, cb) };
            let (left, right) = cars.split_at_mut(hi);
            let first = left[lo].parts_mut().get_mut(if swapped { pb } else { pa })?;
            let second = right.first_mut()?.parts_mut().get_mut(if swapped { pa } else { pb })?;
            Some(if swapped { (second, first) } else { (first, second) })
        }
        (PartLoc::Car { car, part }, PartLoc::Obstacle(o)) => {
            let x = cars.get_mut(car)?.parts_mut().get_mut(part)?;
            let y = obstacles.get_mut(o)?;
            Some((x, y))
        }
        (PartLoc::Obstacle(o), PartLoc::Car { car, part }) => {
            let x = obstacles.get_mut(o)?;
            let y = cars.get_mut(car)?.parts_mut().get_mut(part)?;
            Some((x, y))
        }
        (PartLoc::Obstacle(oa), PartLoc::Obstacle(ob)) => {
            if oa == ob {
                return None;
            }
            let swapped = oa > ob;
            let (lo, hi) = if swapped { (ob, oa) } else { (oa, ob) };
            let (left, right) = obstacles.split_at_mut(hi);
            let first = left.get_mut(lo)?;
            let second = right.first_mut()?;
            Some(if swapped { (second, first) } else { (first, second) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::part::rect;

    fn square_at(x: f64, y: f64, half: f64) -> Vec<Vector2> {
        vec![
            Vector2::new(x - half, y - half),
            Vector2::new(x + half, y - half),
            Vector2::new(x + half, y + half),
            Vector2::new(x - half, y + half),
        ]
    }

    #[test]
    fn test_ids_unique_and_stable() {
        let mut world = World::default();
        let a = world.add_car(Vector2::ZERO, CarType::Sedan).unwrap();
        let wall = world.add_obstacle(square_at(100.0, 0.0, 5.0), Material::concrete(), true).unwrap();
        let b = world.add_car(Vector2::new(0.0, 100.0), CarType::Buggy).unwrap();

        assert_ne!(a, b);
        let mut ids: Vec<PartId> = world.snapshot().iter().map(|s| s.id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(world.part(wall).unwrap().kind, PartKind::Wall);
        assert_eq!(total, world.part_count());
    }

    #[test]
    fn test_add_obstacle_centres_polygon() {
        let mut world = World::default();
        let id = world.add_obstacle(square_at(40.0, -10.0, 3.0), Material::wood(), false).unwrap();
        let crate_box = world.obstacle(id).unwrap();
        assert!((crate_box.position - Vector2::new(40.0, -10.0)).length() < 1e-9);
        assert!(!crate_box.is_fixed());
        assert!((crate_box.mass() - 36.0 * Material::wood().density).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_obstacle_rejected() {
        let mut world = World::default();
        let err = world
            .add_obstacle(vec![Vector2::ZERO, Vector2::X], Material::concrete(), true)
            .unwrap_err();
        assert_eq!(err, crate::GeometryError::TooFewVertices { count: 2 });
        assert!(world.obstacles().is_empty());
    }

    #[test]
    fn test_apply_control_unknown_handle() {
        let mut world = World::default();
        assert!(!world.apply_control(CarHandle(42), 1.0, 0.0, 0.0));
    }

    #[test]
    fn test_part_locations_order() {
        let mut world = World::default();
        world.add_obstacle(square_at(100.0, 0.0, 5.0), Material::concrete(), true).unwrap();
        let spec = CarSpec::single_body("box", rect(10.0, 10.0), Material::steel(), 10.0);
        world.add_car_with(Vector2::ZERO, 0.0, spec, CarRole::Player).unwrap();

        let locs = world.part_locations();
        // Cars come first even when added later
        assert_eq!(locs[0].0, PartLoc::Car { car: 0, part: 0 });
        assert_eq!(locs[1].0, PartLoc::Obstacle(0));
    }

    #[test]
    fn test_pair_mut_rejects_same_car() {
        let mut world = World::default();
        world.add_car(Vector2::ZERO, CarType::Sedan).unwrap();
        let World { cars, obstacles, .. } = &mut world;
        let a = PartLoc::Car { car: 0, part: 0 };
        let b = PartLoc::Car { car: 0, part: 1 };
        assert!(pair_mut(cars, obstacles, a, b).is_none());
    }

    #[test]
    fn test_pair_mut_keeps_argument_order() {
        let mut world = World::default();
        let first = world.add_car(Vector2::ZERO, CarType::Sedan).unwrap();
        let second = world.add_car(Vector2::new(0.0, 200.0), CarType::Sedan).unwrap();
        let first_root = world.car(first).unwrap().root().id;
        let second_root = world.car(second).unwrap().root().id;

        let World { cars, obstacles, .. } = &mut world;
        let (x, y) = pair_mut(
            cars,
            obstacles,
            PartLoc::Car { car: 1, part: 0 },
            PartLoc::Car { car: 0, part: 0 },
        )
        .unwrap();
        assert_eq!(x.id, second_root);
        assert_eq!(y.id, first_root);
    }

    #[test]
    fn test_ai_chases_nearest() {
        let mut world = World::with_seed(PhysicsSettings::default(), 3);
        let spec = CarType::Buggy.spec();
        let ai = world
            .add_car_with(Vector2::ZERO, 0.0, spec, CarRole::Ai(Default::default()))
            .unwrap();
        world.add_car(Vector2::new(0.0, 300.0), CarType::Sedan).unwrap();
        world.add_car(Vector2::new(0.0, -100.0), CarType::Sedan).unwrap();

        world.drive_ai();
        let controls = world.car(ai).unwrap().controls;
        // Nearest target is below: turn clockwise
        assert!(controls.steering < 0.0);
        assert!(controls.throttle > 0.0);
    }

    #[test]
    fn test_snapshot_reports_outline_and_state() {
        let mut world = World::default();
        world.add_obstacle(square_at(0.0, 0.0, 5.0), Material::concrete(), true).unwrap();
        let snap = world.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].hull.len(), 4);
        assert_eq!(snap[0].outline.len(), 8);
        assert!(!snap[0].broken);
        assert_eq!(snap[0].damage_percent, 0.0);
    }
}
