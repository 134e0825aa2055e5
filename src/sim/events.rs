//! Per-tick output for score, audio and particle consumers

use serde::{Deserialize, Serialize};

use super::car::CarHandle;
use super::part::PartId;
use crate::Vector2;

/// Who a part belongs to. Parts with the same owner never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Car(CarHandle),
    /// Standalone obstacle or wall, owned by the world
    Obstacle(PartId),
}

impl Owner {
    pub fn car(&self) -> Option<CarHandle> {
        match self {
            Owner::Car(handle) => Some(*handle),
            Owner::Obstacle(_) => None,
        }
    }
}

/// One resolved contact. Valid for the tick that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub part1_id: PartId,
    pub part2_id: PartId,
    pub owner1: Owner,
    pub owner2: Owner,
    /// Approximate contact point (world space)
    pub point: Vector2,
    /// Unit normal pointing from part 1 toward part 2
    pub normal: Vector2,
    /// Impulse magnitude applied
    pub force: f64,
    /// Closing speed along the normal before resolution
    pub relative_speed: f64,
    /// Penetration depth before correction
    pub depth: f64,
}

/// Receives everything a step produces
///
/// Only `on_collision` is required; the rest default to no-ops.
pub trait EventSink {
    fn on_collision(&mut self, record: &CollisionRecord);

    fn on_part_broken(&mut self, _part: PartId, _owner: Owner) {}

    fn on_car_wrecked(&mut self, _car: CarHandle) {}

    fn on_car_respawned(&mut self, _car: CarHandle) {}
}

impl EventSink for Vec<CollisionRecord> {
    fn on_collision(&mut self, record: &CollisionRecord) {
        self.push(record.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_collision(&mut self, record: &CollisionRecord) {
        (**self).on_collision(record);
    }

    fn on_part_broken(&mut self, part: PartId, owner: Owner) {
        (**self).on_part_broken(part, owner);
    }

    fn on_car_wrecked(&mut self, car: CarHandle) {
        (**self).on_car_wrecked(car);
    }

    fn on_car_respawned(&mut self, car: CarHandle) {
        (**self).on_car_respawned(car);
    }
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_collision(&mut self, _record: &CollisionRecord) {}
}

/// Fan out to two sinks
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn on_collision(&mut self, record: &CollisionRecord) {
        self.0.on_collision(record);
        self.1.on_collision(record);
    }

    fn on_part_broken(&mut self, part: PartId, owner: Owner) {
        self.0.on_part_broken(part, owner);
        self.1.on_part_broken(part, owner);
    }

    fn on_car_wrecked(&mut self, car: CarHandle) {
        self.0.on_car_wrecked(car);
        self.1.on_car_wrecked(car);
    }

    fn on_car_respawned(&mut self, car: CarHandle) {
        self.0.on_car_respawned(car);
        self.1.on_car_respawned(car);
    }
}
