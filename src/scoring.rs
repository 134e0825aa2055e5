//! Crash scoring
//!
//! Turns the collision stream into crash counts and a score. Only contacts
//! closing faster than the crash threshold count; scrapes and nudges don't.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::PhysicsSettings;
use crate::consts::*;
use crate::sim::{CarHandle, CollisionRecord, EventSink, Owner, PartId};

/// Crash stats for one car
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarCrashStats {
    pub crashes: u32,
    /// Largest impulse this car was part of
    pub worst_impact: f64,
    pub parts_lost: u32,
    pub wrecks: u32,
}

/// Running crash totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashTally {
    /// Closing speed above which a collision counts
    pub threshold: f64,
    pub total_crashes: u32,
    pub score: u64,
    pub per_car: BTreeMap<CarHandle, CarCrashStats>,
}

impl Default for CrashTally {
    fn default() -> Self {
        Self::new(CRASH_THRESHOLD)
    }
}

impl From<&PhysicsSettings> for CrashTally {
    fn from(settings: &PhysicsSettings) -> Self {
        Self::new(settings.crash_threshold)
    }
}

impl CrashTally {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            total_crashes: 0,
            score: 0,
            per_car: BTreeMap::new(),
        }
    }

    /// Stats for one car (zeros if it never crashed)
    pub fn car(&self, handle: CarHandle) -> CarCrashStats {
        self.per_car.get(&handle).cloned().unwrap_or_default()
    }

    /// Points for a crash at this closing speed
    pub fn points_for(relative_speed: f64) -> u64 {
        (relative_speed * CRASH_SCORE_FACTOR).floor().max(0.0) as u64
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.threshold);
    }
}

impl EventSink for CrashTally {
    fn on_collision(&mut self, record: &CollisionRecord) {
        if record.relative_speed <= self.threshold {
            return;
        }

        self.total_crashes += 1;
        self.score += Self::points_for(record.relative_speed);

        for owner in [record.owner1, record.owner2] {
            if let Some(handle) = owner.car() {
                let stats = self.per_car.entry(handle).or_default();
                stats.crashes += 1;
                stats.worst_impact = stats.worst_impact.max(record.force);
            }
        }
    }

    fn on_part_broken(&mut self, _part: PartId, owner: Owner) {
        if let Some(handle) = owner.car() {
            self.per_car.entry(handle).or_default().parts_lost += 1;
        }
    }

    fn on_car_wrecked(&mut self, car: CarHandle) {
        self.per_car.entry(car).or_default().wrecks += 1;
    }
}
