//! Deterministic simulation module
//!
//! All physics lives here. This module must stay deterministic:
//! - Stable iteration order (cars by insertion, then obstacles)
//! - Seeded RNG only, and only for cosmetic cracks and AI jitter
//! - No rendering or platform dependencies

pub mod car;
pub mod collision;
pub mod damage;
pub mod events;
pub mod material;
pub mod part;
pub mod tick;
pub mod world;

pub use car::{AdvancedCar, AiParams, CarHandle, CarRole, CarSpec, CarType, ControlInput, PartTemplate};
pub use collision::{Contact, Resolution, overlap_on_axis, project, resolve, sat_collision};
pub use damage::{CrackPoint, DamageZone, DeformParams};
pub use events::{CollisionRecord, EventSink, NullSink, Owner};
pub use material::Material;
pub use part::{CarPart, PartId, PartKind, polygon_area, rect, validate_polygon};
pub use tick::step;
pub use world::{PartSnapshot, World};
