//! World step
//!
//! One call integrates every movable part, tests every pair of parts with
//! different owners, resolves each contact in order, then updates damage and
//! wrecks. Later pairs see the velocity changes made by earlier pairs in the
//! same step.

use super::collision::{resolve, sat_collision};
use super::events::{CollisionRecord, EventSink};
use super::world::{World, pair_mut};

/// Advance the world by `dt` seconds (clamped to `settings.max_dt`)
pub fn step<S: EventSink + ?Sized>(world: &mut World, dt: f64, sink: &mut S) {
    let dt_used = world.settings.effective_dt(dt);
    if dt_used != dt {
        log::warn!("Step dt {} clamped to {}", dt, dt_used);
    }
    world.time_ticks += 1;
    log::trace!(
        "Tick {}: dt={:.4}, {} parts",
        world.time_ticks,
        dt_used,
        world.part_count()
    );

    integrate(world, dt_used);
    collide(world, sink);
    finish_damage(world, sink);
}

/// Step 1: move everything that can move
fn integrate(world: &mut World, dt: f64) {
    let gravity = world.settings.gravity;
    for car in &mut world.cars {
        car.update_physics(dt, gravity);
    }
    for part in &mut world.obstacles {
        part.update_physics(dt, gravity);
    }
}

/// Steps 2 and 3: pairwise SAT, then resolve each contact
fn collide<S: EventSink + ?Sized>(world: &mut World, sink: &mut S) {
    let locs = world.part_locations();
    let World {
        cars,
        obstacles,
        rng,
        settings,
        ..
    } = world;

    for i in 0..locs.len() {
        for j in (i + 1)..locs.len() {
            let (loc_a, owner_a) = locs[i];
            let (loc_b, owner_b) = locs[j];
            if owner_a == owner_b {
                continue;
            }

            let Some((a, b)) = pair_mut(cars, obstacles, loc_a, loc_b) else {
                continue;
            };
            // Broken parts are debris: drawn but not simulated
            if a.is_broken() || b.is_broken() {
                continue;
            }
            if a.is_fixed() && b.is_fixed() {
                continue;
            }

            let reach = a.bounding_radius() + b.bounding_radius();
            if a.position.distance_squared(b.position) > reach * reach {
                continue;
            }

            let Some(contact) = sat_collision(&a.world_vertices(), &b.world_vertices()) else {
                continue;
            };

            let Some(res) = resolve(a, b, &contact, settings, rng) else {
                continue;
            };
            if res.impulse <= 0.0 {
                continue;
            }

            let record = CollisionRecord {
                part1_id: a.id,
                part2_id: b.id,
                owner1: owner_a,
                owner2: owner_b,
                point: contact.point,
                normal: contact.normal,
                force: res.impulse,
                relative_speed: res.relative_speed,
                depth: contact.depth,
            };
            log::debug!(
                "Collision {} ({}) <-> {} ({}): force {:.2}, speed {:.2}",
                a.id.0,
                a.name,
                b.id.0,
                b.name,
                record.force,
                record.relative_speed
            );

            if a.is_broken() {
                sink.on_part_broken(a.id, owner_a);
            }
            if b.is_broken() {
                sink.on_part_broken(b.id, owner_b);
            }
            sink.on_collision(&record);
        }
    }
}

/// Step 4: damage percentages, wrecks and respawns
fn finish_damage<S: EventSink + ?Sized>(world: &mut World, sink: &mut S) {
    let respawn = world.settings.respawn_wrecked;
    for car in &mut world.cars {
        car.refresh_damage();
        if !car.take_wreck_report() {
            continue;
        }

        log::info!(
            "Car {} wrecked (total damage {:.0}%)",
            car.handle.0,
            car.get_total_damage()
        );
        sink.on_car_wrecked(car.handle);

        if respawn {
            match car.respawned() {
                Ok(fresh) => {
                    *car = fresh;
                    log::info!("Car {} respawned", car.handle.0);
                    sink.on_car_respawned(car.handle);
                }
                Err(e) => log::warn!("Car {} could not respawn: {}", car.handle.0, e),
            }
        }
    }
}
