//! Crumple entry point
//!
//! Headless demo: a player sedan, an AI truck and a concrete wall. Runs a
//! fixed number of ticks and logs crashes and damage.
//!
//! Usage: `crumple [settings.json] [ticks]`

use crumple::sim::{CarRole, CarType, CollisionRecord, Material, World};
use crumple::{CrashTally, PhysicsSettings, Vector2};

const DT: f64 = 1.0 / 60.0;
const DEFAULT_TICKS: u64 = 600;
const SEED: u64 = 0x00C0_FFEE;

fn main() {
    env_logger::init();
    log::info!("Crumple (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => PhysicsSettings::load_or_default(path),
        None => PhysicsSettings::default(),
    };
    let ticks = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    let mut tally = CrashTally::from(&settings);
    let mut world = World::with_seed(settings, SEED);

    let player = match world.add_car(Vector2::new(-150.0, 0.0), CarType::Sedan) {
        Ok(handle) => handle,
        Err(e) => {
            log::error!("Could not build player car: {}", e);
            return;
        }
    };
    let ai_spec = CarType::Truck.spec();
    if let Err(e) = world.add_car_with(Vector2::new(150.0, 10.0), 180.0, ai_spec, CarRole::Ai(Default::default())) {
        log::error!("Could not build AI car: {}", e);
        return;
    }
    let wall = vec![
        Vector2::new(-10.0, 120.0),
        Vector2::new(10.0, 120.0),
        Vector2::new(10.0, 220.0),
        Vector2::new(-10.0, 220.0),
    ];
    if let Err(e) = world.add_obstacle(wall, Material::concrete(), true) {
        log::error!("Could not build wall: {}", e);
        return;
    }

    log::info!("World ready with {} parts, seed {:#x}", world.part_count(), SEED);

    for _ in 0..ticks {
        world.drive_ai();
        world.apply_control(player, 1.0, 0.0, 0.0);

        let mut sink = (Vec::<CollisionRecord>::new(), &mut tally);
        world.step_with_sink(DT, &mut sink);
        let (records, _) = sink;

        for record in &records {
            if record.relative_speed > tally.threshold {
                log::info!(
                    "Tick {}: crash between parts {} and {} at ({:.1}, {:.1}), force {:.1}",
                    world.time_ticks,
                    record.part1_id.0,
                    record.part2_id.0,
                    record.point.x,
                    record.point.y,
                    record.force
                );
            }
        }
    }

    for car in world.cars() {
        log::info!(
            "Car {} ({}): total damage {:.1}%",
            car.handle.0,
            car.spec.name,
            car.get_total_damage()
        );
        for (part, damage) in car.part_damage() {
            if *damage > 0.0 {
                log::debug!("  {}: {:.1}%", part, damage);
            }
        }
    }

    println!(
        "{} ticks, {} crashes, score {}",
        world.time_ticks, tally.total_crashes, tally.score
    );
}
