//! Whole-world crash scenarios

use crumple::sim::{CarHandle, CarRole, CarSpec, CarType, CollisionRecord, DeformParams, Material, Owner, World, rect};
use crumple::{CrashTally, PhysicsSettings, Vector2};
use rand::SeedableRng;
use rand_pcg::Pcg32;

const DT: f64 = 1.0 / 60.0;

fn box_spec(material: Material) -> CarSpec {
    CarSpec::single_body("box", rect(30.0, 16.0), material, 80.0)
}

fn add_box(world: &mut World, x: f64, vx: f64, material: Material) -> CarHandle {
    let handle = world
        .add_car_with(Vector2::new(x, 0.0), 0.0, box_spec(material), CarRole::Player)
        .unwrap();
    world.car_mut(handle).unwrap().root_mut().velocity = Vector2::new(vx, 0.0);
    handle
}

fn square(center: Vector2, half: f64) -> Vec<Vector2> {
    vec![
        center + Vector2::new(-half, -half),
        center + Vector2::new(half, -half),
        center + Vector2::new(half, half),
        center + Vector2::new(-half, half),
    ]
}

#[test]
fn test_head_on_bounce() {
    let bouncy_steel = Material::new(7.8, 0.2, 0.3, 40.0, 0.8);
    let mut world = World::default();
    let a = add_box(&mut world, 0.0, 5.0, bouncy_steel);
    let b = add_box(&mut world, 20.0, -5.0, bouncy_steel);

    let records = world.step(DT).to_vec();
    assert_eq!(records.len(), 1);
    let hit = &records[0];
    assert!(hit.force > 0.0);
    assert_eq!(hit.owner1, Owner::Car(a));
    assert_eq!(hit.owner2, Owner::Car(b));
    assert!((hit.normal - Vector2::X).length() < 1e-9);
    assert!(hit.relative_speed > 9.0 && hit.relative_speed <= 10.0);

    let va = world.car(a).unwrap().velocity().x;
    let vb = world.car(b).unwrap().velocity().x;
    assert!(va < 0.0 && va.abs() < 5.0);
    assert!(vb > 0.0 && vb.abs() < 5.0);
    // Equal masses, equal speeds: a symmetric bounce
    assert!((va + vb).abs() < 1e-9);

    for handle in [a, b] {
        let car = world.car(handle).unwrap();
        assert!(car.part_damage()["chassis"] > 0.0);
        assert!(!car.is_wrecked());
    }
}

#[test]
fn test_no_second_hit_after_bounce() {
    let mut world = World::default();
    add_box(&mut world, 0.0, 5.0, Material::steel());
    add_box(&mut world, 20.0, -5.0, Material::steel());

    assert_eq!(world.step(DT).len(), 1);
    for _ in 0..30 {
        assert!(world.step(DT).is_empty());
    }
}

#[test]
fn test_momentum_conserved_without_friction() {
    let slick = Material::new(7.8, 0.5, 0.0, 40.0, 0.8);
    let mut world = World::default();
    let a = add_box(&mut world, 0.0, 8.0, slick);
    let b = add_box(&mut world, 25.0, -2.0, slick);
    let momentum = |w: &World| w.car(a).unwrap().velocity() * 80.0 + w.car(b).unwrap().velocity() * 80.0;

    let before = momentum(&world);
    for _ in 0..20 {
        world.step(DT);
    }
    let after = momentum(&world);
    assert!((after - before).length() < 1e-6);
}

#[test]
fn test_wall_never_moves() {
    let mut world = World::default();
    let car = world.add_car(Vector2::ZERO, CarType::Sedan).unwrap();
    let wall = world
        .add_obstacle(square(Vector2::new(50.0, 0.0), 10.0), Material::concrete(), true)
        .unwrap();
    let wall_position = world.obstacle(wall).unwrap().position;

    let mut records: Vec<CollisionRecord> = Vec::new();
    for _ in 0..240 {
        world.apply_control(car, 1.0, 0.0, 0.0);
        world.step_with_sink(DT, &mut records);
    }

    assert!(records.iter().any(|r| r.owner2 == Owner::Obstacle(wall)));
    let wall_part = world.obstacle(wall).unwrap();
    assert_eq!(wall_part.position, wall_position);
    assert_eq!(wall_part.velocity, Vector2::ZERO);
    assert_eq!(wall_part.angle, 0.0);

    let sedan = world.car(car).unwrap();
    assert!(sedan.position().x < 40.0);
    assert!(sedan.part_damage()["bumper_front"] > 0.0);
    assert_eq!(sedan.part_damage()["bumper_rear"], 0.0);
}

#[test]
fn test_resting_overlap_separates_without_record() {
    let mut world = World::default();
    let a = add_box(&mut world, 0.0, 0.0, Material::steel());
    let b = add_box(&mut world, 29.99, 0.0, Material::steel());

    assert!(world.step(DT).is_empty());
    let gap = world.car(b).unwrap().position().x - world.car(a).unwrap().position().x;
    assert!(gap >= 30.0 - 1e-9);
    assert_eq!(world.car(a).unwrap().get_total_damage(), 0.0);
    assert_eq!(world.car(b).unwrap().get_total_damage(), 0.0);
}

#[test]
fn test_separating_graze_leaves_velocities_alone() {
    let slick = Material::new(7.8, 0.2, 0.0, 40.0, 0.8);
    let mut world = World::default();
    // Overlap 0.01, drifting apart slowly enough to still overlap after integrating
    let a = add_box(&mut world, 0.0, -0.1, slick);
    let b = add_box(&mut world, 29.99, 0.1, slick);

    assert!(world.step(DT).is_empty());
    assert_eq!(world.car(a).unwrap().velocity(), Vector2::new(-0.1, 0.0));
    assert_eq!(world.car(b).unwrap().velocity(), Vector2::new(0.1, 0.0));
    assert_eq!(world.car(a).unwrap().get_total_damage(), 0.0);
    assert_eq!(world.car(b).unwrap().get_total_damage(), 0.0);
}

#[test]
fn test_crash_tally_counts_hard_hits() {
    let mut world = World::default();
    let a = add_box(&mut world, 0.0, 5.0, Material::steel());
    add_box(&mut world, 20.0, -5.0, Material::steel());

    let mut tally = CrashTally::from(&world.settings);
    world.step_with_sink(DT, &mut tally);
    assert_eq!(tally.total_crashes, 1);
    assert!(tally.score >= 45);
    assert_eq!(tally.car(a).crashes, 1);
}

#[test]
fn test_same_seed_same_wreckage() {
    let run = || {
        let mut world = World::with_seed(PhysicsSettings::default(), 42);
        let player = world.add_car(Vector2::new(-80.0, 0.0), CarType::Sports).unwrap();
        world
            .add_car_with(Vector2::new(80.0, 5.0), 180.0, CarType::Truck.spec(), CarRole::Ai(Default::default()))
            .unwrap();
        world
            .add_obstacle(square(Vector2::new(0.0, 60.0), 8.0), Material::wood(), false)
            .unwrap();
        for _ in 0..300 {
            world.drive_ai();
            world.apply_control(player, 1.0, 0.0, 0.1);
            world.step(DT);
        }
        world.snapshot()
    };

    assert_eq!(run(), run());
}

#[test]
fn test_broken_part_is_inert() {
    let mut world = World::with_seed(PhysicsSettings::default(), 7);
    let car = add_box(&mut world, 0.0, 0.0, Material::glass());
    let mut rng = Pcg32::seed_from_u64(1);
    let params = DeformParams::default();

    let root = world.car_mut(car).unwrap().root_mut();
    while !root.is_broken() {
        root.deform(Vector2::new(15.0, 0.0), Vector2::new(-2e3, 0.0), &params, &mut rng);
    }
    let outline = root.deformed_outline();
    let moved = root.deform(Vector2::new(-15.0, 0.0), Vector2::new(2e3, 0.0), &params, &mut rng);
    assert_eq!(moved, 0.0);
    assert_eq!(root.deformed_outline(), outline);

    root.apply_impulse(Vector2::new(1e4, 0.0), root.position);
    assert_eq!(root.velocity, Vector2::ZERO);
}

#[test]
fn test_settings_round_trip_through_json() {
    let settings = PhysicsSettings {
        max_impulse: Some(250.0),
        respawn_wrecked: false,
        ..PhysicsSettings::default()
    };
    let json = settings.to_json().unwrap();
    assert_eq!(PhysicsSettings::from_json(&json).unwrap(), settings);
}
