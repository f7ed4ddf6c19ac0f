//! End-to-end runs through the public `Simulation` API

use ballpit::sim::{Body, BodyId, ContactKind};
use ballpit::{ModeId, SimConfig, Simulation, TickInput};
use glam::Vec2;

const FRAME_DT: f32 = 1.0 / 60.0;

fn run(sim: &mut Simulation, input: &TickInput, frames: usize) {
    for _ in 0..frames {
        sim.advance(input, FRAME_DT);
    }
}

fn find(sim: &Simulation, id: BodyId) -> &Body {
    sim.bodies().iter().find(|b| b.id == id).expect("body")
}

/// Wide, shallow arena so the whole rain fits in a single floor layer
fn rain_sim() -> Simulation {
    let mut config = SimConfig::default();
    config.counts.gravity = 300;
    config.min_radius = 5.0;
    config.max_radius = 7.0;
    Simulation::new(config, 42, 4800.0, 400.0)
}

#[test]
fn gravity_rain_settles_and_sleeps() {
    let mut sim = rain_sim();
    assert_eq!(sim.bodies().len(), 300);
    let top = sim.arena().bounds().min.y;
    assert!(sim.bodies().iter().all(|b| b.pos.y < top));

    run(&mut sim, &TickInput::default(), 300);

    let arena = *sim.arena();
    let on_floor = sim
        .bodies()
        .iter()
        .filter(|b| b.pos.y >= arena.floor_y(b.radius) - 0.5)
        .count();
    let asleep = sim.asleep_count();
    assert!(on_floor * 100 >= 95 * 300, "only {on_floor} bodies reached the floor");
    assert!(asleep * 100 >= 90 * 300, "only {asleep} bodies asleep");
}

#[test]
fn pointer_wakes_only_nearby_sleepers() {
    let mut sim = rain_sim();
    run(&mut sim, &TickInput::default(), 300);

    let sleepers: Vec<(BodyId, Vec2)> = sim
        .bodies()
        .iter()
        .filter(|b| b.asleep)
        .map(|b| (b.id, b.pos))
        .collect();
    let (target_id, target_pos) = sleepers[sleepers.len() / 2];
    let far_id = sleepers
        .iter()
        .find(|(_, pos)| pos.distance(target_pos) > 1500.0)
        .map(|&(id, _)| id)
        .expect("a sleeper far from the pointer");

    let input = TickInput { pointer: target_pos, pointer_active: true, idle_secs: 0.0 };
    sim.advance(&input, FRAME_DT);

    assert!(!find(&sim, target_id).asleep);
    assert!(find(&sim, far_id).asleep);
}

#[test]
fn head_on_collision_keeps_restitution_and_fires_once() {
    let mut config = SimConfig::default();
    config.gravity_multiplier = 0.0;
    config.restitution = 0.69;
    let mut sim = Simulation::new(config, 7, 800.0, 600.0);

    let bodies = sim.bodies_mut();
    bodies.clear();
    bodies.push(Body::new(1, Vec2::new(370.0, 300.0), 10.0).with_velocity(Vec2::new(100.0, 0.0)));
    bodies.push(Body::new(2, Vec2::new(430.0, 300.0), 10.0).with_velocity(Vec2::new(-100.0, 0.0)));

    let mut ball_events = 0;
    for _ in 0..30 {
        sim.advance(&TickInput::default(), FRAME_DT);
        ball_events += sim.drain_contacts().filter(|c| c.kind == ContactKind::Ball).count();
        assert!(sim.contacts().is_empty());
    }

    let b = sim.bodies();
    let separation = b[1].vel.x - b[0].vel.x;
    assert!(
        (separation - 0.69 * 200.0).abs() < 0.05 * 138.0,
        "separating at {separation}"
    );
    assert!(b[1].pos.x > b[0].pos.x);
    assert_eq!(ball_events, 1);
}

#[test]
fn same_seed_same_trajectory() {
    let input = TickInput { pointer: Vec2::new(500.0, 350.0), pointer_active: true, idle_secs: 0.0 };
    let run_swarm = |seed| {
        let mut sim = Simulation::new(SimConfig::default(), seed, 1000.0, 700.0);
        sim.switch_mode(ModeId::Swarm);
        run(&mut sim, &input, 150);
        sim.bodies().iter().map(|b| b.pos).collect::<Vec<_>>()
    };

    let a = run_swarm(9);
    let b = run_swarm(9);
    assert_eq!(a, b);
    assert_ne!(a, run_swarm(10));
}

#[test]
fn every_mode_runs_and_stays_finite() {
    let input = TickInput { pointer: Vec2::new(400.0, 300.0), pointer_active: true, idle_secs: 0.0 };
    let mut sim = Simulation::new(SimConfig::default(), 3, 800.0, 600.0);
    for mode in ModeId::ALL {
        sim.switch_mode(mode);
        run(&mut sim, &input, 60);
        assert!(
            sim.bodies().iter().all(|b| b.pos.is_finite() && b.vel.is_finite()),
            "{} produced a non-finite body",
            mode.as_str()
        );
        if let Some(worms) = sim.worms() {
            assert!(worms.positions().iter().all(|p| p.is_finite()));
        }
    }
}
