//! Sleep/wake energy state machine
//!
//! A body resting on the floor, slow in both linear and angular speed for a
//! continuous `time_to_sleep`, falls asleep and is skipped by integration.
//! Pointer proximity, an awake colliding neighbour or a wall touch wakes it.

use glam::Vec2;

use super::body::Body;
use super::boundary::Arena;
use crate::settings::SleepConfig;

/// Guards the rest timer against float accumulation error
const TIMER_EPSILON: f32 = 1e-4;

/// Accumulate rest time and put the body to sleep when it is earned.
///
/// Returns true when the body fell asleep on this call.
pub fn update_sleep(body: &mut Body, arena: &Arena, config: &SleepConfig, dt: f32) -> bool {
    if body.asleep {
        return false;
    }
    let on_floor = body.pos.y + body.radius >= arena.bounds().max.y - config.floor_tolerance;
    let resting = on_floor
        && body.vel.length_squared() < config.velocity_threshold * config.velocity_threshold
        && body.angular_vel.abs() < config.angular_threshold;

    if !resting {
        body.sleep_timer = 0.0;
        return false;
    }

    body.sleep_timer += dt;
    if body.sleep_timer + TIMER_EPSILON >= config.time_to_sleep {
        body.fall_asleep();
        return true;
    }
    false
}

/// Wake every sleeper within the wake radius of `pointer`
pub fn wake_near(bodies: &mut [Body], pointer: Vec2, wake_radius: f32) -> usize {
    let mut woken = 0;
    for body in bodies.iter_mut().filter(|b| b.asleep) {
        let reach = wake_radius + body.radius;
        if body.pos.distance_squared(pointer) <= reach * reach {
            body.wake();
            woken += 1;
        }
    }
    woken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WallConfig;

    fn resting_body(arena: &Arena) -> Body {
        Body::new(1, Vec2::new(400.0, arena.floor_y(10.0)), 10.0)
    }

    #[test]
    fn test_sleeps_after_continuous_rest() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let config = SleepConfig::default();
        let mut body = resting_body(&arena);
        let dt = 1.0 / 120.0;
        for _ in 0..59 {
            assert!(!update_sleep(&mut body, &arena, &config, dt));
        }
        assert!(update_sleep(&mut body, &arena, &config, dt));
        assert!(body.asleep);
    }

    #[test]
    fn test_interruption_resets_timer() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let config = SleepConfig::default();
        let mut body = resting_body(&arena);
        let dt = 1.0 / 120.0;
        for _ in 0..50 {
            update_sleep(&mut body, &arena, &config, dt);
        }
        body.angular_vel = 5.0;
        update_sleep(&mut body, &arena, &config, dt);
        assert_eq!(body.sleep_timer, 0.0);
        body.angular_vel = 0.0;
        for _ in 0..59 {
            update_sleep(&mut body, &arena, &config, dt);
        }
        assert!(!body.asleep);
    }

    #[test]
    fn test_airborne_body_never_sleeps() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let config = SleepConfig::default();
        let mut body = Body::new(1, Vec2::new(400.0, 300.0), 10.0);
        for _ in 0..500 {
            update_sleep(&mut body, &arena, &config, 1.0 / 120.0);
        }
        assert!(!body.asleep);
    }

    #[test]
    fn test_pointer_wakes_within_radius() {
        let arena = Arena::new(800.0, 600.0, &WallConfig::default());
        let mut bodies = vec![resting_body(&arena), resting_body(&arena)];
        bodies[1].pos.x = 100.0;
        for b in &mut bodies {
            b.fall_asleep();
        }
        let woken = wake_near(&mut bodies, Vec2::new(400.0, 500.0), 120.0);
        assert_eq!(woken, 1);
        assert!(!bodies[0].asleep);
        assert!(bodies[1].asleep);
    }
}
