use glam::{dvec2, DVec2};

use crate::world::World;

use super::Scenario;

const GRAVITY: DVec2 = dvec2(0.0, -0.4);

/// A row of balls with different per-particle drags dropped in a box.
pub struct GravityFall {}

impl Scenario for GravityFall {
    fn name(&self) -> &str {
        "Gravity Fall"
    }

    fn create(&self) -> World<DVec2> {
        let mut world = World::new();
        world
            .set_gravity(GRAVITY)
            .set_world_size(dvec2(-300.0, -300.0), dvec2(300.0, 300.0));

        for i in 0..8 {
            let x = -210.0 + 60.0 * i as f64;
            let drag = 0.9 + 0.1 * (i as f64 / 7.0);
            let key = world.make_particle(dvec2(x, 250.0), 1.0, drag);
            world
                .particle_mut(key)
                .expect("just created")
                .set_radius(10.0)
                .set_bounce(0.7);
        }
        world
    }
}
