use glam::{dvec2, DVec2};

use crate::world::World;

use super::Scenario;

const GRAVITY: DVec2 = dvec2(0.0, -0.5);
const LINK_LENGTH: f64 = 25.0;

/// A chain of springs hanging from a fixed anchor.
pub struct SpringChain {
    pub links: usize,
}

impl Default for SpringChain {
    fn default() -> Self {
        Self { links: 12 }
    }
}

impl Scenario for SpringChain {
    fn name(&self) -> &str {
        "Spring Chain"
    }

    fn create(&self) -> World<DVec2> {
        let mut world = World::new();
        world
            .set_gravity(GRAVITY)
            .set_world_size(dvec2(-400.0, -400.0), dvec2(400.0, 400.0));

        let anchor = world.make_particle(dvec2(0.0, 350.0), 1.0, 1.0);
        world
            .particle_mut(anchor)
            .expect("just created")
            .set_radius(6.0)
            .make_fixed();

        let mut previous = anchor;
        for link in 1..=self.links {
            // lay the chain out sideways so gravity makes it swing
            let pos = dvec2(LINK_LENGTH * link as f64, 350.0);
            let key = world.make_particle(pos, 1.0, 1.0);
            world
                .particle_mut(key)
                .expect("just created")
                .set_radius(4.0)
                .set_bounce(0.5);
            world.make_spring(previous, key, 0.9, LINK_LENGTH);
            previous = key;
        }
        world
    }
}
