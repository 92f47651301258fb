use std::f64::consts::TAU;

use glam::{dvec2, DVec2};

use crate::world::World;

use super::Scenario;

/// Satellites attracted to a heavy hub, kept apart by contact.
pub struct AttractionCloud {
    pub satellites: usize,
}

impl Default for AttractionCloud {
    fn default() -> Self {
        Self { satellites: 24 }
    }
}

impl Scenario for AttractionCloud {
    fn name(&self) -> &str {
        "Attraction Cloud"
    }

    fn create(&self) -> World<DVec2> {
        let mut world = World::new();
        world
            .set_drag(0.96)
            .set_world_size(dvec2(-400.0, -400.0), dvec2(400.0, 400.0))
            .set_sector_count(4)
            .enable_collision();

        let hub = world.make_particle(DVec2::ZERO, 20.0, 1.0);
        world
            .particle_mut(hub)
            .expect("just created")
            .set_radius(30.0)
            .make_fixed();

        for i in 0..self.satellites {
            let angle = TAU * i as f64 / self.satellites as f64;
            let ring = 180.0 + 60.0 * (i % 3) as f64;
            let pos = dvec2(ring * angle.cos(), ring * angle.sin());
            let key = world.make_particle(pos, 1.0, 1.0);
            world
                .particle_mut(key)
                .expect("just created")
                .set_radius(8.0)
                .set_bounce(0.8);
            world.make_attraction(hub, key, 0.002);
        }
        world
    }
}
