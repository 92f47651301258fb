use std::f64::consts::TAU;

use glam::{dvec2, DVec2};

use crate::world::World;

use super::Scenario;

const BOX_HALF: f64 = 400.0;

/// A lattice of particles thrown around a closed box with contacts on.
/// Placement and velocities are deterministic, which keeps benchmark runs
/// comparable.
pub struct CollisionBox {
    pub particles: usize,
}

impl Default for CollisionBox {
    fn default() -> Self {
        Self { particles: 128 }
    }
}

impl Scenario for CollisionBox {
    fn name(&self) -> &str {
        "Collision Box"
    }

    fn create(&self) -> World<DVec2> {
        let mut world = World::new();
        world
            .set_drag(1.0)
            .set_world_size(dvec2(-BOX_HALF, -BOX_HALF), dvec2(BOX_HALF, BOX_HALF))
            .set_sector_count(8)
            .enable_collision();
        world.reserve_particles(self.particles);

        let side = (self.particles as f64).sqrt().ceil() as usize;
        let spacing = 2.0 * (BOX_HALF - 40.0) / side as f64;
        for i in 0..self.particles {
            let row = i / side;
            let col = i % side;
            let pos = dvec2(
                -BOX_HALF + 40.0 + spacing * (col as f64 + 0.5),
                -BOX_HALF + 40.0 + spacing * (row as f64 + 0.5),
            );
            let key = world.make_particle(pos, 1.0 + (i % 4) as f64, 1.0);

            let angle = TAU * (i as f64 * 0.6180339887498949).fract();
            let speed = 2.0 + (i % 7) as f64;
            world
                .particle_mut(key)
                .expect("just created")
                .set_radius(6.0 + (i % 3) as f64 * 3.0)
                .set_bounce(0.9)
                .set_velocity(dvec2(speed * angle.cos(), speed * angle.sin()));
        }
        world
    }
}
