//! Canned worlds for demos, benchmarks and quick experiments.

use glam::DVec2;

use crate::world::World;

pub mod attraction_cloud;
pub mod collision_box;
pub mod gravity_fall;
pub mod spring_chain;

pub use attraction_cloud::*;
pub use collision_box::*;
pub use gravity_fall::*;
pub use spring_chain::*;

pub trait Scenario {
    fn name(&self) -> &str;

    fn create(&self) -> World<DVec2>;

    fn update(&self, _world: &mut World<DVec2>) {}
}
