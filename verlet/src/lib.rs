//! A Verlet particle-constraint engine, generic over 2-D and 3-D vectors.
//!
//! A [`World`] owns point masses and the relations between them (springs,
//! attractions, custom projections), integrates them with drag and gravity,
//! relaxes the constraints by iterative projection, bounces particles off
//! the world bounds and resolves sphere-sphere contacts through a uniform
//! sector grid. Velocity lives implicitly in the gap between a particle's
//! position and its previous position.

pub mod constraint;

pub mod params;

pub mod particle;

pub mod recorder;

pub mod scenarios;

pub mod sector;

pub mod updater;

pub mod vector;

pub mod world;

pub use constraint::{
    Attraction, Constraint, ConstraintKey, ConstraintKind, CustomConstraint, Spring,
};
pub use params::Params;
pub use particle::{Particle, ParticleKey};
pub use recorder::{RecorderError, RecorderMode};
pub use updater::ParticleUpdater;
pub use vector::Vector;
pub use world::{CollisionEvent, World};

/// A two-dimensional world.
pub type World2 = World<glam::DVec2>;

/// A three-dimensional world.
pub type World3 = World<glam::DVec3>;
