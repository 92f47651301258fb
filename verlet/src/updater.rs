//! Per-particle update plug-ins.

use std::fmt;

use crate::particle::Particle;
use crate::vector::Vector;

/// Runs once per particle per integration step, right after the Verlet move.
///
/// An updater may push its target around (`move_by`, `add_velocity`, ...)
/// but only ever sees the one particle, so it cannot add or remove entities
/// mid-frame. Force fields, lifetime bookkeeping and similar per-particle
/// behaviors hang off this.
pub trait ParticleUpdater<V: Vector>: fmt::Debug + dyn_clone::DynClone {
    fn update(&mut self, particle: &mut Particle<V>);

    /// Skip particles that are pinned down. Most updaters want this.
    fn ignores_fixed(&self) -> bool {
        true
    }
}

impl<V: Vector> Clone for Box<dyn ParticleUpdater<V>> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}
