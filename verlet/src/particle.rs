//! Point masses.
//!
//! Velocity is not stored: a particle carries its position and the position
//! it had before the last integration step, and the difference between the
//! two is the implicit per-frame velocity. Anything that should change a
//! particle's velocity does so by shifting `old_pos`, and anything that
//! should displace it without a velocity kick shifts both.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::vector::Vector;

/// Mass below this is clamped up so the inverse stays finite.
pub const MIN_MASS: f64 = 1e-5;

new_key_type! {
    /// Stable handle to a particle in a [`World`](crate::World) arena.
    ///
    /// Handles stay valid (as in: safe to query) after the particle dies and
    /// is reaped; the world reports such handles as dead.
    pub struct ParticleKey;
}

#[derive(Clone)]
pub struct Particle<V: Vector> {
    pos: V,
    old_pos: V,
    mass: f64,
    inv_mass: f64,
    drag: f64,
    bounce: f64,
    radius: f64,
    fixed: bool,
    collision_enabled: bool,
    passive_collision: bool,
    dead: bool,
    collision_plane: u32,
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<V: Vector> Particle<V> {
    pub fn new(pos: V, mass: f64, drag: f64) -> Self {
        let mut particle = Self {
            pos,
            old_pos: pos,
            mass: 1.0,
            inv_mass: 1.0,
            drag,
            bounce: 1.0,
            radius: 15.0,
            fixed: false,
            collision_enabled: true,
            passive_collision: false,
            dead: false,
            collision_plane: u32::MAX,
            data: None,
        };
        particle.set_mass(mass);
        particle
    }

    /// Clamps to [`MIN_MASS`] and refreshes the cached inverse.
    pub fn set_mass(&mut self, mass: f64) -> &mut Self {
        self.mass = mass.max(MIN_MASS);
        self.inv_mass = 1.0 / self.mass;
        self
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inv_mass(&self) -> f64 {
        self.inv_mass
    }

    /// Per-particle drag, composed multiplicatively with the world drag.
    pub fn set_drag(&mut self, drag: f64) -> &mut Self {
        self.drag = drag;
        self
    }

    pub fn drag(&self) -> f64 {
        self.drag
    }

    pub fn set_bounce(&mut self, bounce: f64) -> &mut Self {
        self.bounce = bounce;
        self
    }

    pub fn bounce(&self) -> f64 {
        self.bounce
    }

    pub fn set_radius(&mut self, radius: f64) -> &mut Self {
        self.radius = radius;
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn enable_collision(&mut self) -> &mut Self {
        self.collision_enabled = true;
        self
    }

    pub fn disable_collision(&mut self) -> &mut Self {
        self.collision_enabled = false;
        self
    }

    pub fn has_collision(&self) -> bool {
        self.collision_enabled
    }

    /// Passive particles only collide with non-passive ones.
    pub fn enable_passive_collision(&mut self) -> &mut Self {
        self.passive_collision = true;
        self
    }

    pub fn disable_passive_collision(&mut self) -> &mut Self {
        self.passive_collision = false;
        self
    }

    pub fn has_passive_collision(&self) -> bool {
        self.passive_collision
    }

    /// Two particles contact only when their planes share a bit.
    pub fn set_collision_plane(&mut self, plane: u32) -> &mut Self {
        self.collision_plane = plane;
        self
    }

    pub fn collision_plane(&self) -> u32 {
        self.collision_plane
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn is_free(&self) -> bool {
        !self.fixed
    }

    /// Freeze integration. `old_pos` is left alone so a later [`make_free`]
    /// decides what velocity (none) the particle resumes with.
    ///
    /// [`make_free`]: Particle::make_free
    pub fn make_fixed(&mut self) -> &mut Self {
        self.fixed = true;
        self
    }

    /// Unfreeze. Reseats `old_pos` on `pos`, so the particle starts at rest.
    pub fn make_free(&mut self) -> &mut Self {
        self.old_pos = self.pos;
        self.fixed = false;
        self
    }

    /// Shorthand for collision on + free.
    pub fn enable(&mut self) -> &mut Self {
        self.enable_collision();
        self.make_free();
        self
    }

    /// Shorthand for collision off + fixed.
    pub fn disable(&mut self) -> &mut Self {
        self.disable_collision();
        self.make_fixed();
        self
    }

    pub fn position(&self) -> V {
        self.pos
    }

    pub fn old_position(&self) -> V {
        self.old_pos
    }

    pub fn set_old_position(&mut self, old_pos: V) -> &mut Self {
        self.old_pos = old_pos;
        self
    }

    /// Move so `pos == target`. With `preserve_velocity` the old position is
    /// translated by the same delta; without, the displacement becomes
    /// velocity on the next step.
    pub fn move_to(&mut self, target: V, preserve_velocity: bool) -> &mut Self {
        let offset = target - self.pos;
        self.move_by(offset, preserve_velocity)
    }

    /// Relative form of [`move_to`](Particle::move_to).
    pub fn move_by(&mut self, offset: V, preserve_velocity: bool) -> &mut Self {
        self.pos += offset;
        if preserve_velocity {
            self.old_pos += offset;
        }
        self
    }

    pub fn set_velocity(&mut self, velocity: V) -> &mut Self {
        self.old_pos = self.pos - velocity;
        self
    }

    pub fn add_velocity(&mut self, velocity: V) -> &mut Self {
        self.old_pos -= velocity;
        self
    }

    pub fn velocity(&self) -> V {
        self.pos - self.old_pos
    }

    /// Logically retire the particle; the world reaps it on the next update.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Attach arbitrary shared data to the particle.
    pub fn set_data(&mut self, data: impl Any + Send + Sync) -> &mut Self {
        self.data = Some(Arc::new(data));
        self
    }

    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|data| data.downcast_ref())
    }
}

impl<V: Vector> fmt::Debug for Particle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Particle")
            .field("pos", &self.pos)
            .field("old_pos", &self.old_pos)
            .field("mass", &self.mass)
            .field("drag", &self.drag)
            .field("bounce", &self.bounce)
            .field("radius", &self.radius)
            .field("fixed", &self.fixed)
            .field("collision_enabled", &self.collision_enabled)
            .field("passive_collision", &self.passive_collision)
            .field("dead", &self.dead)
            .field("collision_plane", &format_args!("{:#x}", self.collision_plane))
            .field("data", &self.data.as_ref().map(|_| ".."))
            .finish()
    }
}
