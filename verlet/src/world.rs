//! The simulation world: entity ownership and the per-frame pipeline.

use std::collections::HashSet;
use std::path::PathBuf;

use slotmap::SlotMap;
use tracing::{error, instrument, trace_span, warn};

use crate::constraint::{Constraint, ConstraintKey, ConstraintKind, KIND_COUNT};
use crate::params::Params;
use crate::particle::{Particle, ParticleKey};
use crate::recorder::{Recorder, RecorderError, RecorderMode};
use crate::sector::{self, Sector};
use crate::updater::ParticleUpdater;
use crate::vector::Vector;

/// Reported by the contact solver, after the contact has been resolved.
///
/// These replace in-place callbacks: they are collected during `update()`
/// and drained by the host afterwards, which is also what keeps hosts from
/// mutating entity lists mid-frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CollisionEvent<V: Vector> {
    /// `particle` contacted `other`. The impulse is the positional
    /// correction applied for this pair, oriented from `particle` towards
    /// `other`; the mirrored event carries the negated impulse.
    ParticleParticle {
        particle: ParticleKey,
        other: ParticleKey,
        impulse: V,
    },
    /// `particle` was clamped to the world bounds; the impulse is the
    /// velocity change the bounce produced.
    WorldEdge { particle: ParticleKey, impulse: V },
}

/// Owns all particles, constraints and sectors, and runs the frame pipeline:
/// integrate, constrain, clamp to bounds, bucket, resolve contacts.
///
/// Entities are created through the factory methods and addressed by the
/// returned keys. Keys stay safe to query forever; once an entity is killed
/// and reaped, lookups return `None` and the `*_is_dead` queries say so.
#[derive(Clone, Debug)]
pub struct World<V: Vector> {
    params: Params<V>,
    particles: SlotMap<ParticleKey, Particle<V>>,
    particle_order: Vec<ParticleKey>,
    constraints: SlotMap<ConstraintKey, Constraint<V>>,
    groups: [Vec<ConstraintKey>; KIND_COUNT],
    sectors: Vec<Sector>,
    sector_dims: [usize; 3],
    checked_pairs: HashSet<(ParticleKey, ParticleKey)>,
    events: Vec<CollisionEvent<V>>,
    updaters: Vec<Box<dyn ParticleUpdater<V>>>,
    recorder: Recorder,
    frame: u64,
}

impl<V: Vector> Default for World<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Vector> World<V> {
    pub fn new() -> Self {
        debug_assert!(V::DIM <= 3, "the sector grid supports up to three axes");
        Self {
            params: Params::default(),
            particles: SlotMap::with_key(),
            particle_order: Vec::new(),
            constraints: SlotMap::with_key(),
            groups: [Vec::new(), Vec::new(), Vec::new()],
            sectors: vec![Sector::default()],
            sector_dims: [1, 1, 1],
            checked_pairs: HashSet::new(),
            events: Vec::new(),
            updaters: Vec::new(),
            recorder: Recorder::default(),
            frame: 0,
        }
    }

    // ---- factories ------------------------------------------------------

    pub fn make_particle(&mut self, pos: V, mass: f64, drag: f64) -> ParticleKey {
        self.add_particle(Particle::new(pos, mass, drag))
    }

    pub fn add_particle(&mut self, particle: Particle<V>) -> ParticleKey {
        let key = self.particles.insert(particle);
        self.particle_order.push(key);
        key
    }

    /// `None` when both ends are the same particle.
    pub fn make_spring(
        &mut self,
        a: ParticleKey,
        b: ParticleKey,
        strength: f64,
        rest_length: f64,
    ) -> Option<ConstraintKey> {
        self.add_constraint(Constraint::spring(a, b, strength, rest_length))
    }

    /// `None` when both ends are the same particle.
    pub fn make_attraction(
        &mut self,
        a: ParticleKey,
        b: ParticleKey,
        strength: f64,
    ) -> Option<ConstraintKey> {
        self.add_constraint(Constraint::attraction(a, b, strength))
    }

    /// Adopt an externally built constraint into its kind's group.
    /// `None` when both ends are the same particle.
    pub fn add_constraint(&mut self, constraint: Constraint<V>) -> Option<ConstraintKey> {
        if constraint.a() == constraint.b() {
            warn!(
                kind = ?constraint.kind(),
                "constraint endpoints are the same particle, dropping it"
            );
            return None;
        }
        let group = constraint.kind().group();
        let key = self.constraints.insert(constraint);
        self.groups[group].push(key);
        Some(key)
    }

    pub fn add_updater(&mut self, updater: Box<dyn ParticleUpdater<V>>) -> &mut Self {
        self.updaters.push(updater);
        self
    }

    // ---- queries --------------------------------------------------------

    pub fn particle(&self, key: ParticleKey) -> Option<&Particle<V>> {
        self.particles.get(key)
    }

    pub fn particle_mut(&mut self, key: ParticleKey) -> Option<&mut Particle<V>> {
        self.particles.get_mut(key)
    }

    /// Key of the `index`th particle in insertion order, `None` out of range.
    pub fn particle_handle(&self, index: usize) -> Option<ParticleKey> {
        self.particle_order.get(index).copied()
    }

    pub fn particle_count(&self) -> usize {
        self.particle_order.len()
    }

    pub fn particles(&self) -> impl Iterator<Item = (ParticleKey, &Particle<V>)> + '_ {
        self.particle_order
            .iter()
            .filter_map(|&key| self.particles.get(key).map(|particle| (key, particle)))
    }

    /// True for killed particles and for handles whose particle was reaped.
    pub fn particle_is_dead(&self, key: ParticleKey) -> bool {
        self.particles.get(key).map_or(true, Particle::is_dead)
    }

    pub fn constraint(&self, key: ConstraintKey) -> Option<&Constraint<V>> {
        self.constraints.get(key)
    }

    pub fn constraint_mut(&mut self, key: ConstraintKey) -> Option<&mut Constraint<V>> {
        self.constraints.get_mut(key)
    }

    /// A constraint is dead once killed, reaped, or referencing a dead or
    /// reaped particle.
    pub fn constraint_is_dead(&self, key: ConstraintKey) -> bool {
        match self.constraints.get(key) {
            None => true,
            Some(constraint) => {
                constraint.is_killed()
                    || self
                        .particles
                        .get(constraint.a())
                        .map_or(true, Particle::is_dead)
                    || self
                        .particles
                        .get(constraint.b())
                        .map_or(true, Particle::is_dead)
            }
        }
    }

    pub fn spring_handle(&self, index: usize) -> Option<ConstraintKey> {
        self.groups[ConstraintKind::Spring.group()].get(index).copied()
    }

    pub fn attraction_handle(&self, index: usize) -> Option<ConstraintKey> {
        self.groups[ConstraintKind::Attraction.group()]
            .get(index)
            .copied()
    }

    pub fn custom_handle(&self, index: usize) -> Option<ConstraintKey> {
        self.groups[ConstraintKind::Custom.group()].get(index).copied()
    }

    pub fn spring_count(&self) -> usize {
        self.groups[ConstraintKind::Spring.group()].len()
    }

    pub fn attraction_count(&self) -> usize {
        self.groups[ConstraintKind::Attraction.group()].len()
    }

    pub fn custom_constraint_count(&self) -> usize {
        self.groups[ConstraintKind::Custom.group()].len()
    }

    pub fn constraints(
        &self,
        kind: ConstraintKind,
    ) -> impl Iterator<Item = (ConstraintKey, &Constraint<V>)> + '_ {
        self.groups[kind.group()]
            .iter()
            .filter_map(|&key| self.constraints.get(key).map(|constraint| (key, constraint)))
    }

    /// First live constraint of `kind` with `a` at either end. Linear scan.
    pub fn find_constraint(&self, a: ParticleKey, kind: ConstraintKind) -> Option<ConstraintKey> {
        self.groups[kind.group()].iter().copied().find(|&key| {
            if self.constraint_is_dead(key) {
                return false;
            }
            let constraint = &self.constraints[key];
            constraint.a() == a || constraint.b() == a
        })
    }

    /// First live constraint of `kind` joining `a` and `b`, either way
    /// around. Linear scan.
    pub fn find_constraint_between(
        &self,
        a: ParticleKey,
        b: ParticleKey,
        kind: ConstraintKind,
    ) -> Option<ConstraintKey> {
        self.groups[kind.group()].iter().copied().find(|&key| {
            if self.constraint_is_dead(key) {
                return false;
            }
            let constraint = &self.constraints[key];
            (constraint.a() == a && constraint.b() == b)
                || (constraint.a() == b && constraint.b() == a)
        })
    }

    pub fn params(&self) -> &Params<V> {
        &self.params
    }

    /// Frames simulated (or replayed) so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Contacts and edge bounces from the most recent `update()`.
    pub fn collision_events(&self) -> &[CollisionEvent<V>] {
        &self.events
    }

    pub fn take_collision_events(&mut self) -> Vec<CollisionEvent<V>> {
        std::mem::take(&mut self.events)
    }

    // ---- configuration --------------------------------------------------

    pub fn set_drag(&mut self, drag: f64) -> &mut Self {
        self.params.set_drag(drag);
        self
    }

    pub fn set_gravity(&mut self, gravity: V) -> &mut Self {
        self.params.set_gravity(gravity);
        self
    }

    /// Gravity along the Y axis only.
    pub fn set_gravity_y(&mut self, gy: f64) -> &mut Self {
        self.params.set_gravity_y(gy);
        self
    }

    pub fn set_time_step(&mut self, time_step: f64) -> &mut Self {
        self.params.set_time_step(time_step);
        self
    }

    pub fn set_num_iterations(&mut self, num_iterations: usize) -> &mut Self {
        self.params.set_num_iterations(num_iterations);
        self
    }

    pub fn set_world_min(&mut self, world_min: V) -> &mut Self {
        self.params.set_world_min(world_min);
        self
    }

    pub fn set_world_max(&mut self, world_max: V) -> &mut Self {
        self.params.set_world_max(world_max);
        self
    }

    pub fn set_world_size(&mut self, world_min: V, world_max: V) -> &mut Self {
        self.set_world_min(world_min);
        self.set_world_max(world_max)
    }

    /// Forget the bounds. Bounded collision optimizations go with them.
    pub fn clear_world_size(&mut self) -> &mut Self {
        self.params.clear_world_edges();
        self.disable_collision()
    }

    pub fn enable_collision(&mut self) -> &mut Self {
        self.params.set_collision_enabled(true);
        self
    }

    pub fn disable_collision(&mut self) -> &mut Self {
        self.params.set_collision_enabled(false);
        self
    }

    pub fn is_collision_enabled(&self) -> bool {
        self.params.is_collision_enabled()
    }

    /// Uniform sector count on every axis.
    pub fn set_sector_count(&mut self, count: usize) -> &mut Self {
        self.set_sector_counts(V::splat(count as f64))
    }

    /// Per-axis sector counts; rebuilds the grid.
    pub fn set_sector_counts(&mut self, counts: V) -> &mut Self {
        self.params.set_sector_count(counts);
        let clamped = self.params.sector_count();
        let mut dims = [1usize; 3];
        for axis in 0..V::DIM {
            dims[axis] = clamped[axis] as usize;
        }
        self.sector_dims = dims;
        self.sectors = vec![Sector::default(); dims[0] * dims[1] * dims[2]];
        self
    }

    pub fn reserve_particles(&mut self, additional: usize) -> &mut Self {
        self.particles.reserve(additional);
        self.particle_order.reserve(additional);
        self
    }

    pub fn reserve_springs(&mut self, additional: usize) -> &mut Self {
        self.groups[ConstraintKind::Spring.group()].reserve(additional);
        self
    }

    pub fn reserve_attractions(&mut self, additional: usize) -> &mut Self {
        self.groups[ConstraintKind::Attraction.group()].reserve(additional);
        self
    }

    pub fn reserve_custom_constraints(&mut self, additional: usize) -> &mut Self {
        self.groups[ConstraintKind::Custom.group()].reserve(additional);
        self
    }

    /// Drop every particle and constraint and empty the sectors; the grid
    /// dimensions and the rest of the configuration stay.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.particle_order.clear();
        self.constraints.clear();
        for group in &mut self.groups {
            group.clear();
        }
        for sector in &mut self.sectors {
            sector.clear();
        }
        self.events.clear();
        self.checked_pairs.clear();
    }

    // ---- recorder -------------------------------------------------------

    pub fn set_replay_mode(&mut self, mode: RecorderMode) -> &mut Self {
        self.recorder.set_mode(mode);
        self
    }

    pub fn replay_mode(&self) -> RecorderMode {
        self.recorder.mode()
    }

    /// Prefix for frame files; `<prefix>_<frame>.bin`.
    pub fn set_replay_filename(&mut self, prefix: impl Into<PathBuf>) -> &mut Self {
        self.recorder.set_prefix(prefix);
        self
    }

    /// Scale applied to positions on replay, so lo-res recordings can drive
    /// hi-res playback.
    pub fn set_playback_scale(&mut self, scale: f64) -> &mut Self {
        self.recorder.set_playback_scale(scale);
        self
    }

    /// Write every live particle's snapshot for `frame`. `update()` does
    /// this automatically in [`RecorderMode::Save`], logging failures; call
    /// it directly to observe them.
    pub fn save_frame(&self, frame: u64) -> Result<(), RecorderError> {
        let mut components = Vec::with_capacity(self.particle_order.len() * V::DIM);
        for &key in &self.particle_order {
            if let Some(particle) = self.particles.get(key) {
                let pos = particle.position();
                for axis in 0..V::DIM {
                    components.push(pos[axis]);
                }
            }
        }
        self.recorder.write_frame(frame, &components)
    }

    /// Restore particle positions from `frame`'s file. Particles resume at
    /// rest: their old position is reseated on the loaded position.
    pub fn load_frame(&mut self, frame: u64) -> Result<(), RecorderError> {
        let expected = self.particle_order.len();
        let components = self.recorder.read_frame(frame, V::DIM, expected)?;
        let scale = self.recorder.playback_scale();
        for (&key, snapshot) in self
            .particle_order
            .iter()
            .zip(components.chunks_exact(V::DIM))
        {
            let Some(particle) = self.particles.get_mut(key) else {
                continue;
            };
            let mut pos = V::ZERO;
            for axis in 0..V::DIM {
                pos[axis] = snapshot[axis] * scale;
            }
            particle.move_to(pos, true);
            particle.set_old_position(pos);
        }
        Ok(())
    }

    // ---- the frame pipeline ---------------------------------------------

    /// Run one frame: reap, integrate, clamp to bounds, bucket, reap
    /// constraints, relax, resolve contacts. In [`RecorderMode::Load`] the
    /// whole pipeline is bypassed and the frame comes from disk instead.
    #[instrument(level = "trace", skip_all, fields(frame = self.frame))]
    pub fn update(&mut self) {
        let frame = self.frame;
        self.frame += 1;
        self.events.clear();

        if self.recorder.mode() == RecorderMode::Load {
            if let Err(error) = self.load_frame(frame) {
                error!(frame, %error, "replay frame could not be loaded, state left as-is");
            }
            return;
        }

        self.update_particles();
        self.update_constraints();
        if self.params.is_collision_enabled() {
            self.check_all_collisions();
        }

        if self.recorder.mode() == RecorderMode::Save {
            if let Err(error) = self.save_frame(frame) {
                error!(frame, %error, "failed to record frame");
            }
        }
    }

    /// Reap dead particles, then integrate, clamp and bucket the survivors.
    #[instrument(level = "trace", skip_all)]
    fn update_particles(&mut self) {
        let particles = &mut self.particles;
        self.particle_order.retain(|&key| {
            let dead = particles.get(key).map_or(true, Particle::is_dead);
            if dead {
                particles.remove(key);
            }
            !dead
        });

        let bucket = self.params.is_collision_enabled();
        let mut updaters = std::mem::take(&mut self.updaters);
        for &key in &self.particle_order {
            let Some(particle) = self.particles.get_mut(key) else {
                continue;
            };

            if particle.is_free() {
                if self.params.do_gravity() {
                    particle.add_velocity(self.params.gravity());
                }
                let current = particle.position();
                let velocity = particle.velocity();
                let drag = self.params.drag() * particle.drag();
                particle.move_by(velocity * drag, true);
                particle.set_old_position(current);
            }

            for updater in &mut updaters {
                if particle.is_fixed() && updater.ignores_fixed() {
                    continue;
                }
                updater.update(particle);
            }

            if self.params.do_world_edges() && particle.is_free() {
                if let Some(impulse) = clamp_to_world(particle, &self.params) {
                    self.events.push(CollisionEvent::WorldEdge {
                        particle: key,
                        impulse,
                    });
                }
            }

            if bucket {
                let (lo, hi) = sector::sphere_span(
                    particle.position(),
                    particle.radius(),
                    self.params.world_min(),
                    self.params.world_max(),
                    self.sector_dims,
                );
                for c0 in lo[0]..=hi[0] {
                    for c1 in lo[1]..=hi[1] {
                        for c2 in lo[2]..=hi[2] {
                            let index = sector::flatten([c0, c1, c2], self.sector_dims);
                            self.sectors[index].add(key);
                        }
                    }
                }
            }
        }
        self.updaters = updaters;
    }

    /// Reap dead constraints, then run the relaxation sweeps.
    #[instrument(level = "trace", skip_all)]
    fn update_constraints(&mut self) {
        for group in &mut self.groups {
            let constraints = &mut self.constraints;
            let particles = &self.particles;
            group.retain(|&key| {
                let dead = match constraints.get(key) {
                    None => true,
                    Some(constraint) => {
                        constraint.is_killed()
                            || particles.get(constraint.a()).map_or(true, Particle::is_dead)
                            || particles.get(constraint.b()).map_or(true, Particle::is_dead)
                    }
                };
                if dead {
                    constraints.remove(key);
                }
                !dead
            });
        }

        for n in 0..self.params.num_iterations() {
            let span = trace_span!("iteration", n);
            let _enter = span.enter();
            for kind in ConstraintKind::ORDER {
                for &key in &self.groups[kind.group()] {
                    let Some(constraint) = self.constraints.get_mut(key) else {
                        continue;
                    };
                    let Some([a, b]) = self
                        .particles
                        .get_disjoint_mut([constraint.a(), constraint.b()])
                    else {
                        continue;
                    };
                    if constraint.should_solve(a, b) {
                        constraint.solve(a, b);
                    }
                }
            }
        }
    }

    #[instrument(level = "trace", skip_all)]
    fn check_all_collisions(&mut self) {
        self.checked_pairs.clear();
        for sector in &mut self.sectors {
            sector.resolve_contacts(&mut self.particles, &mut self.checked_pairs, &mut self.events);
            sector.clear();
        }
    }
}

/// Clamp a particle into the world box, reflecting and dampening velocity on
/// each collided axis; returns the velocity change, if any.
fn clamp_to_world<V: Vector>(particle: &mut Particle<V>, params: &Params<V>) -> Option<V> {
    let velocity = particle.velocity();
    let mut pos = particle.position();
    let mut old_pos = particle.old_position();
    let radius = particle.radius();
    let bounce = particle.bounce();
    let mut collided = false;

    for axis in 0..V::DIM {
        let min = params.world_min()[axis] + radius;
        let max = params.world_max()[axis] - radius;
        if pos[axis] < min {
            pos[axis] = min;
            old_pos[axis] = pos[axis] + velocity[axis] * bounce;
            collided = true;
        } else if pos[axis] > max {
            pos[axis] = max;
            old_pos[axis] = pos[axis] + velocity[axis] * bounce;
            collided = true;
        }
    }

    if !collided {
        return None;
    }
    particle.move_to(pos, true);
    particle.set_old_position(old_pos);
    Some(particle.velocity() - velocity)
}
