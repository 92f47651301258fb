//! Broad-phase buckets.
//!
//! The world is cut into a uniform grid of sectors; every frame each live
//! particle is dropped into the sectors its bounding sphere overlaps, and
//! each sector runs the sphere-sphere contact rule over its own pairs. A
//! pair that shares more than one sector is resolved only once per frame,
//! tracked through a seen-pair set owned by the world.

use std::collections::HashSet;

use itertools::Itertools as _;
use slotmap::SlotMap;

use crate::particle::{Particle, ParticleKey};
use crate::vector::Vector;
use crate::world::CollisionEvent;

/// One bucket of the grid. Holds per-frame references only; contents never
/// outlive the frame.
#[derive(Clone, Debug, Default)]
pub struct Sector {
    members: Vec<ParticleKey>,
}

impl Sector {
    pub(crate) fn add(&mut self, key: ParticleKey) {
        self.members.push(key);
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sphere-sphere contact over all unordered member pairs.
    pub(crate) fn resolve_contacts<V: Vector>(
        &self,
        particles: &mut SlotMap<ParticleKey, Particle<V>>,
        checked: &mut HashSet<(ParticleKey, ParticleKey)>,
        events: &mut Vec<CollisionEvent<V>>,
    ) {
        for (&key_a, &key_b) in self.members.iter().tuple_combinations() {
            let pair = if key_a < key_b {
                (key_a, key_b)
            } else {
                (key_b, key_a)
            };
            if !checked.insert(pair) {
                continue;
            }
            let Some([a, b]) = particles.get_disjoint_mut([key_a, key_b]) else {
                continue;
            };
            if let Some(impulse) = contact(a, b) {
                events.push(CollisionEvent::ParticleParticle {
                    particle: key_a,
                    other: key_b,
                    impulse,
                });
                events.push(CollisionEvent::ParticleParticle {
                    particle: key_b,
                    other: key_a,
                    impulse: -impulse,
                });
            }
        }
    }
}

/// Resolve overlap between two spheres; returns the impulse applied along
/// `b - a`, or `None` when the pair does not contact.
fn contact<V: Vector>(a: &mut Particle<V>, b: &mut Particle<V>) -> Option<V> {
    if !a.has_collision() || !b.has_collision() {
        return None;
    }
    if a.has_passive_collision() && b.has_passive_collision() {
        return None;
    }
    if a.collision_plane() & b.collision_plane() == 0 {
        return None;
    }

    let rest = a.radius() + b.radius();
    let delta = b.position() - a.position();
    let length_squared = delta.length_squared();
    if length_squared >= rest * rest {
        return None;
    }

    let length = length_squared.sqrt();
    let inv_mass_sum = a.inv_mass() + b.inv_mass();
    if length == 0.0 || inv_mass_sum == 0.0 {
        return None;
    }
    let force = (length - rest) / (length * inv_mass_sum);
    let impulse = delta * force;
    if a.is_free() {
        a.move_by(impulse * a.inv_mass(), false);
    }
    if b.is_free() {
        b.move_by(impulse * -b.inv_mass(), false);
    }
    Some(impulse)
}

/// Map a coordinate onto a cell: `min` lands on 0, `max` on `count - 1`,
/// everything clamped. A degenerate extent collapses to cell 0.
pub(crate) fn cell(value: f64, min: f64, max: f64, count: usize) -> usize {
    if count <= 1 || max <= min {
        return 0;
    }
    let last = (count - 1) as f64;
    let scaled = (value - min) / (max - min) * last;
    scaled.clamp(0.0, last) as usize
}

/// Row-major flattening; unused axes carry dimension 1.
pub(crate) fn flatten(cell: [usize; 3], dims: [usize; 3]) -> usize {
    (cell[0] * dims[1] + cell[1]) * dims[2] + cell[2]
}

/// The inclusive cell ranges a bounding sphere overlaps, per axis.
pub(crate) fn sphere_span<V: Vector>(
    pos: V,
    radius: f64,
    world_min: V,
    world_max: V,
    dims: [usize; 3],
) -> ([usize; 3], [usize; 3]) {
    let mut lo = [0; 3];
    let mut hi = [0; 3];
    for axis in 0..V::DIM {
        lo[axis] = cell(
            pos[axis] - radius,
            world_min[axis],
            world_max[axis],
            dims[axis],
        );
        hi[axis] = cell(
            pos[axis] + radius,
            world_min[axis],
            world_max[axis],
            dims[axis],
        );
    }
    (lo, hi)
}
