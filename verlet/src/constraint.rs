//! Pairwise constraints: springs, attractions and user-supplied projections.
//!
//! Constraints displace positions only. `old_pos` is never touched by a
//! solver, so a projection turns into velocity on the next integration step.

use std::fmt;

use slotmap::new_key_type;

use crate::particle::{Particle, ParticleKey};
use crate::vector::Vector;

new_key_type! {
    /// Stable handle to a constraint in a [`World`](crate::World) arena.
    pub struct ConstraintKey;
}

/// The closed set of constraint kinds. The solver visits kinds in this order
/// every iteration, so the discriminant order is part of the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Custom,
    Spring,
    Attraction,
}

pub const KIND_COUNT: usize = 3;

impl ConstraintKind {
    pub const ORDER: [ConstraintKind; KIND_COUNT] = [
        ConstraintKind::Custom,
        ConstraintKind::Spring,
        ConstraintKind::Attraction,
    ];

    pub(crate) fn group(self) -> usize {
        match self {
            ConstraintKind::Custom => 0,
            ConstraintKind::Spring => 1,
            ConstraintKind::Attraction => 2,
        }
    }
}

/// The escape hatch for constraint kinds the engine does not know about.
///
/// The solver hands over both endpoints with the common gate already
/// applied (enabled, not both fixed, inside the distance window). An
/// implementation must leave fixed particles where they are and must not
/// touch `old_pos`; displace through `move_by(.., false)` like the built-in
/// solvers do.
pub trait CustomConstraint<V: Vector>: fmt::Debug + dyn_clone::DynClone {
    fn solve(&mut self, a: &mut Particle<V>, b: &mut Particle<V>);
}

impl<V: Vector> Clone for Box<dyn CustomConstraint<V>> {
    fn clone(&self) -> Self {
        dyn_clone::clone_box(&**self)
    }
}

/// Hookean spring toward a rest length, optionally force-capped.
#[derive(Clone, Debug)]
pub struct Spring {
    rest_length: f64,
    strength: f64,
    force_cap: f64,
}

impl Spring {
    pub fn set_strength(&mut self, strength: f64) -> &mut Self {
        self.strength = strength;
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn set_rest_length(&mut self, rest_length: f64) -> &mut Self {
        self.rest_length = rest_length;
        self
    }

    pub fn rest_length(&self) -> f64 {
        self.rest_length
    }

    /// Zero leaves the correction uncapped.
    pub fn set_force_cap(&mut self, force_cap: f64) -> &mut Self {
        self.force_cap = force_cap;
        self
    }

    pub fn force_cap(&self) -> f64 {
        self.force_cap
    }

    fn solve<V: Vector>(&self, a: &mut Particle<V>, b: &mut Particle<V>) {
        let delta = b.position() - a.position();
        let length = delta.length_squared().sqrt();
        let inv_mass_sum = a.inv_mass() + b.inv_mass();
        if length == 0.0 || inv_mass_sum == 0.0 {
            return;
        }
        let force = self.strength * (length - self.rest_length) / (length * inv_mass_sum);
        let mut correction = delta * force;
        if self.force_cap > 0.0 {
            correction.limit(self.force_cap);
        }
        if a.is_free() {
            a.move_by(correction * a.inv_mass(), false);
        }
        if b.is_free() {
            b.move_by(correction * -b.inv_mass(), false);
        }
    }
}

/// Inverse-square pairwise attraction scaled by both masses.
///
/// The force is applied along the unnormalized separation vector, so the
/// correction magnitude scales as `strength * m_a * m_b / |d|`.
#[derive(Clone, Debug)]
pub struct Attraction {
    strength: f64,
}

impl Attraction {
    pub fn set_strength(&mut self, strength: f64) -> &mut Self {
        self.strength = strength;
        self
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    fn solve<V: Vector>(&self, a: &mut Particle<V>, b: &mut Particle<V>) {
        let delta = b.position() - a.position();
        let length_squared = delta.length_squared();
        if length_squared == 0.0 {
            return;
        }
        let force = self.strength * a.mass() * b.mass() / length_squared;
        let correction = delta * force;
        if a.is_free() {
            a.move_by(correction * a.inv_mass(), false);
        }
        if b.is_free() {
            b.move_by(correction * -b.inv_mass(), false);
        }
    }
}

enum Body<V: Vector> {
    Custom(Box<dyn CustomConstraint<V>>),
    Spring(Spring),
    Attraction(Attraction),
}

impl<V: Vector> Clone for Body<V> {
    fn clone(&self) -> Self {
        match self {
            Body::Custom(custom) => Body::Custom(custom.clone()),
            Body::Spring(spring) => Body::Spring(spring.clone()),
            Body::Attraction(attraction) => Body::Attraction(attraction.clone()),
        }
    }
}

impl<V: Vector> fmt::Debug for Body<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Custom(custom) => f.debug_tuple("Custom").field(custom).finish(),
            Body::Spring(spring) => f.debug_tuple("Spring").field(spring).finish(),
            Body::Attraction(attraction) => f.debug_tuple("Attraction").field(attraction).finish(),
        }
    }
}

/// A relation between two particles, solved by iterative projection.
#[derive(Clone, Debug)]
pub struct Constraint<V: Vector> {
    a: ParticleKey,
    b: ParticleKey,
    on: bool,
    dead: bool,
    min_dist: f64,
    min_dist2: f64,
    max_dist: f64,
    max_dist2: f64,
    body: Body<V>,
}

impl<V: Vector> Constraint<V> {
    pub fn spring(a: ParticleKey, b: ParticleKey, strength: f64, rest_length: f64) -> Self {
        Self::with_body(
            a,
            b,
            Body::Spring(Spring {
                rest_length,
                strength,
                force_cap: 0.0,
            }),
        )
    }

    pub fn attraction(a: ParticleKey, b: ParticleKey, strength: f64) -> Self {
        Self::with_body(a, b, Body::Attraction(Attraction { strength }))
    }

    pub fn custom(a: ParticleKey, b: ParticleKey, solver: Box<dyn CustomConstraint<V>>) -> Self {
        Self::with_body(a, b, Body::Custom(solver))
    }

    fn with_body(a: ParticleKey, b: ParticleKey, body: Body<V>) -> Self {
        Self {
            a,
            b,
            on: true,
            dead: false,
            min_dist: 0.0,
            min_dist2: 0.0,
            max_dist: 0.0,
            max_dist2: 0.0,
            body,
        }
    }

    pub fn a(&self) -> ParticleKey {
        self.a
    }

    pub fn b(&self) -> ParticleKey {
        self.b
    }

    pub fn kind(&self) -> ConstraintKind {
        match self.body {
            Body::Custom(_) => ConstraintKind::Custom,
            Body::Spring(_) => ConstraintKind::Spring,
            Body::Attraction(_) => ConstraintKind::Attraction,
        }
    }

    pub fn turn_on(&mut self) -> &mut Self {
        self.on = true;
        self
    }

    pub fn turn_off(&mut self) -> &mut Self {
        self.on = false;
        self
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn is_off(&self) -> bool {
        !self.on
    }

    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// The flag alone; the world also treats constraints with dead or reaped
    /// endpoints as dead.
    pub fn is_killed(&self) -> bool {
        self.dead
    }

    /// Below this separation the constraint does not act. Zero disables the
    /// bound.
    pub fn set_min_distance(&mut self, min_dist: f64) -> &mut Self {
        self.min_dist = min_dist;
        self.min_dist2 = min_dist * min_dist;
        self
    }

    pub fn min_distance(&self) -> f64 {
        self.min_dist
    }

    /// Beyond this separation the constraint does not act. Zero disables the
    /// bound.
    pub fn set_max_distance(&mut self, max_dist: f64) -> &mut Self {
        self.max_dist = max_dist;
        self.max_dist2 = max_dist * max_dist;
        self
    }

    pub fn max_distance(&self) -> f64 {
        self.max_dist
    }

    pub fn spring_body(&self) -> Option<&Spring> {
        match &self.body {
            Body::Spring(spring) => Some(spring),
            _ => None,
        }
    }

    pub fn spring_body_mut(&mut self) -> Option<&mut Spring> {
        match &mut self.body {
            Body::Spring(spring) => Some(spring),
            _ => None,
        }
    }

    pub fn attraction_body(&self) -> Option<&Attraction> {
        match &self.body {
            Body::Attraction(attraction) => Some(attraction),
            _ => None,
        }
    }

    pub fn attraction_body_mut(&mut self) -> Option<&mut Attraction> {
        match &mut self.body {
            Body::Attraction(attraction) => Some(attraction),
            _ => None,
        }
    }

    /// Worth solving only if the constraint is on, at least one end can
    /// move, and the separation sits inside the configured window.
    pub fn should_solve(&self, a: &Particle<V>, b: &Particle<V>) -> bool {
        if self.is_off() || (a.is_fixed() && b.is_fixed()) {
            return false;
        }
        if self.min_dist == 0.0 && self.max_dist == 0.0 {
            return true;
        }
        let length_squared = (b.position() - a.position()).length_squared();
        let min_ok = self.min_dist == 0.0 || length_squared > self.min_dist2;
        let max_ok = self.max_dist == 0.0 || length_squared < self.max_dist2;
        min_ok && max_ok
    }

    pub(crate) fn solve(&mut self, a: &mut Particle<V>, b: &mut Particle<V>) {
        match &mut self.body {
            Body::Custom(custom) => custom.solve(a, b),
            Body::Spring(spring) => spring.solve(a, b),
            Body::Attraction(attraction) => attraction.solve(a, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{dvec2, DVec2};
    use slotmap::SlotMap;

    use super::*;

    fn pair(
        a: DVec2,
        b: DVec2,
    ) -> (
        SlotMap<ParticleKey, Particle<DVec2>>,
        ParticleKey,
        ParticleKey,
    ) {
        let mut particles = SlotMap::with_key();
        let ka = particles.insert(Particle::new(a, 1.0, 1.0));
        let kb = particles.insert(Particle::new(b, 1.0, 1.0));
        (particles, ka, kb)
    }

    fn solve_once(
        constraint: &mut Constraint<DVec2>,
        particles: &mut SlotMap<ParticleKey, Particle<DVec2>>,
    ) {
        let [a, b] = particles
            .get_disjoint_mut([constraint.a(), constraint.b()])
            .unwrap();
        if constraint.should_solve(a, b) {
            constraint.solve(a, b);
        }
    }

    #[test]
    fn spring_at_rest_length_does_nothing() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        let mut spring = Constraint::spring(ka, kb, 0.5, 10.0);
        solve_once(&mut spring, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(0.0, 0.0));
        assert_eq!(particles[kb].position(), dvec2(10.0, 0.0));
    }

    #[test]
    fn zero_strength_spring_never_moves_endpoints() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(3.0, 0.0));
        let mut spring = Constraint::spring(ka, kb, 0.0, 10.0);
        for _ in 0..5 {
            solve_once(&mut spring, &mut particles);
        }
        assert_eq!(particles[ka].position(), dvec2(0.0, 0.0));
        assert_eq!(particles[kb].position(), dvec2(3.0, 0.0));
    }

    #[test]
    fn stretched_spring_pulls_ends_together_without_touching_velocity_baseline() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(20.0, 0.0));
        let old_a = particles[ka].old_position();
        let mut spring = Constraint::spring(ka, kb, 1.0, 10.0);
        solve_once(&mut spring, &mut particles);

        // strength * (L - rest) / (L * 2) = 0.25, correction = (5, 0)
        assert_eq!(particles[ka].position(), dvec2(5.0, 0.0));
        assert_eq!(particles[kb].position(), dvec2(15.0, 0.0));
        // solvers displace without rewriting the velocity baseline
        assert_eq!(particles[ka].old_position(), old_a);
        assert_eq!(particles[ka].velocity(), dvec2(5.0, 0.0));
    }

    #[test]
    fn coincident_spring_endpoints_are_a_noop() {
        let (mut particles, ka, kb) = pair(dvec2(1.0, 1.0), dvec2(1.0, 1.0));
        let mut spring = Constraint::spring(ka, kb, 1.0, 10.0);
        solve_once(&mut spring, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(1.0, 1.0));
        assert_eq!(particles[kb].position(), dvec2(1.0, 1.0));
    }

    #[test]
    fn force_cap_bounds_the_correction() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(100.0, 0.0));
        let mut spring = Constraint::spring(ka, kb, 1.0, 10.0);
        spring.spring_body_mut().unwrap().set_force_cap(1.0);
        solve_once(&mut spring, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(1.0, 0.0));
        assert_eq!(particles[kb].position(), dvec2(99.0, 0.0));
    }

    #[test]
    fn fixed_endpoint_stays_put() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(20.0, 0.0));
        particles[ka].make_fixed();
        let mut spring = Constraint::spring(ka, kb, 1.0, 10.0);
        solve_once(&mut spring, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(0.0, 0.0));
        // the whole correction still uses both inverse masses
        assert_eq!(particles[kb].position(), dvec2(15.0, 0.0));
    }

    #[test]
    fn both_fixed_skips_the_solve() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(20.0, 0.0));
        particles[ka].make_fixed();
        particles[kb].make_fixed();
        let spring = Constraint::spring(ka, kb, 1.0, 10.0);
        assert!(!spring.should_solve(&particles[ka], &particles[kb]));
    }

    #[test]
    fn distance_window_gates_solving() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        let mut spring = Constraint::spring(ka, kb, 1.0, 0.0);
        assert!(spring.should_solve(&particles[ka], &particles[kb]));

        // min only: active strictly beyond it
        spring.set_min_distance(10.0);
        assert!(!spring.should_solve(&particles[ka], &particles[kb]));
        particles[kb].move_to(dvec2(10.1, 0.0), true);
        assert!(spring.should_solve(&particles[ka], &particles[kb]));

        // adding a max bound: active strictly inside it
        spring.set_max_distance(12.0);
        assert!(spring.should_solve(&particles[ka], &particles[kb]));
        particles[kb].move_to(dvec2(12.0, 0.0), true);
        assert!(!spring.should_solve(&particles[ka], &particles[kb]));

        // zero min bound disables that side again
        spring.set_min_distance(0.0);
        particles[kb].move_to(dvec2(0.5, 0.0), true);
        assert!(spring.should_solve(&particles[ka], &particles[kb]));
    }

    #[test]
    fn turned_off_constraint_does_not_solve() {
        let (particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(20.0, 0.0));
        let mut spring = Constraint::spring(ka, kb, 1.0, 10.0);
        spring.turn_off();
        assert!(!spring.should_solve(&particles[ka], &particles[kb]));
        spring.turn_on();
        assert!(spring.should_solve(&particles[ka], &particles[kb]));
    }

    #[test]
    fn attraction_pulls_proportional_to_masses() {
        let (mut particles, ka, kb) = pair(dvec2(0.0, 0.0), dvec2(10.0, 0.0));
        particles[ka].set_mass(2.0);
        let mut attraction = Constraint::attraction(ka, kb, 1.0);
        solve_once(&mut attraction, &mut particles);

        // force = 1 * 2 * 1 / 100, correction = (10, 0) * 0.02 = (0.2, 0)
        let a = particles[ka].position();
        let b = particles[kb].position();
        assert!((a.x - 0.1).abs() < 1e-12); // 0.2 * inv_mass 0.5
        assert!((b.x - 9.8).abs() < 1e-12);
        assert_eq!(a.y, 0.0);
    }

    #[test]
    fn coincident_attraction_is_a_noop() {
        let (mut particles, ka, kb) = pair(dvec2(2.0, 2.0), dvec2(2.0, 2.0));
        let mut attraction = Constraint::attraction(ka, kb, 5.0);
        solve_once(&mut attraction, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(2.0, 2.0));
    }

    #[derive(Clone, Debug)]
    struct PinToAxis;

    impl CustomConstraint<DVec2> for PinToAxis {
        fn solve(&mut self, a: &mut Particle<DVec2>, _b: &mut Particle<DVec2>) {
            if a.is_free() {
                let target = dvec2(a.position().x, 0.0);
                a.move_to(target, false);
            }
        }
    }

    #[test]
    fn custom_constraints_run_through_the_same_gate() {
        let (mut particles, ka, kb) = pair(dvec2(3.0, 7.0), dvec2(0.0, 0.0));
        let mut custom = Constraint::custom(ka, kb, Box::new(PinToAxis));
        assert_eq!(custom.kind(), ConstraintKind::Custom);
        solve_once(&mut custom, &mut particles);
        assert_eq!(particles[ka].position(), dvec2(3.0, 0.0));

        let cloned = custom.clone();
        assert_eq!(cloned.kind(), ConstraintKind::Custom);
    }
}
