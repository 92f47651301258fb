//! World-wide simulation settings.

use crate::vector::Vector;

/// Settings shared by the whole world. The [`World`](crate::World) exposes
/// fluent setters that delegate here; the mutators keep the derived fields
/// (`time_step2`, `world_size`, `do_gravity`) in sync.
#[derive(Clone, Debug)]
pub struct Params<V: Vector> {
    time_step: f64,
    time_step2: f64,
    drag: f64,
    num_iterations: usize,
    collision_enabled: bool,
    do_gravity: bool,
    gravity: V,
    do_world_edges: bool,
    world_min: V,
    world_max: V,
    world_size: V,
    sector_count: V,
}

impl<V: Vector> Default for Params<V> {
    fn default() -> Self {
        let mut params = Self {
            time_step: 0.0,
            time_step2: 0.0,
            drag: 0.99,
            num_iterations: 20,
            collision_enabled: false,
            do_gravity: false,
            gravity: V::ZERO,
            do_world_edges: false,
            world_min: V::ZERO,
            world_max: V::ZERO,
            world_size: V::ZERO,
            sector_count: V::splat(1.0),
        };
        params.set_time_step(1e-5);
        params
    }
}

impl<V: Vector> Params<V> {
    /// `time_step` and its square are carried together. Neither currently
    /// feeds the integrator; the step is defined in frame units.
    pub fn set_time_step(&mut self, time_step: f64) {
        self.time_step = time_step;
        self.time_step2 = time_step * time_step;
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn time_step2(&self) -> f64 {
        self.time_step2
    }

    /// 1 is no drag at all, 0.9 quite a lot, 0 stops particles dead.
    pub fn set_drag(&mut self, drag: f64) {
        self.drag = drag;
    }

    pub fn drag(&self) -> f64 {
        self.drag
    }

    pub fn set_num_iterations(&mut self, num_iterations: usize) {
        self.num_iterations = num_iterations;
    }

    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    pub fn set_collision_enabled(&mut self, enabled: bool) {
        self.collision_enabled = enabled;
    }

    pub fn is_collision_enabled(&self) -> bool {
        self.collision_enabled
    }

    /// Store gravity and derive whether it is worth applying.
    pub fn set_gravity(&mut self, gravity: V) {
        self.gravity = gravity;
        self.do_gravity = gravity.length_squared() > 0.0;
    }

    /// Gravity along the Y axis only.
    pub fn set_gravity_y(&mut self, gy: f64) {
        self.set_gravity(V::axis_y(gy));
    }

    pub fn gravity(&self) -> V {
        self.gravity
    }

    pub fn do_gravity(&self) -> bool {
        self.do_gravity
    }

    pub fn set_world_min(&mut self, world_min: V) {
        self.world_min = world_min;
        self.update_world_size();
    }

    pub fn set_world_max(&mut self, world_max: V) {
        self.world_max = world_max;
        self.update_world_size();
    }

    pub fn clear_world_edges(&mut self) {
        self.do_world_edges = false;
    }

    pub fn world_min(&self) -> V {
        self.world_min
    }

    pub fn world_max(&self) -> V {
        self.world_max
    }

    pub fn world_size(&self) -> V {
        self.world_size
    }

    pub fn do_world_edges(&self) -> bool {
        self.do_world_edges
    }

    /// Per-axis sector counts, clamped to at least one sector per axis.
    pub fn set_sector_count(&mut self, counts: V) {
        let mut counts = counts;
        for axis in 0..V::DIM {
            if counts[axis] < 1.0 {
                counts[axis] = 1.0;
            } else {
                counts[axis] = counts[axis].floor();
            }
        }
        self.sector_count = counts;
    }

    pub fn sector_count(&self) -> V {
        self.sector_count
    }

    fn update_world_size(&mut self) {
        self.world_size = self.world_max - self.world_min;
        self.do_world_edges = true;
    }
}
