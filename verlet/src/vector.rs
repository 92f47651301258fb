//! The vector abstraction the engine is generic over.
//!
//! A single simulation implementation serves both 2-D and 3-D worlds; the
//! only difference is the vector type carried through. [`Vector`] names the
//! operations the integrator and solvers need, and is implemented for
//! [`glam::DVec2`] and [`glam::DVec3`].

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign};

use glam::{DVec2, DVec3};

pub trait Vector:
    Copy
    + Debug
    + Default
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + SubAssign
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + MulAssign<f64>
    + Index<usize, Output = f64>
    + IndexMut<usize>
{
    /// Number of axes. The sector grid assumes `DIM <= 3`.
    const DIM: usize;

    const ZERO: Self;

    fn splat(value: f64) -> Self;

    fn dot(self, other: Self) -> f64;

    fn length_squared(self) -> f64 {
        self.dot(self)
    }

    fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Rescale in place so the magnitude does not exceed `max`.
    fn limit(&mut self, max: f64) {
        let length_squared = self.length_squared();
        if length_squared > max * max {
            *self *= max / length_squared.sqrt();
        }
    }

    /// Zero vector with the given Y component. Scalar gravity acts on this axis.
    fn axis_y(y: f64) -> Self {
        let mut v = Self::ZERO;
        v[1] = y;
        v
    }
}

impl Vector for DVec2 {
    const DIM: usize = 2;
    const ZERO: Self = DVec2::ZERO;

    fn splat(value: f64) -> Self {
        DVec2::splat(value)
    }

    fn dot(self, other: Self) -> f64 {
        DVec2::dot(self, other)
    }
}

impl Vector for DVec3 {
    const DIM: usize = 3;
    const ZERO: Self = DVec3::ZERO;

    fn splat(value: f64) -> Self {
        DVec3::splat(value)
    }

    fn dot(self, other: Self) -> f64 {
        DVec3::dot(self, other)
    }
}
