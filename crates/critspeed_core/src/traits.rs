use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the numerical kernels.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// A track structure whose dynamic stiffness can be evaluated for wave propagation.
///
/// This is the only capability the dispersion search needs: the determinant of the
/// dynamic stiffness matrix at a given angular frequency and wavenumber. A zero of the
/// determinant in the wavenumber direction is a propagating mode.
pub trait TrackStiffness {
    /// omega: angular frequency [rad/s]
    /// wavenumber: spatial frequency [rad/m]
    fn stiffness_determinant(&self, omega: f64, wavenumber: f64) -> f64;
}

impl<S: TrackStiffness + ?Sized> TrackStiffness for &S {
    fn stiffness_determinant(&self, omega: f64, wavenumber: f64) -> f64 {
        (**self).stiffness_determinant(omega, wavenumber)
    }
}
