//! Bracketed scalar root finding.
//!
//! Brent's method combines bisection, the secant rule and inverse quadratic
//! interpolation. Interpolated steps are only accepted while they keep making
//! progress inside the bracket, so the worst case degrades to bisection.

use crate::traits::Scalar;
use thiserror::Error;

/// Hard cap on the number of Brent iterations.
pub const MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RootFindingError {
    #[error("Root not bracketed: f(a) = {f_a} and f(b) = {f_b} must have opposite signs.")]
    NotBracketed { f_a: f64, f_b: f64 },
    #[error("Root finder did not converge within {iterations} iterations.")]
    MaxIterations { iterations: usize },
}

/// Finds a root of `f` inside `[a, b]`.
///
/// `f(a)` and `f(b)` must have opposite signs unless one of them is exactly zero,
/// in which case that endpoint is returned. The tolerance is clamped to machine
/// epsilon.
pub fn brent<T, F>(a: T, b: T, tolerance: T, mut f: F) -> Result<T, RootFindingError>
where
    T: Scalar,
    F: FnMut(T) -> T,
{
    let zero = T::zero();
    let half = T::from_f64(0.5).unwrap_or_else(T::zero);
    let two = T::from_f64(2.0).unwrap_or_else(T::one);
    let three = T::from_f64(3.0).unwrap_or_else(T::one);
    let eps = T::epsilon();
    let tol = if tolerance < eps { eps } else { tolerance };

    let (mut a, mut b) = (a, b);
    let mut fa = f(a);
    let mut fb = f(b);

    if fa == zero {
        return Ok(a);
    }
    if fb == zero {
        return Ok(b);
    }
    if !opposite_signs(fa, fb) {
        return Err(RootFindingError::NotBracketed {
            f_a: fa.to_f64().unwrap_or(f64::NAN),
            f_b: fb.to_f64().unwrap_or(f64::NAN),
        });
    }

    // b holds the smaller residual.
    if fa.abs() < fb.abs() {
        std::mem::swap(&mut a, &mut b);
        std::mem::swap(&mut fa, &mut fb);
    }

    let mut c = a;
    let mut fc = fa;
    let mut d = b - a;
    let mut e = d;

    for _ in 0..MAX_ITERATIONS {
        let delta = two * eps * b.abs() + tol;
        let m = half * (c - b);

        if m.abs() <= delta || fb == zero {
            return Ok(b);
        }

        let mut bisect = true;

        if e.abs() >= delta && fa.abs() > fb.abs() {
            let s = fb / fa;
            let mut p;
            let mut q;

            if a == c {
                // secant
                p = two * m * s;
                q = T::one() - s;
            } else {
                // inverse quadratic interpolation
                let qa = fa / fc;
                let r = fb / fc;
                p = s * (two * m * qa * (qa - r) - (b - a) * (r - T::one()));
                q = (qa - T::one()) * (r - T::one()) * (s - T::one());
            }

            if p > zero {
                q = -q;
            } else {
                p = -p;
            }

            if two * p < three * m * q - (delta * q).abs() && p < (half * e * q).abs() {
                e = d;
                d = p / q;
                bisect = false;
            }
        }

        if bisect {
            e = m;
            d = e;
        }

        a = b;
        fa = fb;

        if d.abs() > delta {
            b = b + d;
        } else if m > zero {
            b = b + delta;
        } else {
            b = b - delta;
        }

        fb = f(b);

        if opposite_signs(fa, fb) {
            c = a;
            fc = fa;
        }
    }

    Err(RootFindingError::MaxIterations {
        iterations: MAX_ITERATIONS,
    })
}

/// Compares signs without multiplying. False when either value is zero or NaN.
fn opposite_signs<T: Scalar>(x: T, y: T) -> bool {
    let zero = T::zero();
    (x < zero && y > zero) || (x > zero && y < zero)
}
