//! First crossing of two sampled curves.

use crate::types::CriticalPoint;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntersectionError {
    #[error("Curves need at least two samples (got {len}).")]
    TooFewPoints { len: usize },
    #[error("Curve lengths differ: x has {x}, y1 has {y1}, y2 has {y2} samples.")]
    LengthMismatch { x: usize, y1: usize, y2: usize },
    #[error("Curves are parallel and never intersect.")]
    Parallel,
    #[error("No intersection found within the sampled range.")]
    NotFound,
}

/// Returns the first point, scanning left to right, where `y1` and `y2` cross or touch.
///
/// A sample where both curves agree exactly is returned as is. Otherwise the crossing
/// is interpolated linearly inside the bracketing segment. Segments with an undefined
/// (non-finite) value on either curve are skipped.
///
/// When no crossing exists the error tells apart curves whose difference never
/// changed (`Parallel`) from curves that merely stay on one side (`NotFound`).
pub fn intersect_curves(x: &[f64], y1: &[f64], y2: &[f64]) -> Result<CriticalPoint, IntersectionError> {
    let shortest = x.len().min(y1.len()).min(y2.len());
    if shortest < 2 {
        return Err(IntersectionError::TooFewPoints { len: shortest });
    }
    if y1.len() != x.len() || y2.len() != x.len() {
        return Err(IntersectionError::LengthMismatch {
            x: x.len(),
            y1: y1.len(),
            y2: y2.len(),
        });
    }

    let defined = |i: usize| x[i].is_finite() && y1[i].is_finite() && y2[i].is_finite();
    // Last defined difference seen, compared across skipped segments too.
    let mut last_diff: Option<f64> = None;
    let mut difference_changed = false;

    for i in 1..x.len() {
        if !(defined(i - 1) && defined(i)) {
            continue;
        }

        let diff = y1[i] - y2[i];
        let prev_diff = y1[i - 1] - y2[i - 1];

        for value in [prev_diff, diff] {
            if last_diff.is_some_and(|last| last != value) {
                difference_changed = true;
            }
            last_diff = Some(value);
        }

        // Signs are compared directly; the product of two tiny differences underflows.
        if diff == 0.0 || prev_diff == 0.0 || (diff < 0.0) != (prev_diff < 0.0) {
            if diff == 0.0 {
                return Ok(CriticalPoint {
                    omega: x[i],
                    velocity: y1[i],
                });
            }
            if prev_diff == 0.0 {
                return Ok(CriticalPoint {
                    omega: x[i - 1],
                    velocity: y1[i - 1],
                });
            }

            let fraction = prev_diff.abs() / (diff.abs() + prev_diff.abs());
            return Ok(CriticalPoint {
                omega: x[i - 1] + fraction * (x[i] - x[i - 1]),
                velocity: y1[i - 1] + fraction * (y1[i] - y1[i - 1]),
            });
        }
    }

    match last_diff {
        Some(_) if !difference_changed => Err(IntersectionError::Parallel),
        // Either the gap varied, or nothing was defined to compare.
        _ => Err(IntersectionError::NotFound),
    }
}
