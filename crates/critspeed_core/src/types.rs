//! Shared data types for dispersion analysis.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Phase velocity as a function of angular frequency.
///
/// Samples for which no propagating mode was found are stored as NaN. They must be
/// treated as missing, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispersionCurve {
    pub omega: Vec<f64>,
    pub phase_velocity: Vec<f64>,
}

impl DispersionCurve {
    pub fn new(omega: Vec<f64>, phase_velocity: Vec<f64>) -> Self {
        debug_assert_eq!(omega.len(), phase_velocity.len());
        Self {
            omega,
            phase_velocity,
        }
    }

    pub fn len(&self) -> usize {
        self.omega.len()
    }

    pub fn is_empty(&self) -> bool {
        self.omega.is_empty()
    }

    /// Phase velocity at `index`, or `None` when the sample is undefined.
    pub fn value(&self, index: usize) -> Option<f64> {
        self.phase_velocity
            .get(index)
            .copied()
            .filter(|v| v.is_finite())
    }

    pub fn defined_count(&self) -> usize {
        self.phase_velocity.iter().filter(|v| v.is_finite()).count()
    }
}

/// The frequency/velocity pair where the track and soil curves cross.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    /// Critical angular frequency [rad/s].
    pub omega: f64,
    /// Critical phase velocity, i.e. the critical train speed [m/s].
    pub velocity: f64,
}

/// Wavenumber search used for every frequency of a track curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSearchSettings {
    pub wavenumber_min: f64,
    pub wavenumber_max: f64,
    pub tolerance: f64,
}

impl Default for TrackSearchSettings {
    fn default() -> Self {
        Self {
            wavenumber_min: 1e-3,
            wavenumber_max: 1e3,
            tolerance: 1e-12,
        }
    }
}

/// Trial phase velocity grid used for every frequency of a soil curve.
///
/// The grid spans `lower_factor * min(c_s)` to `upper_factor * max(c_s)` over the
/// profile. A grid that is too coarse can step over two closely spaced roots and
/// silently miss the fundamental mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilSearchSettings {
    pub lower_factor: f64,
    pub upper_factor: f64,
    pub velocity_samples: usize,
}

impl Default for SoilSearchSettings {
    fn default() -> Self {
        Self {
            lower_factor: 0.6,
            upper_factor: 1.6,
            velocity_samples: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispersionSettings {
    pub track: TrackSearchSettings,
    pub soil: SoilSearchSettings,
    /// Evaluate frequencies on the rayon thread pool when the `parallel` feature is on.
    pub parallel: bool,
}

impl Default for DispersionSettings {
    fn default() -> Self {
        Self {
            track: TrackSearchSettings::default(),
            soil: SoilSearchSettings::default(),
            parallel: true,
        }
    }
}

impl TrackSearchSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.wavenumber_min.is_finite() && self.wavenumber_min > 0.0) {
            bail!("wavenumber_min must be finite and positive.");
        }
        if !(self.wavenumber_max.is_finite() && self.wavenumber_max > self.wavenumber_min) {
            bail!("wavenumber_max must be finite and greater than wavenumber_min.");
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            bail!("Root finder tolerance must be finite and non-negative.");
        }
        Ok(())
    }
}

impl SoilSearchSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.lower_factor.is_finite() && self.lower_factor > 0.0) {
            bail!("lower_factor must be finite and positive.");
        }
        if !(self.upper_factor.is_finite() && self.upper_factor > self.lower_factor) {
            bail!("upper_factor must be finite and greater than lower_factor.");
        }
        if self.velocity_samples < 2 {
            bail!("velocity_samples must be at least 2.");
        }
        Ok(())
    }
}

impl DispersionSettings {
    pub fn validate(&self) -> Result<()> {
        self.track.validate()?;
        self.soil.validate()
    }
}

/// Maps `f` over `items`, on the rayon pool when requested and available.
///
/// The output is index-aligned with the input regardless of completion order.
pub(crate) fn map_samples<F>(items: &[f64], parallel: bool, f: F) -> Vec<f64>
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    #[cfg(feature = "parallel")]
    if parallel {
        use rayon::prelude::*;
        return items.par_iter().map(|&x| f(x)).collect();
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    items.iter().map(|&x| f(x)).collect()
}
