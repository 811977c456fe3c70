//! Track dispersion.
//!
//! The track is modelled as coupled beams and masses on springs, following
//! Mezher et al. (2016), "Railway critical velocity - Analytical prediction and
//! analysis", Transportation Geotechnics 6, 84-96. For each angular frequency the
//! wavenumber that makes the dynamic stiffness matrix singular is located with
//! Brent's method, and the phase velocity follows as omega / k.

use crate::solvers::brent;
use crate::traits::TrackStiffness;
use crate::types::{map_samples, DispersionCurve, TrackSearchSettings};
use anyhow::{bail, Result};
use nalgebra::{Matrix2, Matrix3};
use serde::{Deserialize, Serialize};

/// Share of the ballast cone assigned to each sleeper half.
const BALLAST_ALPHA: f64 = 0.5;

/// Ballasted track: rail, railpad, sleeper, ballast layer and soil spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallastTrack {
    /// Rail bending stiffness [N m^2].
    pub ei_rail: f64,
    /// Rail mass per unit length [kg/m].
    pub m_rail: f64,
    /// Railpad stiffness [N/m].
    pub k_rail_pad: f64,
    /// Railpad damping [N s/m]. Carried for completeness, the stiffness matrix is undamped.
    #[serde(default)]
    pub c_rail_pad: f64,
    /// Distributed sleeper mass [kg/m].
    pub m_sleeper: f64,
    /// Young's modulus of the ballast [Pa].
    pub e_ballast: f64,
    /// Ballast layer thickness [m].
    pub h_ballast: f64,
    /// Half-track width [m].
    pub width_sleeper: f64,
    /// Ballast density [kg/m^3].
    pub rho_ballast: f64,
    /// Soil spring stiffness [N/m].
    #[serde(default)]
    pub soil_stiffness: f64,
}

/// Slab track: rail, railpad, slab beam and soil spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlabTrack {
    /// Rail bending stiffness [N m^2].
    pub ei_rail: f64,
    /// Rail mass per unit length [kg/m].
    pub m_rail: f64,
    /// Slab bending stiffness [N m^2].
    pub ei_slab: f64,
    /// Slab mass per unit length [kg/m].
    pub m_slab: f64,
    /// Railpad stiffness [N/m].
    pub k_rail_pad: f64,
    /// Railpad damping [N s/m]. Carried for completeness, the stiffness matrix is undamped.
    #[serde(default)]
    pub c_rail_pad: f64,
    /// Soil spring stiffness [N/m].
    #[serde(default)]
    pub soil_stiffness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackModel {
    Ballast(BallastTrack),
    #[serde(alias = "slabtrack")]
    Slab(SlabTrack),
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        bail!("{name} must be finite and positive (got {value}).");
    }
    Ok(())
}

fn require_non_negative(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        bail!("{name} must be finite and non-negative (got {value}).");
    }
    Ok(())
}

impl BallastTrack {
    pub fn validate(&self) -> Result<()> {
        require_positive("ei_rail", self.ei_rail)?;
        require_positive("m_rail", self.m_rail)?;
        require_positive("k_rail_pad", self.k_rail_pad)?;
        require_non_negative("c_rail_pad", self.c_rail_pad)?;
        require_positive("m_sleeper", self.m_sleeper)?;
        require_positive("e_ballast", self.e_ballast)?;
        require_positive("h_ballast", self.h_ballast)?;
        require_positive("width_sleeper", self.width_sleeper)?;
        require_positive("rho_ballast", self.rho_ballast)?;
        require_non_negative("soil_stiffness", self.soil_stiffness)
    }

    /// Compressional wave speed of the ballast layer [m/s].
    pub fn ballast_wave_speed(&self) -> f64 {
        (self.e_ballast / self.rho_ballast).sqrt()
    }

    /// Dynamic stiffness matrix coupling rail, sleeper and ballast base.
    pub fn stiffness_matrix(&self, omega: f64, wavenumber: f64) -> Matrix3<f64> {
        let cp = self.ballast_wave_speed();
        let phase = omega * self.h_ballast / cp;
        let tan_term = phase.tan() * cp;
        let sin_term = phase.sin() * cp;
        let coupling = 2.0 * omega * self.e_ballast * self.width_sleeper * BALLAST_ALPHA;
        let omega_sq = omega * omega;
        let pad = self.k_rail_pad;

        let k11 = self.ei_rail * wavenumber.powi(4) + pad - omega_sq * self.m_rail;
        let k12 = -pad;
        let k22 = pad + coupling / tan_term - omega_sq * self.m_sleeper;
        let k23 = -coupling / sin_term;
        let k33 = coupling / tan_term + self.soil_stiffness;

        Matrix3::new(
            k11, k12, 0.0, //
            k12, k22, k23, //
            0.0, k23, k33,
        )
    }
}

impl SlabTrack {
    pub fn validate(&self) -> Result<()> {
        require_positive("ei_rail", self.ei_rail)?;
        require_positive("m_rail", self.m_rail)?;
        require_positive("ei_slab", self.ei_slab)?;
        require_positive("m_slab", self.m_slab)?;
        require_positive("k_rail_pad", self.k_rail_pad)?;
        require_non_negative("c_rail_pad", self.c_rail_pad)?;
        require_non_negative("soil_stiffness", self.soil_stiffness)
    }

    /// Dynamic stiffness matrix coupling rail and slab.
    pub fn stiffness_matrix(&self, omega: f64, wavenumber: f64) -> Matrix2<f64> {
        let k4 = wavenumber.powi(4);
        let omega_sq = omega * omega;
        let pad = self.k_rail_pad;

        let k11 = self.ei_rail * k4 + pad - omega_sq * self.m_rail;
        let k12 = -pad;
        let k22 = pad + self.ei_slab * k4 - omega_sq * self.m_slab + self.soil_stiffness;

        Matrix2::new(
            k11, k12, //
            k12, k22,
        )
    }
}

/// Cofactor expansion of a 2x2 determinant.
pub fn determinant_2x2(m: &Matrix2<f64>) -> f64 {
    m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]
}

/// Cofactor expansion of a 3x3 determinant along the first row.
pub fn determinant_3x3(m: &Matrix3<f64>) -> f64 {
    m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
        - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
        + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
}

impl TrackStiffness for BallastTrack {
    fn stiffness_determinant(&self, omega: f64, wavenumber: f64) -> f64 {
        determinant_3x3(&self.stiffness_matrix(omega, wavenumber))
    }
}

impl TrackStiffness for SlabTrack {
    fn stiffness_determinant(&self, omega: f64, wavenumber: f64) -> f64 {
        determinant_2x2(&self.stiffness_matrix(omega, wavenumber))
    }
}

impl TrackStiffness for TrackModel {
    fn stiffness_determinant(&self, omega: f64, wavenumber: f64) -> f64 {
        match self {
            TrackModel::Ballast(track) => track.stiffness_determinant(omega, wavenumber),
            TrackModel::Slab(track) => track.stiffness_determinant(omega, wavenumber),
        }
    }
}

impl TrackModel {
    pub fn validate(&self) -> Result<()> {
        match self {
            TrackModel::Ballast(track) => track.validate(),
            TrackModel::Slab(track) => track.validate(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackModel::Ballast(_) => "ballast",
            TrackModel::Slab(_) => "slab",
        }
    }
}

/// Phase velocity of the track at a single angular frequency, if a mode is found.
pub fn track_phase_velocity<S: TrackStiffness>(
    track: &S,
    omega: f64,
    settings: &TrackSearchSettings,
) -> Option<f64> {
    match brent(
        settings.wavenumber_min,
        settings.wavenumber_max,
        settings.tolerance,
        |k| track.stiffness_determinant(omega, k),
    ) {
        Ok(wavenumber) => Some(omega / wavenumber),
        Err(err) => {
            log::warn!("Track dispersion: no wavenumber found at omega = {omega}: {err}");
            None
        }
    }
}

/// Track dispersion curve over `omega`.
///
/// Frequencies where the root finder fails are stored as NaN and the remaining
/// frequencies are still evaluated.
pub fn track_dispersion<S>(
    track: &S,
    omega: &[f64],
    settings: &TrackSearchSettings,
    parallel: bool,
) -> DispersionCurve
where
    S: TrackStiffness + Sync,
{
    let phase_velocity = map_samples(omega, parallel, |w| {
        track_phase_velocity(track, w, settings).unwrap_or(f64::NAN)
    });
    DispersionCurve::new(omega.to_vec(), phase_velocity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::linspace;

    fn reference_ballast() -> BallastTrack {
        BallastTrack {
            ei_rail: 1.29e7,
            m_rail: 120.0,
            k_rail_pad: 5e8,
            c_rail_pad: 2.5e5,
            m_sleeper: 490.0,
            e_ballast: 1.2e8,
            h_ballast: 0.35,
            width_sleeper: 1.25,
            rho_ballast: 1800.0,
            soil_stiffness: 0.0,
        }
    }

    fn reference_slab() -> SlabTrack {
        SlabTrack {
            ei_rail: 1.29e7,
            m_rail: 120.0,
            ei_slab: 1.2e8,
            m_slab: 490.0,
            k_rail_pad: 5e8,
            c_rail_pad: 2.5e5,
            soil_stiffness: 0.0,
        }
    }

    fn assert_relative(value: f64, expected: f64, rel: f64) {
        assert!(
            ((value - expected) / expected).abs() < rel,
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn cofactor_determinants_match_nalgebra() {
        let m3 = Matrix3::new(2.0, -1.0, 0.5, 3.0, 4.0, -2.0, 1.5, 0.25, 5.0);
        assert!((determinant_3x3(&m3) - m3.determinant()).abs() < 1e-9);
        let m2 = Matrix2::new(3.0, -7.0, 2.5, 4.0);
        assert!((determinant_2x2(&m2) - 29.5).abs() < 1e-12);
    }

    #[test]
    fn ballast_matrix_is_symmetric_with_zero_corners() {
        let track = reference_ballast();
        let m = track.stiffness_matrix(40.0, 2.0);
        assert_eq!(m[(0, 2)], 0.0);
        assert_eq!(m[(2, 0)], 0.0);
        assert_eq!(m, m.transpose());
        let expected = m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(1, 2)])
            - m[(0, 1)] * m[(0, 1)] * m[(2, 2)];
        let det = track.stiffness_determinant(40.0, 2.0);
        assert!(((det - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn slab_determinant_matches_closed_form() {
        let track = reference_slab();
        let (omega, k) = (25.0, 0.4_f64);
        let k11 = track.ei_rail * k.powi(4) + track.k_rail_pad - omega * omega * track.m_rail;
        let k22 = track.k_rail_pad + track.ei_slab * k.powi(4) - omega * omega * track.m_slab;
        let expected = k11 * k22 - track.k_rail_pad * track.k_rail_pad;
        let det = TrackModel::Slab(track).stiffness_determinant(omega, k);
        assert!(((det - expected) / expected).abs() < 1e-12);
    }

    #[test]
    fn ballast_dispersion_matches_reference_values() {
        let omega = linspace(0.1, 250.0, 100);
        let curve = track_dispersion(
            &TrackModel::Ballast(reference_ballast()),
            &omega,
            &TrackSearchSettings::default(),
            false,
        );
        assert_eq!(curve.len(), 100);
        assert_eq!(curve.defined_count(), 100);
        assert_relative(curve.phase_velocity[0], 3.099627253889054, 1e-6);
        assert_relative(curve.phase_velocity[1], 15.878498964741876, 1e-6);
        assert_relative(curve.phase_velocity[20], 69.5939988246689, 1e-6);
        assert_relative(curve.phase_velocity[60], 118.75307433918653, 1e-6);
        assert_relative(curve.phase_velocity[99], 147.89473617864164, 1e-6);
    }

    #[test]
    fn slab_dispersion_matches_reference_values() {
        let omega = linspace(0.1, 250.0, 100);
        let curve = track_dispersion(
            &reference_slab(),
            &omega,
            &TrackSearchSettings::default(),
            false,
        );
        assert_eq!(curve.defined_count(), 100);
        assert_relative(curve.phase_velocity[0], 6.8320146240922375, 1e-6);
        assert_relative(curve.phase_velocity[10], 108.76070649059184, 1e-6);
        assert_relative(curve.phase_velocity[40], 217.1929968243252, 1e-6);
        assert_relative(curve.phase_velocity[99], 341.53569320459627, 1e-6);
    }

    #[test]
    fn track_curve_is_increasing_over_reference_range() {
        let omega = linspace(0.1, 250.0, 100);
        let curve = track_dispersion(
            &reference_ballast(),
            &omega,
            &TrackSearchSettings::default(),
            false,
        );
        for pair in curve.phase_velocity.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn unbracketed_frequency_becomes_undefined_without_aborting() {
        // A search band that never reaches the slab mode leaves every sample undefined.
        let settings = TrackSearchSettings {
            wavenumber_min: 1e-3,
            wavenumber_max: 2e-3,
            ..TrackSearchSettings::default()
        };
        let omega = [50.0, 100.0];
        let curve = track_dispersion(&reference_slab(), &omega, &settings, false);
        assert_eq!(curve.omega, omega.to_vec());
        assert!(curve.phase_velocity.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn parallel_and_serial_curves_are_identical() {
        let omega = linspace(0.1, 250.0, 64);
        let track = TrackModel::Ballast(reference_ballast());
        let settings = TrackSearchSettings::default();
        let serial = track_dispersion(&track, &omega, &settings, false);
        let parallel = track_dispersion(&track, &omega, &settings, true);
        let again = track_dispersion(&track, &omega, &settings, true);
        assert_eq!(
            serial.phase_velocity.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            parallel.phase_velocity.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert_eq!(parallel, again);
    }

    #[test]
    fn validation_rejects_non_positive_constants() {
        let mut track = reference_ballast();
        track.m_sleeper = 0.0;
        let err = track.validate().expect_err("expected error");
        assert!(format!("{err}").contains("m_sleeper"));

        let mut slab = reference_slab();
        slab.soil_stiffness = -1.0;
        let err = TrackModel::Slab(slab).validate().expect_err("expected error");
        assert!(format!("{err}").contains("soil_stiffness"));

        reference_ballast().validate().expect("reference track is valid");
    }
}
