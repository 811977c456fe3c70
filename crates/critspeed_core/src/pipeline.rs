//! End-to-end critical speed computation.
//!
//! frequency samples -> track curve -> soil curve -> intersection.

use crate::intersection::{intersect_curves, IntersectionError};
use crate::sampling::build_frequency_samples;
use crate::soil::{soil_dispersion, LayerProperties, SoilProfile};
use crate::track::{track_dispersion, TrackModel};
use crate::types::{CriticalPoint, DispersionCurve, DispersionSettings};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Angular frequency axis [rad/s].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub min: f64,
    pub max: f64,
    pub points: i64,
}

impl FrequencyRange {
    pub fn samples(&self) -> Vec<f64> {
        build_frequency_samples(self.min, self.max, self.points)
    }
}

/// Everything needed for one critical speed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalSpeedInput {
    pub frequency: FrequencyRange,
    pub track: TrackModel,
    /// Top to bottom. The last layer is the halfspace.
    pub soil_layers: Vec<LayerProperties>,
    #[serde(default)]
    pub settings: DispersionSettings,
}

impl CriticalSpeedInput {
    pub fn validate(&self) -> Result<()> {
        let FrequencyRange { min, max, points } = self.frequency;
        // Descending ranges are scanned from the high end. Samples at zero come out undefined.
        for (name, value) in [("Minimum", min), ("Maximum", max)] {
            if !(value.is_finite() && value >= 0.0) {
                bail!("{name} angular frequency must be finite and non-negative (got {value}).");
            }
        }
        if min == max {
            bail!("Angular frequency range is empty: min and max are both {min}.");
        }
        if points < 2 {
            bail!("At least two frequency points are required (got {points}).");
        }
        self.track
            .validate()
            .with_context(|| format!("Invalid {} track parameters.", self.track.name()))?;
        self.settings.validate().context("Invalid dispersion settings.")?;
        Ok(())
    }
}

/// Track and soil dispersion curves sampled on the same frequency axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispersionAnalysis {
    pub track: DispersionCurve,
    pub soil: DispersionCurve,
}

impl DispersionAnalysis {
    pub fn omega(&self) -> &[f64] {
        &self.track.omega
    }

    /// Where the track and soil curves first cross.
    pub fn critical_point(&self) -> Result<CriticalPoint, IntersectionError> {
        intersect_curves(
            self.omega(),
            &self.track.phase_velocity,
            &self.soil.phase_velocity,
        )
    }
}

/// Result record of a critical speed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalSpeedResult {
    pub omega: Vec<f64>,
    pub track_phase_velocity: Vec<f64>,
    pub soil_phase_velocity: Vec<f64>,
    pub critical_omega: f64,
    pub critical_velocity: f64,
}

impl CriticalSpeedResult {
    pub fn new(analysis: DispersionAnalysis, critical: CriticalPoint) -> Self {
        let DispersionAnalysis { track, soil } = analysis;
        Self {
            omega: track.omega,
            track_phase_velocity: track.phase_velocity,
            soil_phase_velocity: soil.phase_velocity,
            critical_omega: critical.omega,
            critical_velocity: critical.velocity,
        }
    }
}

/// Validates `input` and computes both dispersion curves.
pub fn compute_dispersion(input: &CriticalSpeedInput) -> Result<DispersionAnalysis> {
    input.validate()?;
    let profile = SoilProfile::new(&input.soil_layers)?;
    let omega = input.frequency.samples();
    let settings = &input.settings;

    log::debug!(
        "Computing {} track dispersion over {} frequencies",
        input.track.name(),
        omega.len()
    );
    let track = track_dispersion(&input.track, &omega, &settings.track, settings.parallel);

    log::debug!(
        "Computing soil dispersion for {} layers",
        profile.layers().len()
    );
    let soil = soil_dispersion(&profile, &omega, &settings.soil, settings.parallel);

    let missing_track = track.len() - track.defined_count();
    let missing_soil = soil.len() - soil.defined_count();
    if missing_track > 0 || missing_soil > 0 {
        log::info!(
            "Undefined samples: {missing_track} on the track curve, {missing_soil} on the soil curve"
        );
    }

    Ok(DispersionAnalysis { track, soil })
}

/// Runs the full pipeline. A missing intersection is reported as an error.
pub fn critical_speed(input: &CriticalSpeedInput) -> Result<CriticalSpeedResult> {
    let analysis = compute_dispersion(input)?;
    let critical = analysis
        .critical_point()
        .context("Track and soil dispersion curves do not intersect.")?;
    log::info!(
        "Critical speed {:.3} m/s at omega = {:.3} rad/s",
        critical.velocity,
        critical.omega
    );
    Ok(CriticalSpeedResult::new(analysis, critical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::{BallastTrack, SlabTrack};

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn layer(density: f64, young_modulus: f64, poisson_ratio: f64, thickness: f64) -> LayerProperties {
        LayerProperties {
            thickness,
            density,
            young_modulus,
            poisson_ratio,
        }
    }

    fn four_layer_input(track: TrackModel) -> CriticalSpeedInput {
        CriticalSpeedInput {
            frequency: FrequencyRange {
                min: 0.1,
                max: 250.0,
                points: 100,
            },
            track,
            soil_layers: vec![
                layer(1900.0, 50.6666666667e6, 0.3333333333333, 5.0),
                layer(1900.0, 202.666666667e6, 0.3333333333333, 10.0),
                layer(1900.0, 456e6, 0.3, 15.0),
                layer(1900.0, 819.666666667e6, 0.3333333333333, f64::INFINITY),
            ],
            settings: DispersionSettings::default(),
        }
    }

    fn ballast() -> TrackModel {
        TrackModel::Ballast(BallastTrack {
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
        })
    }

    fn slab() -> TrackModel {
        TrackModel::Slab(SlabTrack {
            ei_rail: 1.29e7,
            m_rail: 120.0,
            ei_slab: 1.2e8,
            m_slab: 490.0,
            k_rail_pad: 5e8,
            c_rail_pad: 2.5e5,
            soil_stiffness: 0.0,
        })
    }

    #[test]
    fn ballast_on_four_layers_reaches_reference_critical_speed() {
        let result = critical_speed(&four_layer_input(ballast())).expect("critical speed");
        assert_eq!(result.omega.len(), 100);
        assert_eq!(result.track_phase_velocity.len(), 100);
        assert_eq!(result.soil_phase_velocity.len(), 100);
        assert!((result.critical_omega - 96.617536895654).abs() < 0.5);
        assert!((result.critical_velocity - 95.73499803447558).abs() < 0.1);
    }

    #[test]
    fn slab_on_four_layers_reaches_reference_critical_speed() {
        let result = critical_speed(&four_layer_input(slab())).expect("critical speed");
        assert!((result.critical_omega - 45.05991830281569).abs() < 0.5);
        assert!((result.critical_velocity - 145.01561079073883).abs() < 0.1);
    }

    #[test]
    fn single_layer_over_halfspace_crosses_inside_sampled_range() {
        let input = CriticalSpeedInput {
            frequency: FrequencyRange {
                min: 1.0,
                max: 200.0,
                points: 60,
            },
            track: TrackModel::Ballast(BallastTrack {
                ei_rail: 6.4e6,
                m_rail: 60.21,
                k_rail_pad: 6e8,
                c_rail_pad: 2.5e5,
                m_sleeper: 238.5,
                e_ballast: 100e6,
                h_ballast: 0.3,
                width_sleeper: 1.25,
                rho_ballast: 2000.0,
                soil_stiffness: 0.0,
            }),
            soil_layers: vec![
                layer(1800.0, 30e6, 0.3, 4.0),
                layer(2000.0, 200e6, 0.25, 0.0),
            ],
            settings: DispersionSettings::default(),
        };

        let analysis = compute_dispersion(&input).expect("dispersion");
        let track = &analysis.track.phase_velocity;
        assert_eq!(analysis.track.defined_count(), 60);
        assert!(track.windows(2).all(|pair| pair[1] > pair[0]));

        let profile = SoilProfile::new(&input.soil_layers).expect("profile");
        let grid = profile.velocity_grid(&input.settings.soil);
        for &v in &analysis.soil.phase_velocity {
            assert!(v >= grid[0] && v <= grid[grid.len() - 1]);
        }

        let point = analysis.critical_point().expect("curves cross");
        assert!(point.omega >= 1.0 && point.omega <= 200.0);
        assert!((point.omega - 80.4897971179221).abs() < 0.5);
        assert!((point.velocity - 79.03546925598032).abs() < 0.1);
    }

    #[test]
    fn dispersion_is_reproducible() {
        let mut input = four_layer_input(ballast());
        input.frequency.points = 20;
        let first = compute_dispersion(&input).expect("dispersion");
        input.settings.parallel = false;
        let second = compute_dispersion(&input).expect("dispersion");

        let bits = |values: &[f64]| values.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(
            bits(&first.track.phase_velocity),
            bits(&second.track.phase_velocity)
        );
        assert_eq!(
            bits(&first.soil.phase_velocity),
            bits(&second.soil.phase_velocity)
        );
    }

    #[test]
    fn descending_and_zero_based_ranges_are_accepted() {
        let mut input = four_layer_input(slab());
        input.frequency = FrequencyRange {
            min: 250.0,
            max: 0.1,
            points: 12,
        };
        input.settings.soil.velocity_samples = 2_000;
        let analysis = compute_dispersion(&input).expect("descending range");
        assert_eq!(analysis.omega().len(), 12);
        assert_eq!(analysis.omega()[0], 250.0);
        assert_eq!(analysis.omega()[11], 0.1);
        assert_eq!(analysis.soil.defined_count(), 12);

        input.frequency.min = 0.0;
        input.validate().expect("zero is a valid lower bound");
    }

    #[test]
    fn invalid_input_is_rejected_before_computing() {
        let mut input = four_layer_input(ballast());
        input.frequency.points = 1;
        assert_err_contains(compute_dispersion(&input), "two frequency points");

        let mut input = four_layer_input(ballast());
        input.frequency.max = input.frequency.min;
        assert_err_contains(compute_dispersion(&input), "range is empty");

        let mut input = four_layer_input(ballast());
        input.frequency.min = -1.0;
        assert_err_contains(compute_dispersion(&input), "Minimum angular frequency");

        let mut input = four_layer_input(ballast());
        input.frequency.max = f64::INFINITY;
        assert_err_contains(compute_dispersion(&input), "Maximum angular frequency");

        let mut input = four_layer_input(slab());
        if let TrackModel::Slab(track) = &mut input.track {
            track.m_slab = -1.0;
        }
        assert_err_contains(compute_dispersion(&input), "Invalid slab track parameters");

        let mut input = four_layer_input(ballast());
        input.soil_layers.clear();
        assert_err_contains(compute_dispersion(&input), "at least one layer");

        let mut input = four_layer_input(ballast());
        input.settings.soil.velocity_samples = 0;
        assert_err_contains(compute_dispersion(&input), "velocity_samples");
    }

    #[test]
    fn input_deserializes_with_default_settings() {
        let json = r#"{
            "frequency": {"min": 1.0, "max": 10.0, "points": 5},
            "track": {"type": "slabtrack", "ei_rail": 1.0, "m_rail": 1.0, "ei_slab": 1.0,
                      "m_slab": 1.0, "k_rail_pad": 1.0, "c_rail_pad": 0.0, "soil_stiffness": 0.0},
            "soil_layers": [{"density": 2000.0, "young_modulus": 5e7, "poisson_ratio": 0.25}]
        }"#;
        let input: CriticalSpeedInput = serde_json::from_str(json).expect("valid json");
        assert!(matches!(input.track, TrackModel::Slab(_)));
        assert_eq!(input.settings, DispersionSettings::default());
        assert_eq!(input.soil_layers[0].thickness, 0.0);
        input.validate().expect("valid input");
    }
}
