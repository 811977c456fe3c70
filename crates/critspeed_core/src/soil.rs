//! Surface wave dispersion of a horizontally layered soil.
//!
//! The fundamental mode is located with the Fast Delta Matrix method of
//! Buchen & Ben-Hador (1996), "Free-mode surface-wave computations",
//! Geophys. J. Int. 124(3), 869-887. Instead of multiplying 4x4 layer propagators,
//! whose entries grow like exp(k h), five second-order compound quantities are
//! carried from the surface down to the halfspace. They stay bounded for thick
//! layers and high frequencies.
//!
//! The last layer of a profile is always treated as a halfspace.

use crate::sampling::linspace;
use crate::types::{map_samples, DispersionCurve, SoilSearchSettings};
use anyhow::{bail, Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Stand-in for a vertical wavenumber ratio that would be exactly zero.
const TINY_RATIO: f64 = 1e-200;

/// Elastic properties of one soil layer as given in an input file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerProperties {
    /// Layer thickness [m]. Ignored for the halfspace.
    #[serde(default)]
    pub thickness: f64,
    /// Density [kg/m^3].
    pub density: f64,
    /// Young's modulus [Pa].
    pub young_modulus: f64,
    /// Poisson's ratio [-].
    pub poisson_ratio: f64,
}

/// A soil layer with its body wave speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layer {
    properties: LayerProperties,
    compressional_wave_speed: f64,
    shear_wave_speed: f64,
}

impl Layer {
    pub fn new(properties: LayerProperties) -> Result<Self> {
        let LayerProperties {
            density,
            young_modulus,
            poisson_ratio,
            ..
        } = properties;

        if !(density.is_finite() && density > 0.0) {
            bail!("Layer density must be finite and positive (got {density}).");
        }
        if !(young_modulus.is_finite() && young_modulus > 0.0) {
            bail!("Layer Young's modulus must be finite and positive (got {young_modulus}).");
        }
        if !(poisson_ratio > -1.0 && poisson_ratio < 0.5) {
            bail!("Layer Poisson's ratio must lie in (-1, 0.5) (got {poisson_ratio}).");
        }
        let mut layer = Self {
            properties,
            compressional_wave_speed: 0.0,
            shear_wave_speed: 0.0,
        };
        layer.compressional_wave_speed = (layer.p_wave_modulus() / density).sqrt();
        layer.shear_wave_speed = (layer.shear_modulus() / density).sqrt();
        Ok(layer)
    }

    pub fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    pub fn thickness(&self) -> f64 {
        self.properties.thickness
    }

    pub fn density(&self) -> f64 {
        self.properties.density
    }

    /// G = E / (2 (1 + nu)).
    pub fn shear_modulus(&self) -> f64 {
        let p = &self.properties;
        p.young_modulus / (2.0 * (1.0 + p.poisson_ratio))
    }

    /// M = E (1 - nu) / ((1 + nu) (1 - 2 nu)).
    pub fn p_wave_modulus(&self) -> f64 {
        let p = &self.properties;
        p.young_modulus * (1.0 - p.poisson_ratio)
            / ((1.0 + p.poisson_ratio) * (1.0 - 2.0 * p.poisson_ratio))
    }

    /// Compressional (P) wave speed [m/s].
    pub fn compressional_wave_speed(&self) -> f64 {
        self.compressional_wave_speed
    }

    /// Shear (S) wave speed [m/s].
    pub fn shear_wave_speed(&self) -> f64 {
        self.shear_wave_speed
    }
}

/// Layers ordered from the surface down. The last one is the halfspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilProfile {
    layers: Vec<Layer>,
}

impl SoilProfile {
    pub fn new(properties: &[LayerProperties]) -> Result<Self> {
        let layers = properties
            .iter()
            .enumerate()
            .map(|(idx, props)| {
                Layer::new(*props).with_context(|| format!("Invalid soil layer {idx}."))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_layers(layers)
    }

    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            bail!("A soil profile needs at least one layer (the halfspace).");
        }
        let last = layers.len() - 1;
        for (idx, layer) in layers[..last].iter().enumerate() {
            let thickness = layer.thickness();
            if !(thickness.is_finite() && thickness >= 0.0) {
                bail!(
                    "Soil layer {idx} lies above the halfspace and needs a finite, non-negative thickness (got {thickness})."
                );
            }
        }
        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn halfspace(&self) -> &Layer {
        &self.layers[self.layers.len() - 1]
    }

    /// Smallest and largest shear wave speed in the profile.
    pub fn shear_speed_range(&self) -> (f64, f64) {
        self.layers.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), layer| {
            (
                lo.min(layer.shear_wave_speed()),
                hi.max(layer.shear_wave_speed()),
            )
        })
    }

    /// Trial phase velocities scanned at every frequency.
    pub fn velocity_grid(&self, settings: &SoilSearchSettings) -> Vec<f64> {
        let (min_vs, max_vs) = self.shear_speed_range();
        linspace(
            settings.lower_factor * min_vs,
            settings.upper_factor * max_vs,
            settings.velocity_samples,
        )
    }
}

/// Vertical propagation terms of one layer at trial velocity `c`.
#[derive(Debug, Clone, Copy)]
struct LayerTerms {
    c_alpha: f64,
    s_alpha: Complex64,
    c_beta: f64,
    s_beta: Complex64,
    r: f64,
    s: f64,
}

/// Normalised vertical wavenumber sqrt(|1 - (c/v)^2|), with a tiny stand-in at c == v.
fn vertical_ratio(c: f64, wave_speed: f64) -> f64 {
    let ratio = (c / wave_speed).powi(2);
    if c < wave_speed {
        (1.0 - ratio).sqrt()
    } else if c == wave_speed {
        TINY_RATIO
    } else {
        (ratio - 1.0).sqrt()
    }
}

/// Cosine-like and sine-like propagators over `thickness`.
///
/// Below the body wave speed the wave is evanescent (cosh, sinh). At or above it
/// the wave propagates (cos, i sin); the imaginary unit on the sine keeps the final
/// combination real.
fn propagators(c: f64, wave_speed: f64, wavenumber: f64, thickness: f64) -> (f64, Complex64, f64) {
    let ratio = vertical_ratio(c, wave_speed);
    let arg = wavenumber * ratio * thickness;
    if c <= wave_speed {
        (arg.cosh(), Complex64::new(arg.sinh(), 0.0), ratio)
    } else {
        (arg.cos(), Complex64::new(0.0, arg.sin()), ratio)
    }
}

fn layer_terms(c: f64, wavenumber: f64, layer: &Layer) -> LayerTerms {
    let thickness = layer.thickness();
    let (c_alpha, s_alpha, r) =
        propagators(c, layer.compressional_wave_speed(), wavenumber, thickness);
    let (c_beta, s_beta, s) = propagators(c, layer.shear_wave_speed(), wavenumber, thickness);
    LayerTerms {
        c_alpha,
        s_alpha,
        c_beta,
        s_beta,
        r,
        s,
    }
}

/// Dispersion function D(omega, c) of the layered halfspace.
///
/// A sign change of D along `c` at fixed `omega` brackets a surface wave mode.
pub fn fast_delta_determinant(profile: &SoilProfile, omega: f64, c: f64) -> f64 {
    let layers = profile.layers();
    let wavenumber = omega / c;

    let top = &layers[0];
    let beta0 = top.shear_wave_speed();
    let t = 2.0 - (c / beta0).powi(2);
    let mu0 = top.density() * beta0 * beta0;

    let mut x = [
        Complex64::new(mu0 * 2.0 * t, 0.0),
        Complex64::new(-mu0 * t * t, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(0.0, 0.0),
        Complex64::new(-4.0 * mu0, 0.0),
    ];

    for pair in layers.windows(2) {
        let (layer, next) = (&pair[0], &pair[1]);
        let LayerTerms {
            c_alpha,
            s_alpha,
            c_beta,
            s_beta,
            r,
            s,
        } = layer_terms(c, wavenumber, layer);

        let gamma = (layer.shear_wave_speed() / c).powi(2);
        let gamma_next = (next.shear_wave_speed() / c).powi(2);
        let epsilon = next.density() / layer.density();
        let eta = 2.0 * (gamma - epsilon * gamma_next);

        let a = epsilon + eta;
        let a_prime = a - 1.0;
        let b = 1.0 - eta;
        let b_prime = b - 1.0;

        let [x1, x2, x3, x4, x5] = x;

        let p1 = x2 * c_beta + s_beta * s * x3;
        let p2 = x4 * c_beta + s_beta * s * x5;
        let p3 = s_beta * (1.0 / s) * x2 + x3 * c_beta;
        let p4 = s_beta * (1.0 / s) * x4 + x5 * c_beta;

        let q1 = p1 * c_alpha - s_alpha * r * p2;
        let q2 = s_alpha * (-1.0 / r) * p3 + p4 * c_alpha;
        let q3 = p3 * c_alpha - s_alpha * r * p4;
        let q4 = s_alpha * (-1.0 / r) * p1 + p2 * c_alpha;

        let y1 = x1 * a_prime + q1 * a;
        let y2 = x1 * a + q2 * a_prime;
        let z1 = x1 * b + q1 * b_prime;
        let z2 = x1 * b_prime + q2 * b;

        x = [
            y1 * b_prime + y2 * b,
            y1 * a + y2 * a_prime,
            q3 * epsilon,
            q4 * epsilon,
            z1 * b_prime + z2 * b,
        ];
    }

    // The halfspace only contributes its vertical ratios.
    let halfspace = profile.halfspace();
    let r_h = vertical_ratio(c, halfspace.compressional_wave_speed());
    let s_h = vertical_ratio(c, halfspace.shear_wave_speed());

    let d = x[1] + x[2] * s_h - (x[3] + x[4] * s_h) * r_h;
    d.re
}

/// Fundamental mode phase velocity at `omega`, scanning `grid` for the first sign change.
///
/// Returns the midpoint of the first bracketing cell, or `None` when D never changes
/// sign over the grid.
pub fn soil_phase_velocity(profile: &SoilProfile, omega: f64, grid: &[f64]) -> Option<f64> {
    let (&first, rest) = grid.split_first()?;
    let mut previous_c = first;
    let mut previous_d = fast_delta_determinant(profile, omega, first);

    for &c in rest {
        let d = fast_delta_determinant(profile, omega, c);
        if previous_d * d < 0.0 {
            return Some((previous_c + c) / 2.0);
        }
        previous_c = c;
        previous_d = d;
    }

    log::debug!("Soil dispersion: no sign change at omega = {omega}");
    None
}

/// Soil dispersion curve over `omega`. Frequencies without a mode are stored as NaN.
pub fn soil_dispersion(
    profile: &SoilProfile,
    omega: &[f64],
    settings: &SoilSearchSettings,
    parallel: bool,
) -> DispersionCurve {
    let grid = profile.velocity_grid(settings);
    let phase_velocity = map_samples(omega, parallel, |w| {
        soil_phase_velocity(profile, w, &grid).unwrap_or(f64::NAN)
    });
    DispersionCurve::new(omega.to_vec(), phase_velocity)
}
