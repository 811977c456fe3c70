//! Stepped soil dispersion runner.
//!
//! The soil search is the expensive part of a run. The runner evaluates a few
//! frequencies per call so the host can report progress between batches.

use crate::{js_error, parse_layers};
use critspeed_core::soil::{soil_phase_velocity, SoilProfile};
use critspeed_core::types::{DispersionCurve, SoilSearchSettings};
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
struct RunnerProgress {
    done: bool,
    current_step: usize,
    max_steps: usize,
}

struct SoilRunnerState {
    profile: SoilProfile,
    grid: Vec<f64>,
    omega: Vec<f64>,
    phase_velocity: Vec<f64>,
}

impl SoilRunnerState {
    fn new(
        profile: SoilProfile,
        omega: Vec<f64>,
        settings: &SoilSearchSettings,
    ) -> Result<Self, String> {
        settings.validate().map_err(|e| format!("{e:#}"))?;
        let grid = profile.velocity_grid(settings);
        Ok(Self {
            profile,
            grid,
            phase_velocity: Vec::with_capacity(omega.len()),
            omega,
        })
    }

    fn is_done(&self) -> bool {
        self.phase_velocity.len() >= self.omega.len()
    }

    fn advance(&mut self, batch_size: usize) -> RunnerProgress {
        for _ in 0..batch_size {
            let Some(&omega) = self.omega.get(self.phase_velocity.len()) else {
                break;
            };
            let value = soil_phase_velocity(&self.profile, omega, &self.grid).unwrap_or(f64::NAN);
            self.phase_velocity.push(value);
        }
        self.progress()
    }

    fn progress(&self) -> RunnerProgress {
        RunnerProgress {
            done: self.is_done(),
            current_step: self.phase_velocity.len(),
            max_steps: self.omega.len(),
        }
    }

    fn curve(&self) -> DispersionCurve {
        let n = self.phase_velocity.len();
        DispersionCurve::new(self.omega[..n].to_vec(), self.phase_velocity.clone())
    }
}

#[wasm_bindgen]
pub struct WasmSoilDispersionRunner {
    state: SoilRunnerState,
}

#[wasm_bindgen]
impl WasmSoilDispersionRunner {
    /// `settings` may be `undefined` or `null` for the default search grid.
    #[wasm_bindgen(constructor)]
    pub fn new(
        layers: JsValue,
        omega: Vec<f64>,
        settings: JsValue,
    ) -> Result<WasmSoilDispersionRunner, JsValue> {
        console_error_panic_hook::set_once();

        let profile = parse_layers(layers)?;
        let settings: SoilSearchSettings = if settings.is_undefined() || settings.is_null() {
            SoilSearchSettings::default()
        } else {
            from_value(settings).map_err(|e| js_error("Invalid soil search settings", e))?
        };
        let state = SoilRunnerState::new(profile, omega, &settings)
            .map_err(|message| JsValue::from_str(&message))?;

        Ok(WasmSoilDispersionRunner { state })
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let progress = self.state.advance(batch_size as usize);
        to_value(&progress).map_err(|e| js_error("Serialization error", e))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        to_value(&self.state.progress()).map_err(|e| js_error("Serialization error", e))
    }

    /// Curve over the frequencies evaluated so far.
    pub fn get_result(&self) -> Result<JsValue, JsValue> {
        to_value(&self.state.curve()).map_err(|e| js_error("Serialization error", e))
    }
}
