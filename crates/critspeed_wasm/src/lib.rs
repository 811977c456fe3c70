use critspeed_core::pipeline::{critical_speed as core_critical_speed, CriticalSpeedInput};
use critspeed_core::sampling::build_frequency_samples;
use critspeed_core::soil::{soil_dispersion as core_soil_dispersion, LayerProperties, SoilProfile};
use critspeed_core::track::{track_dispersion as core_track_dispersion, TrackModel};
use critspeed_core::types::{SoilSearchSettings, TrackSearchSettings};
use js_sys::Float64Array;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

mod runner;

pub use runner::WasmSoilDispersionRunner;

pub(crate) fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{context}: {err}"))
}

pub(crate) fn parse_layers(layers: JsValue) -> Result<SoilProfile, JsValue> {
    let properties: Vec<LayerProperties> =
        from_value(layers).map_err(|e| js_error("Invalid soil layers", e))?;
    SoilProfile::new(&properties).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

/// Full run: input object in, result record out.
#[wasm_bindgen]
pub fn critical_speed(input: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let input: CriticalSpeedInput = from_value(input).map_err(|e| js_error("Invalid input", e))?;
    let result = core_critical_speed(&input).map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
    to_value(&result).map_err(|e| js_error("Serialization error", e))
}

#[wasm_bindgen]
pub fn frequency_samples(min: f64, max: f64, count: i32) -> Float64Array {
    Float64Array::from(build_frequency_samples(min, max, i64::from(count)).as_slice())
}

/// Track phase velocity per frequency. Undefined samples are NaN.
#[wasm_bindgen]
pub fn track_dispersion(track: JsValue, omega: Vec<f64>) -> Result<Float64Array, JsValue> {
    console_error_panic_hook::set_once();

    let track: TrackModel = from_value(track).map_err(|e| js_error("Invalid track", e))?;
    track
        .validate()
        .map_err(|e| JsValue::from_str(&format!("{e:#}")))?;
    let curve = core_track_dispersion(&track, &omega, &TrackSearchSettings::default(), false);
    Ok(Float64Array::from(curve.phase_velocity.as_slice()))
}

/// Soil phase velocity per frequency. Undefined samples are NaN.
///
/// Blocks until every frequency is done; use `WasmSoilDispersionRunner` to keep the
/// page responsive on long runs.
#[wasm_bindgen]
pub fn soil_dispersion(layers: JsValue, omega: Vec<f64>) -> Result<Float64Array, JsValue> {
    console_error_panic_hook::set_once();

    let profile = parse_layers(layers)?;
    let curve = core_soil_dispersion(&profile, &omega, &SoilSearchSettings::default(), false);
    Ok(Float64Array::from(curve.phase_velocity.as_slice()))
}
