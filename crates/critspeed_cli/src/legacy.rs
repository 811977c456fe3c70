//! YAML configurations in the GoTrain layout.
//!
//! These files name the track with `track_type` and keep the parameters of both
//! track kinds in separate `ballast_track` / `slab_track` sections, with the
//! `EI_rail`, `EI_slab` and `E_ballast` spellings.

use crate::config::{CriticalSpeedConfig, OutputConfig};
use anyhow::{bail, Context, Error, Result};
use critspeed_core::pipeline::{CriticalSpeedInput, FrequencyRange};
use critspeed_core::soil::LayerProperties;
use critspeed_core::track::{BallastTrack, SlabTrack, TrackModel};
use critspeed_core::types::DispersionSettings;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyConfig {
    pub track_type: String,
    pub frequency: FrequencyRange,
    #[serde(default)]
    pub ballast_track: Option<LegacyBallastTrack>,
    #[serde(default)]
    pub slab_track: Option<LegacySlabTrack>,
    pub soil_layers: Vec<LayerProperties>,
    #[serde(default)]
    pub settings: DispersionSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LegacyBallastTrack {
    #[serde(rename = "EI_rail")]
    pub ei_rail: f64,
    pub m_rail: f64,
    pub k_rail_pad: f64,
    #[serde(default)]
    pub c_rail_pad: f64,
    pub m_sleeper: f64,
    #[serde(rename = "E_ballast")]
    pub e_ballast: f64,
    pub h_ballast: f64,
    pub width_sleeper: f64,
    pub rho_ballast: f64,
    #[serde(default)]
    pub soil_stiffness: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LegacySlabTrack {
    #[serde(rename = "EI_rail")]
    pub ei_rail: f64,
    pub m_rail: f64,
    #[serde(rename = "EI_slab")]
    pub ei_slab: f64,
    pub m_slab: f64,
    pub k_rail_pad: f64,
    #[serde(default)]
    pub c_rail_pad: f64,
    #[serde(default)]
    pub soil_stiffness: f64,
}

impl From<LegacyBallastTrack> for BallastTrack {
    fn from(t: LegacyBallastTrack) -> Self {
        BallastTrack {
            ei_rail: t.ei_rail,
            m_rail: t.m_rail,
            k_rail_pad: t.k_rail_pad,
            c_rail_pad: t.c_rail_pad,
            m_sleeper: t.m_sleeper,
            e_ballast: t.e_ballast,
            h_ballast: t.h_ballast,
            width_sleeper: t.width_sleeper,
            rho_ballast: t.rho_ballast,
            soil_stiffness: t.soil_stiffness,
        }
    }
}

impl From<LegacySlabTrack> for SlabTrack {
    fn from(t: LegacySlabTrack) -> Self {
        SlabTrack {
            ei_rail: t.ei_rail,
            m_rail: t.m_rail,
            ei_slab: t.ei_slab,
            m_slab: t.m_slab,
            k_rail_pad: t.k_rail_pad,
            c_rail_pad: t.c_rail_pad,
            soil_stiffness: t.soil_stiffness,
        }
    }
}

impl LegacyConfig {
    /// Picks the track section named by `track_type`. The other section is ignored.
    pub fn track(&self) -> Result<TrackModel> {
        match self.track_type.as_str() {
            "ballast" => self
                .ballast_track
                .map(|t| TrackModel::Ballast(t.into()))
                .context("track_type is \"ballast\" but there is no ballast_track section."),
            "slabtrack" | "slab" => self
                .slab_track
                .map(|t| TrackModel::Slab(t.into()))
                .context("track_type is \"slabtrack\" but there is no slab_track section."),
            other => bail!(
                "Invalid track type \"{other}\". Supported types are \"ballast\" or \"slabtrack\"."
            ),
        }
    }
}

impl TryFrom<LegacyConfig> for CriticalSpeedConfig {
    type Error = Error;

    fn try_from(legacy: LegacyConfig) -> Result<Self> {
        let track = legacy.track()?;
        Ok(CriticalSpeedConfig {
            input: CriticalSpeedInput {
                frequency: legacy.frequency,
                track,
                soil_layers: legacy.soil_layers,
                settings: legacy.settings,
            },
            output: legacy.output,
        })
    }
}

pub fn parse_yaml(text: &str) -> Result<CriticalSpeedConfig> {
    let legacy: LegacyConfig = serde_yaml::from_str(text)?;
    legacy.try_into()
}
