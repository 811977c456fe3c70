//! The `critspeed_core` crate computes the critical speed of a train running on a
//! track supported by layered soil.
//!
//! The critical speed is where the phase velocity of the track structure equals the
//! phase velocity of surface waves in the soil. Both dispersion curves are sampled on
//! one angular frequency axis and their first crossing is the critical point.
//!
//! Key components:
//! - **Solvers**: Brent's bracketed root finder, generic over `Scalar`.
//! - **Track**: Ballast and slab stiffness models (`TrackStiffness`) and the track dispersion curve.
//! - **Soil**: Layered soil profiles and the fast delta matrix surface wave search.
//! - **Intersection**: First crossing of two sampled curves.
//! - **Pipeline**: Input model, validation and the composed critical speed run.

pub mod intersection;
pub mod pipeline;
pub mod sampling;
pub mod soil;
pub mod solvers;
pub mod track;
pub mod traits;
pub mod types;

pub use intersection::{intersect_curves, IntersectionError};
pub use pipeline::{
    compute_dispersion, critical_speed, CriticalSpeedInput, CriticalSpeedResult,
    DispersionAnalysis, FrequencyRange,
};
pub use sampling::{build_frequency_samples, linspace};
pub use soil::{soil_dispersion, Layer, LayerProperties, SoilProfile};
pub use solvers::{brent, RootFindingError};
pub use track::{track_dispersion, BallastTrack, SlabTrack, TrackModel};
pub use traits::{Scalar, TrackStiffness};
pub use types::{
    CriticalPoint, DispersionCurve, DispersionSettings, SoilSearchSettings, TrackSearchSettings,
};
