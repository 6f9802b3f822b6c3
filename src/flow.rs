//! Signed volumetric flux terms [L³/T].
//!
//! Water entering the control volume is positive; water leaving it, or an
//! increase in storage, is negative. The residual of a step is the sum of
//! the terms below and vanishes when volume is conserved.

use crate::fraction::{
    groundwater_recharge_fraction, lateral_discharge_fraction, pet_fraction,
    saturation_fraction, surface_discharge_fraction, surface_infiltration_fraction,
};
use crate::infiltration::Infiltration;
use crate::params::ControlVolumeParams;

/// Supply arriving at the surface, before any of it is rejected.
pub fn inflow_volumetric_rate(rate: f64, params: &ControlVolumeParams) -> f64 {
    params.area * rate
}

pub fn infiltration_volumetric_rate<I: Infiltration + ?Sized>(
    theta: f64,
    rate: f64,
    elapsed_time: f64,
    model: &I,
    params: &ControlVolumeParams,
) -> f64 {
    params.area
        * surface_infiltration_fraction(theta, params)
        * model.infiltrate(rate, theta, elapsed_time)
}

pub fn evapotranspiration_volumetric_rate(
    theta: f64,
    pet_rate: f64,
    params: &ControlVolumeParams,
) -> f64 {
    -params.area * pet_fraction(theta, params) * pet_rate
}

pub fn recharge_volumetric_rate(theta: f64, params: &ControlVolumeParams) -> f64 {
    -params.area * groundwater_recharge_fraction(theta, params) * params.max_vertical_rate
}

// Horizontal conductivity scaled by the saturated share of the profile.
pub fn lateral_volumetric_rate(theta: f64, params: &ControlVolumeParams) -> f64 {
    -params.area
        * lateral_discharge_fraction(theta, params)
        * params.max_horizontal_rate
        * saturation_fraction(theta, params)
}

pub fn surface_discharge_volumetric_rate(theta: f64, params: &ControlVolumeParams) -> f64 {
    -params.area * surface_discharge_fraction(theta, params) * params.max_vertical_rate
}

/// Rate of change in stored water implied by moving from `theta0` to `theta`
/// over `delta_t`. Negative when storage grows.
pub fn storage_change_rate(
    theta: f64,
    theta0: f64,
    delta_t: f64,
    params: &ControlVolumeParams,
) -> f64 {
    params.area
        * params.thickness
        * params.theta_sat
        * (saturation_fraction(theta0, params) - saturation_fraction(theta, params))
        / delta_t
}
