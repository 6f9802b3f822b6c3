//! Water balance of a single lumped soil bucket.
//!
//! A [`ControlVolume`] is advanced one time step at a time. Each step solves
//! for the moisture content that balances infiltration, evapotranspiration,
//! deep recharge, lateral and surface discharge against the change in
//! storage, then records every flux in an append-only [`TimeSeries`].

mod config;
mod control_volume;
mod error;
mod flow;
mod forcing;
mod fraction;
mod infiltration;
mod newton;
mod output;
mod params;
mod smoothing;
mod units;

pub use config::{ControlVolumeConfig, SimulationConfig};
pub use control_volume::{ControlVolume, Phase};
pub use error::SoilError;
pub use flow::{
    evapotranspiration_volumetric_rate, infiltration_volumetric_rate, inflow_volumetric_rate,
    lateral_volumetric_rate, recharge_volumetric_rate, storage_change_rate,
    surface_discharge_volumetric_rate,
};
pub use forcing::Forcing;
pub use fraction::{
    fraction_vector, groundwater_recharge_fraction, lateral_discharge_fraction, pet_fraction,
    saturation_fraction, surface_discharge_fraction, surface_infiltration_fraction,
};
pub use infiltration::{
    ConstantLoss, GreenAmpt, Infiltration, InfiltrationMethod, InfiltrationModel, suction_head,
};
pub use newton::{NewtonResult, forward_difference, newton_raphson, newton_raphson_bounded};
pub use output::{Column, StepRecord, TimeSeries};
pub use params::ControlVolumeParams;
pub use smoothing::{DEFAULT_OMEGA, quadratic_smoother, smooth_vector};
pub use units::{LengthUnit, TimeUnit};
