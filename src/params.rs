use crate::config::ControlVolumeConfig;
use crate::error::SoilError;
use crate::smoothing::{MAX_EFFECTIVE_OMEGA, validate_omega};
use crate::units::{LengthUnit, TimeUnit};

// Validated static description of a control volume plus the quantities derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct ControlVolumeParams {
    pub(crate) area: f64,                // Plan area [L²]
    pub(crate) thickness: f64,           // Profile thickness [L]
    pub(crate) discharge_thickness: f64, // Near-surface discharge layer thickness [L]
    pub(crate) theta_wp: f64,            // Wilting point [-]
    pub(crate) theta_fc: f64,            // Field capacity [-]
    pub(crate) theta_sat: f64,           // Saturated water content [-]
    pub(crate) max_vertical_rate: f64,   // Vertical saturated conductivity [L/T]
    pub(crate) horizontal_vertical_ratio: f64,
    pub(crate) pet_fraction: f64, // Share of the wp..sat range over which PET ramps up [-]
    pub(crate) smoothing_omega: f64,
    pub(crate) finite_difference_step: f64,
    pub(crate) tolerance: f64,
    pub(crate) max_iterations: usize,
    pub(crate) length_units: LengthUnit,
    pub(crate) time_units: TimeUnit,

    // Derived
    pub(crate) volume_max: f64,
    pub(crate) theta_discharge: f64,
    pub(crate) max_horizontal_rate: f64,
    pub(crate) theta_pet_max: f64,
}

impl ControlVolumeParams {
    pub fn new(config: &ControlVolumeConfig) -> Result<Self, SoilError> {
        validate(config)?;

        if config.smoothing_omega > MAX_EFFECTIVE_OMEGA {
            log::warn!(
                "smoothing_omega ({}) exceeds {}; the blend width is capped",
                config.smoothing_omega,
                MAX_EFFECTIVE_OMEGA
            );
        }

        let theta_pet_max =
            config.theta_wp + (config.theta_sat - config.theta_wp) * config.pet_fraction;

        Ok(ControlVolumeParams {
            area: config.area,
            thickness: config.thickness,
            discharge_thickness: config.discharge_thickness,
            theta_wp: config.theta_wp,
            theta_fc: config.theta_fc,
            theta_sat: config.theta_sat,
            max_vertical_rate: config.max_vertical_rate,
            horizontal_vertical_ratio: config.horizontal_vertical_ratio,
            pet_fraction: config.pet_fraction,
            smoothing_omega: config.smoothing_omega.min(MAX_EFFECTIVE_OMEGA),
            finite_difference_step: config.finite_difference_step,
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            length_units: config.length_units.parse()?,
            time_units: config.time_units.parse()?,
            volume_max: config.theta_sat * config.area * config.thickness,
            theta_discharge: config.theta_sat * (config.thickness - config.discharge_thickness)
                / config.thickness,
            max_horizontal_rate: config.max_vertical_rate * config.horizontal_vertical_ratio,
            theta_pet_max,
        })
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn discharge_thickness(&self) -> f64 {
        self.discharge_thickness
    }

    pub fn horizontal_vertical_ratio(&self) -> f64 {
        self.horizontal_vertical_ratio
    }

    pub fn pet_fraction(&self) -> f64 {
        self.pet_fraction
    }

    pub fn finite_difference_step(&self) -> f64 {
        self.finite_difference_step
    }

    pub fn theta_wp(&self) -> f64 {
        self.theta_wp
    }

    pub fn theta_fc(&self) -> f64 {
        self.theta_fc
    }

    pub fn theta_sat(&self) -> f64 {
        self.theta_sat
    }

    pub fn theta_discharge(&self) -> f64 {
        self.theta_discharge
    }

    pub fn theta_pet_max(&self) -> f64 {
        self.theta_pet_max
    }

    pub fn max_vertical_rate(&self) -> f64 {
        self.max_vertical_rate
    }

    pub fn max_horizontal_rate(&self) -> f64 {
        self.max_horizontal_rate
    }

    pub fn volume_max(&self) -> f64 {
        self.volume_max
    }

    /// Effective smoothing half-width, after capping.
    pub fn smoothing_omega(&self) -> f64 {
        self.smoothing_omega
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn length_units(&self) -> LengthUnit {
        self.length_units
    }

    pub fn time_units(&self) -> TimeUnit {
        self.time_units
    }

    /// Stored volume for a moisture content.
    pub fn volume(&self, theta: f64) -> f64 {
        theta * self.area * self.thickness
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), SoilError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SoilError::parameter(field, value, "must be greater than zero"))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), SoilError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SoilError::parameter(
            field,
            value,
            "must be greater than or equal to zero",
        ))
    }
}

fn validate(config: &ControlVolumeConfig) -> Result<(), SoilError> {
    positive("area", config.area)?;
    positive("thickness", config.thickness)?;
    positive("discharge_thickness", config.discharge_thickness)?;
    if config.discharge_thickness > config.thickness {
        return Err(SoilError::parameter(
            "discharge_thickness",
            config.discharge_thickness,
            format!("must not exceed thickness ({})", config.thickness),
        ));
    }

    non_negative("theta_wp", config.theta_wp)?;
    non_negative("theta_fc", config.theta_fc)?;
    non_negative("theta_sat", config.theta_sat)?;
    if config.theta_wp > config.theta_fc {
        return Err(SoilError::parameter(
            "theta_wp",
            config.theta_wp,
            format!("must be less than field capacity ({})", config.theta_fc),
        ));
    }
    if config.theta_fc > config.theta_sat {
        return Err(SoilError::parameter(
            "theta_fc",
            config.theta_fc,
            format!("must be less than theta_sat ({})", config.theta_sat),
        ));
    }
    positive("theta_sat", config.theta_sat)?;

    non_negative("theta0", config.theta0)?;
    if config.theta0 > config.theta_sat {
        return Err(SoilError::parameter(
            "theta0",
            config.theta0,
            format!("must be less than theta_sat ({})", config.theta_sat),
        ));
    }

    non_negative("max_vertical_rate", config.max_vertical_rate)?;
    positive("horizontal_vertical_ratio", config.horizontal_vertical_ratio)?;

    non_negative("pet_fraction", config.pet_fraction)?;
    if config.pet_fraction > 1.0 {
        return Err(SoilError::parameter(
            "pet_fraction",
            config.pet_fraction,
            "must be less than or equal to one",
        ));
    }

    validate_omega(config.smoothing_omega)?;
    positive("finite_difference_step", config.finite_difference_step)?;
    positive("tolerance", config.tolerance)?;
    if config.max_iterations < 1 {
        return Err(SoilError::parameter(
            "max_iterations",
            config.max_iterations as f64,
            "must be at least one",
        ));
    }
    Ok(())
}
