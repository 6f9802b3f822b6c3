use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::control_volume::ControlVolume;
use crate::error::SoilError;
use crate::forcing::Forcing;
use crate::smoothing::DEFAULT_OMEGA;

/// Everything needed to build a [`ControlVolume`]. Missing TOML keys take the
/// [`Default`] values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlVolumeConfig {
    pub area: f64,
    pub thickness: f64,
    pub discharge_thickness: f64,
    pub theta0: f64, // Initial moisture content [-]
    pub theta_wp: f64,
    pub theta_fc: f64,
    pub theta_sat: f64,
    pub max_vertical_rate: f64,
    pub horizontal_vertical_ratio: f64,
    pub pet_fraction: f64,
    pub smoothing_omega: f64,
    pub finite_difference_step: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub length_units: String, // m, cm, in or ft
    pub time_units: String,   // d or hr
    pub infiltration_method: String, // constant or cumulative
    pub soil: Option<String>, // Texture class, cumulative method only
}

impl Default for ControlVolumeConfig {
    fn default() -> Self {
        ControlVolumeConfig {
            area: 1.0,
            thickness: 1.0,
            discharge_thickness: 0.1,
            theta0: 0.01,
            theta_wp: 0.01,
            theta_fc: 0.1,
            theta_sat: 0.2,
            max_vertical_rate: 1.0e-3,
            horizontal_vertical_ratio: 10.0,
            pet_fraction: 0.15,
            smoothing_omega: DEFAULT_OMEGA,
            finite_difference_step: 1.0e-6,
            tolerance: 1.0e-6,
            max_iterations: 100,
            length_units: "m".to_string(),
            time_units: "d".to_string(),
            infiltration_method: "constant".to_string(),
            soil: None,
        }
    }
}

impl ControlVolumeConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SoilError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn build(&self) -> Result<ControlVolume, SoilError> {
        ControlVolume::new(self)
    }
}

/// A control volume together with the forcing to drive it, as read from a
/// TOML file with `[control_volume]` and `[forcing]` tables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    #[serde(default)]
    pub control_volume: ControlVolumeConfig,
    pub forcing: Option<Forcing>,
}

impl SimulationConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, SoilError> {
        let config: SimulationConfig = toml::from_str(toml_str)?;
        if let Some(forcing) = &config.forcing {
            forcing.validate()?;
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SoilError> {
        let toml_str = fs::read_to_string(path)?;
        SimulationConfig::from_toml_str(&toml_str)
    }

    /// Builds the control volume and runs it over the configured forcing.
    pub fn run(&self) -> Result<ControlVolume, SoilError> {
        let mut volume = self.control_volume.build()?;
        if let Some(forcing) = &self.forcing {
            volume.run(forcing)?;
        }
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infiltration::InfiltrationMethod;
    use crate::units::{LengthUnit, TimeUnit};

    #[test]
    fn empty_toml_uses_defaults() {
        let config = ControlVolumeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ControlVolumeConfig::default());
    }

    #[test]
    fn parses_units_and_method() {
        let config = ControlVolumeConfig::from_toml_str(
            r#"
            area = 25.0
            theta0 = 0.15
            length_units = "cm"
            time_units = "hr"
            infiltration_method = "cumulative"
            soil = "silt loam"
            "#,
        )
        .unwrap();
        assert_eq!(config.area, 25.0);
        assert_eq!(config.soil.as_deref(), Some("silt loam"));
        assert_eq!(config.theta_sat, 0.2);

        let volume = config.build().unwrap();
        assert_eq!(volume.params().length_units(), LengthUnit::Centimeter);
        assert_eq!(volume.params().time_units(), TimeUnit::Hour);
        assert_eq!(volume.infiltration().method(), InfiltrationMethod::Cumulative);
    }

    #[test]
    fn unknown_key_fails_to_parse() {
        assert!(matches!(
            ControlVolumeConfig::from_toml_str("porosity = 0.3"),
            Err(SoilError::Toml(_))
        ));
    }

    #[test]
    fn bad_names_surface_typed_errors() {
        let config = ControlVolumeConfig::from_toml_str(r#"length_units = "furlong""#).unwrap();
        assert!(matches!(
            config.build(),
            Err(SoilError::InvalidLengthUnit(unit)) if unit == "furlong"
        ));

        let config = ControlVolumeConfig::from_toml_str(r#"time_units = "s""#).unwrap();
        assert!(matches!(config.build(), Err(SoilError::InvalidTimeUnit(_))));

        let config =
            ControlVolumeConfig::from_toml_str(r#"infiltration_method = "horton""#).unwrap();
        assert!(matches!(config.build(), Err(SoilError::InvalidInfiltrationMethod(_))));

        let config = ControlVolumeConfig::from_toml_str(
            r#"
            infiltration_method = "cumulative"
            soil = "gravel"
            "#,
        )
        .unwrap();
        assert!(matches!(config.build(), Err(SoilError::InvalidSoil(..))));
    }

    #[test]
    fn simulation_with_forcing() {
        let config = SimulationConfig::from_toml_str(
            r#"
            [control_volume]
            theta0 = 0.1

            [forcing]
            inflow = [1.0e-3, 1.0e-3, 0.0]
            pet = [0.0, 0.0, 2.0e-4]
            dt = 1.0
            "#,
        )
        .unwrap();
        let volume = config.run().unwrap();
        assert_eq!(volume.time_series().len(), 3);
        assert_eq!(volume.elapsed_time(), 3.0);
    }

    #[test]
    fn simulation_rejects_negative_forcing() {
        let result = SimulationConfig::from_toml_str(
            r#"
            [forcing]
            inflow = [-1.0]
            pet = [0.0]
            "#,
        );
        assert!(matches!(result, Err(SoilError::InvalidParameter { field: "inflow", .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            SimulationConfig::from_file("does/not/exist.toml"),
            Err(SoilError::Io(_))
        ));
    }
}
