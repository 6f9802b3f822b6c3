use serde::Deserialize;

use crate::error::SoilError;

// Per-step forcing for a control volume run
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Forcing {
    pub inflow: Vec<f64>, // Infiltration supply rates [L/T]
    pub pet: Vec<f64>,    // Potential evapotranspiration rates [L/T]
    #[serde(default = "default_dt")]
    pub dt: f64, // Step length [T]
}

fn default_dt() -> f64 {
    1.0
}

impl Forcing {
    pub fn new(inflow: Vec<f64>, pet: Vec<f64>, dt: f64) -> Result<Self, SoilError> {
        let forcing = Forcing { inflow, pet, dt };
        forcing.validate()?;
        Ok(forcing)
    }

    /// Constant inflow and PET for `steps` steps.
    pub fn constant(inflow: f64, pet: f64, dt: f64, steps: usize) -> Result<Self, SoilError> {
        Forcing::new(vec![inflow; steps], vec![pet; steps], dt)
    }

    pub(crate) fn validate(&self) -> Result<(), SoilError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SoilError::parameter("dt", self.dt, "must be greater than zero"));
        }
        for value in self.inflow.iter() {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(SoilError::parameter("inflow", *value, "rates must be non-negative"));
            }
        }
        for value in self.pet.iter() {
            if !(value.is_finite() && *value >= 0.0) {
                return Err(SoilError::parameter("pet", *value, "rates must be non-negative"));
            }
        }
        Ok(())
    }

    /// Number of steps the forcing covers.
    pub fn steps(&self) -> usize {
        self.inflow.len().max(self.pet.len())
    }

    // Hold the last value past the end of the series
    fn value_for_step(step: usize, values: &[f64]) -> f64 {
        values.get(step).or(values.last()).copied().unwrap_or(0.0)
    }

    pub fn inflow_for_step(&self, step: usize) -> f64 {
        Forcing::value_for_step(step, &self.inflow)
    }

    pub fn pet_for_step(&self, step: usize) -> f64 {
        Forcing::value_for_step(step, &self.pet)
    }

    // Step containing `time` (floor of time / dt). Only for lookups by
    // elapsed time; stepping goes through the index directly.
    fn step_at(&self, time: f64) -> usize {
        (time / self.dt).floor().max(0.0) as usize
    }

    pub fn inflow_at(&self, time: f64) -> f64 {
        self.inflow_for_step(self.step_at(time))
    }

    pub fn pet_at(&self, time: f64) -> f64 {
        self.pet_for_step(self.step_at(time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_step_and_hold_last() {
        let forcing = Forcing::new(vec![1.0, 2.0, 3.0], vec![0.5], 0.5).unwrap();
        assert_eq!(forcing.steps(), 3);
        assert_eq!(forcing.inflow_at(0.0), 1.0);
        assert_eq!(forcing.inflow_at(0.6), 2.0);
        assert_eq!(forcing.inflow_at(1.2), 3.0);
        assert_eq!(forcing.inflow_at(50.0), 3.0);
        assert_eq!(forcing.pet_at(1.2), 0.5);
    }

    #[test]
    fn step_lookup_is_exact_for_every_index() {
        let inflow: Vec<f64> = (0..2000).map(|i| i as f64).collect();
        let forcing = Forcing::new(inflow, vec![0.0], 0.1).unwrap();
        for step in 0..2000 {
            assert_eq!(forcing.inflow_for_step(step), step as f64);
        }
        assert_eq!(forcing.inflow_for_step(5000), 1999.0);
        assert_eq!(forcing.pet_for_step(7), 0.0);
    }

    #[test]
    fn empty_series_reads_zero() {
        let forcing = Forcing::new(vec![], vec![], 1.0).unwrap();
        assert_eq!(forcing.steps(), 0);
        assert_eq!(forcing.pet_at(3.0), 0.0);
        assert_eq!(forcing.inflow_for_step(0), 0.0);
    }

    #[test]
    fn rejects_negative_rates_and_steps() {
        assert!(Forcing::new(vec![-1.0], vec![0.0], 1.0).is_err());
        assert!(Forcing::new(vec![1.0], vec![f64::NAN], 1.0).is_err());
        assert!(Forcing::constant(1.0, 0.0, 0.0, 3).is_err());
    }
}
