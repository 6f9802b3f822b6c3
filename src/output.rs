use approx::relative_eq;
use nalgebra::DVector;

// One committed time step. Fluxes are signed volumetric rates [L³/T]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub time: f64,                 // Elapsed time at the end of the step [T]
    pub iterations: usize,         // Newton iterations used
    pub converged: bool,
    pub residual: f64,             // Residual at the committed moisture content [L³/T]
    pub theta: f64,                // Moisture content [-]
    pub volume: f64,               // Stored water [L³]
    pub inflow: f64,               // Supply at the surface
    pub infiltration: f64,
    pub rejected_infiltration: f64, // Supply that could not enter (negative)
    pub evapotranspiration: f64,
    pub recharge: f64,
    pub lateral_discharge: f64,
    pub surface_discharge: f64,
    pub storage_change: f64,
}

impl StepRecord {
    /// Sum of the terms that make up the residual.
    pub fn balance(&self) -> f64 {
        self.infiltration
            + self.evapotranspiration
            + self.recharge
            + self.lateral_discharge
            + self.surface_discharge
            + self.storage_change
    }

    fn value(&self, column: Column) -> f64 {
        match column {
            Column::Iterations => self.iterations as f64,
            Column::Theta => self.theta,
            Column::Volume => self.volume,
            Column::Inflow => self.inflow,
            Column::Infiltration => self.infiltration,
            Column::RejectedInfiltration => self.rejected_infiltration,
            Column::Evapotranspiration => self.evapotranspiration,
            Column::Recharge => self.recharge,
            Column::LateralDischarge => self.lateral_discharge,
            Column::SurfaceDischarge => self.surface_discharge,
            Column::StorageChange => self.storage_change,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Iterations,
    Theta,
    Volume,
    Inflow,
    Infiltration,
    RejectedInfiltration,
    Evapotranspiration,
    Recharge,
    LateralDischarge,
    SurfaceDischarge,
    StorageChange,
}

impl Column {
    pub const FLUXES: [Column; 8] = [
        Column::Inflow,
        Column::Infiltration,
        Column::RejectedInfiltration,
        Column::Evapotranspiration,
        Column::Recharge,
        Column::LateralDischarge,
        Column::SurfaceDischarge,
        Column::StorageChange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Iterations => "iterations",
            Column::Theta => "theta",
            Column::Volume => "volume",
            Column::Inflow => "inflow",
            Column::Infiltration => "infiltration",
            Column::RejectedInfiltration => "rejected_infiltration",
            Column::Evapotranspiration => "evapotranspiration",
            Column::Recharge => "recharge",
            Column::LateralDischarge => "lateral_discharge",
            Column::SurfaceDischarge => "surface_discharge",
            Column::StorageChange => "storage_change",
        }
    }
}

/// Append-only record of every committed step, keyed by elapsed time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    records: Vec<StepRecord>,
}

impl TimeSeries {
    pub fn new() -> Self {
        TimeSeries::default()
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    /// Record whose elapsed time matches `time`. Elapsed time is accumulated
    /// step by step, so the match allows for rounding.
    pub fn at(&self, time: f64) -> Option<&StepRecord> {
        self.records
            .iter()
            .find(|r| relative_eq!(r.time, time, epsilon = 1.0e-12, max_relative = 1.0e-9))
    }

    /// Record of the `step`-th committed step, counting from zero.
    pub fn step(&self, step: usize) -> Option<&StepRecord> {
        self.records.get(step)
    }

    pub fn times(&self) -> DVector<f64> {
        DVector::from_iterator(self.records.len(), self.records.iter().map(|r| r.time))
    }

    pub fn column(&self, column: Column) -> DVector<f64> {
        DVector::from_iterator(
            self.records.len(),
            self.records.iter().map(|r| r.value(column)),
        )
    }

    /// Flux column divided by `area`, giving a rate per unit area [L/T].
    pub fn column_per_unit_area(&self, column: Column, area: f64) -> DVector<f64> {
        let values = self.column(column);
        if Column::FLUXES.contains(&column) {
            values / area
        } else {
            values
        }
    }

    /// Steps that stopped without meeting the solver tolerance.
    pub fn unconverged(&self) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(|r| !r.converged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(time: f64, theta: f64) -> StepRecord {
        StepRecord {
            time,
            iterations: 2,
            converged: time < 2.5,
            residual: 0.0,
            theta,
            volume: theta * 4.0,
            inflow: 4.0e-3,
            infiltration: 4.0e-3,
            rejected_infiltration: 0.0,
            evapotranspiration: -1.0e-3,
            recharge: -1.0e-3,
            lateral_discharge: -1.0e-3,
            surface_discharge: 0.0,
            storage_change: -1.0e-3,
        }
    }

    #[test]
    fn columns_follow_insertion_order() {
        let mut series = TimeSeries::new();
        assert!(series.is_empty());
        series.push(record(1.0, 0.1));
        series.push(record(2.0, 0.12));
        series.push(record(3.0, 0.13));

        assert_eq!(series.len(), 3);
        assert_eq!(series.times().as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(series.column(Column::Theta).as_slice(), &[0.1, 0.12, 0.13]);
        assert_eq!(series.at(2.0).map(|r| r.theta), Some(0.12));
        assert!(series.at(2.5).is_none());
        assert_eq!(series.unconverged().count(), 1);
    }

    #[test]
    fn lookup_tolerates_accumulated_time() {
        let mut series = TimeSeries::new();
        let mut time = 0.0;
        for theta in [0.1, 0.11, 0.12] {
            time += 0.1;
            series.push(record(time, theta));
        }
        assert_ne!(time, 0.3);
        assert_eq!(series.at(0.3).map(|r| r.theta), Some(0.12));
        assert_eq!(series.at(0.1).map(|r| r.theta), Some(0.1));
        assert!(series.at(0.25).is_none());
        assert_eq!(series.step(1).map(|r| r.theta), Some(0.11));
        assert!(series.step(3).is_none());
    }

    #[test]
    fn per_unit_area_only_scales_fluxes() {
        let mut series = TimeSeries::new();
        series.push(record(1.0, 0.1));
        let inflow = series.column_per_unit_area(Column::Inflow, 4.0);
        assert_relative_eq!(inflow[0], 1.0e-3);
        let theta = series.column_per_unit_area(Column::Theta, 4.0);
        assert_eq!(theta[0], 0.1);
    }

    #[test]
    fn balance_sums_residual_terms() {
        assert_relative_eq!(record(1.0, 0.1).balance(), 0.0);
    }
}
