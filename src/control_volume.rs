use crate::config::ControlVolumeConfig;
use crate::error::SoilError;
use crate::flow::{
    evapotranspiration_volumetric_rate, infiltration_volumetric_rate, inflow_volumetric_rate,
    lateral_volumetric_rate, recharge_volumetric_rate, storage_change_rate,
    surface_discharge_volumetric_rate,
};
use crate::forcing::Forcing;
use crate::infiltration::{Infiltration, InfiltrationModel};
use crate::newton::{forward_difference, newton_raphson_bounded};
use crate::output::{StepRecord, TimeSeries};
use crate::params::ControlVolumeParams;

/// Where a control volume is within its advance → solve → output cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Advanced,
    Solved,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Advanced => "advanced",
            Phase::Solved => "solved",
        }
    }
}

/// A lumped soil bucket stepped sequentially through time.
///
/// Each step solves for the moisture content whose fluxes conserve volume
/// over the step and appends one [`StepRecord`] to the time series. A
/// volume and its infiltration model carry running state, so one instance
/// must be driven by a single sequence of steps. Separate volumes share
/// nothing and can be run on separate threads.
#[derive(Debug, Clone)]
pub struct ControlVolume {
    params: ControlVolumeParams,
    infiltration: InfiltrationModel,

    theta: f64,       // Moisture content [-]
    theta0: f64,      // Moisture content at the start of the step [-]
    inflow_rate: f64, // Infiltration supply [L/T]
    pet_rate: f64,    // Potential evapotranspiration [L/T]
    delta_t: f64,     // Step length [T]
    elapsed_time: f64,

    iterations: usize,
    residual: f64,
    converged: bool,
    phase: Phase,

    outputs: TimeSeries,
}

impl ControlVolume {
    pub fn new(config: &ControlVolumeConfig) -> Result<Self, SoilError> {
        let params = ControlVolumeParams::new(config)?;
        let infiltration = InfiltrationModel::new(
            config.infiltration_method.parse()?,
            config.soil.as_deref(),
            &params,
        )?;
        Ok(ControlVolume {
            params,
            infiltration,
            theta: config.theta0,
            theta0: config.theta0,
            inflow_rate: 0.0,
            pet_rate: 0.0,
            delta_t: 0.0,
            elapsed_time: 0.0,
            iterations: 0,
            residual: 0.0,
            converged: true,
            phase: Phase::Idle,
            outputs: TimeSeries::new(),
        })
    }

    /// Runs one full step: [`advance`](Self::advance), [`solve`](Self::solve),
    /// [`output`](Self::output).
    pub fn update(&mut self, inflow_rate: f64, pet_rate: f64, delta_t: f64) -> Result<(), SoilError> {
        self.advance(inflow_rate, pet_rate, delta_t)?;
        self.solve()?;
        self.output()
    }

    /// Steps once per forcing entry.
    pub fn run(&mut self, forcing: &Forcing) -> Result<(), SoilError> {
        for step in 0..forcing.steps() {
            self.update(
                forcing.inflow_for_step(step),
                forcing.pet_for_step(step),
                forcing.dt,
            )?;
        }
        Ok(())
    }

    /// Starts a step: keeps the current moisture content as the step's
    /// starting point and stages the step's inputs.
    pub fn advance(&mut self, inflow_rate: f64, pet_rate: f64, delta_t: f64) -> Result<(), SoilError> {
        self.expect_phase(Phase::Idle, "advance")?;
        check_input("inflow_rate", inflow_rate, inflow_rate >= 0.0, "must be non-negative")?;
        check_input("pet_rate", pet_rate, pet_rate >= 0.0, "must be non-negative")?;
        check_input("delta_t", delta_t, delta_t > 0.0, "must be greater than zero")?;

        self.theta0 = self.theta;
        self.inflow_rate = inflow_rate;
        self.pet_rate = pet_rate;
        self.delta_t = delta_t;
        self.elapsed_time += delta_t;
        self.phase = Phase::Advanced;
        Ok(())
    }

    /// Finds the moisture content that zeroes the residual for the staged
    /// step. Failing to converge is recorded, not raised.
    pub fn solve(&mut self) -> Result<(), SoilError> {
        self.expect_phase(Phase::Advanced, "solve")?;

        let delta = self.params.finite_difference_step;
        let theta_sat = self.params.theta_sat;
        // forward differences taken at saturation would only see the clamped plateau
        let guess = self.theta.clamp(0.0, (theta_sat - delta).max(0.0));

        let residual = |theta: f64| self.residual(theta);
        let result = newton_raphson_bounded(
            residual,
            |theta| forward_difference(residual, theta, delta),
            guess,
            self.params.tolerance,
            self.params.max_iterations,
            (0.0, theta_sat),
        );

        let theta = result.x.clamp(0.0, theta_sat);
        let final_residual = if theta == result.x {
            result.residual
        } else {
            self.residual(theta)
        };

        self.theta = theta;
        self.iterations = result.iterations;
        self.residual = final_residual;
        self.converged = result.converged && final_residual.abs() <= self.params.tolerance;
        self.phase = Phase::Solved;

        if !self.converged {
            log::warn!(
                "step ending at t = {} did not converge: residual {:e} after {} iterations (theta = {})",
                self.elapsed_time,
                self.residual,
                self.iterations,
                self.theta
            );
        }
        Ok(())
    }

    /// Evaluates every flux at the committed moisture content and appends
    /// the step to the time series.
    pub fn output(&mut self) -> Result<(), SoilError> {
        self.expect_phase(Phase::Solved, "output")?;

        let record = self.step_record(self.theta);
        self.infiltration
            .commit(self.inflow_rate, self.theta, self.elapsed_time);

        log::debug!(
            "t = {:.6}: theta = {:.6}, iterations = {}, residual = {:.3e}",
            record.time,
            record.theta,
            record.iterations,
            record.residual
        );
        self.outputs.push(record);
        self.phase = Phase::Idle;
        Ok(())
    }

    /// Signed sum of every volumetric flux for the staged step at a candidate
    /// moisture content. Zero when volume is conserved.
    pub fn residual(&self, theta: f64) -> f64 {
        let params = &self.params;
        infiltration_volumetric_rate(
            theta,
            self.inflow_rate,
            self.elapsed_time,
            &self.infiltration,
            params,
        ) + evapotranspiration_volumetric_rate(theta, self.pet_rate, params)
            + recharge_volumetric_rate(theta, params)
            + lateral_volumetric_rate(theta, params)
            + surface_discharge_volumetric_rate(theta, params)
            + storage_change_rate(theta, self.theta0, self.delta_t, params)
    }

    fn step_record(&self, theta: f64) -> StepRecord {
        let params = &self.params;
        let inflow = inflow_volumetric_rate(self.inflow_rate, params);
        let infiltration = infiltration_volumetric_rate(
            theta,
            self.inflow_rate,
            self.elapsed_time,
            &self.infiltration,
            params,
        );
        StepRecord {
            time: self.elapsed_time,
            iterations: self.iterations,
            converged: self.converged,
            residual: self.residual,
            theta,
            volume: params.volume(theta),
            inflow,
            infiltration,
            rejected_infiltration: -(inflow - infiltration),
            evapotranspiration: evapotranspiration_volumetric_rate(theta, self.pet_rate, params),
            recharge: recharge_volumetric_rate(theta, params),
            lateral_discharge: lateral_volumetric_rate(theta, params),
            surface_discharge: surface_discharge_volumetric_rate(theta, params),
            storage_change: storage_change_rate(theta, self.theta0, self.delta_t, params),
        }
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), SoilError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SoilError::InvalidState {
                action,
                phase: self.phase.name(),
            })
        }
    }

    pub fn params(&self) -> &ControlVolumeParams {
        &self.params
    }

    pub fn infiltration(&self) -> &InfiltrationModel {
        &self.infiltration
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn theta0(&self) -> f64 {
        self.theta0
    }

    pub fn volume(&self) -> f64 {
        self.params.volume(self.theta)
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Residual left by the last solve.
    pub fn last_residual(&self) -> f64 {
        self.residual
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn time_series(&self) -> &TimeSeries {
        &self.outputs
    }
}

fn check_input(field: &'static str, value: f64, ok: bool, reason: &'static str) -> Result<(), SoilError> {
    if value.is_finite() && ok {
        Ok(())
    } else {
        Err(SoilError::InvalidInput { field, value, reason })
    }
}
