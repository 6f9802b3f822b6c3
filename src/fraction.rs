//! Activation fractions: how strongly each flux is "on" at a moisture content.
//!
//! Every fraction is a clamped linear ramp between two moisture thresholds,
//! passed through the quadratic smoother with the volume's half-width. The
//! moisture content is first capped at saturation so that solver probes
//! beyond capacity see a fully saturated profile.

use nalgebra::DVector;

use crate::params::ControlVolumeParams;
use crate::smoothing::smooth;

fn relative_fraction(theta: f64, theta_sat: f64, theta_low: f64, theta_high: f64) -> f64 {
    let theta = theta.min(theta_sat);
    if theta < theta_low {
        0.0
    } else if theta >= theta_high {
        1.0
    } else {
        (theta - theta_low) / (theta_high - theta_low)
    }
}

fn ramp(theta: f64, params: &ControlVolumeParams, theta_low: f64, theta_high: f64) -> f64 {
    smooth(
        relative_fraction(theta, params.theta_sat, theta_low, theta_high),
        params.smoothing_omega,
    )
}

/// Fraction of the pore space that is filled (0 → θsat).
pub fn saturation_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    ramp(theta, params, 0.0, params.theta_sat)
}

/// Deep recharge activation (θfc → θsat).
pub fn groundwater_recharge_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    ramp(theta, params, params.theta_fc, params.theta_sat)
}

/// Surface discharge activation (θdischarge → θsat).
pub fn surface_discharge_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    ramp(theta, params, params.theta_discharge, params.theta_sat)
}

/// Share of the infiltration capacity still open at the surface.
pub fn surface_infiltration_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    1.0 - surface_discharge_fraction(theta, params)
}

/// Lateral discharge activation (θfc → θsat).
pub fn lateral_discharge_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    ramp(theta, params, params.theta_fc, params.theta_sat)
}

/// Evapotranspiration activation (θwp → θpet_max).
pub fn pet_fraction(theta: f64, params: &ControlVolumeParams) -> f64 {
    ramp(theta, params, params.theta_wp, params.theta_pet_max)
}

/// Applies a scalar fraction function to every moisture content in `theta`.
pub fn fraction_vector(
    theta: &DVector<f64>,
    params: &ControlVolumeParams,
    fraction: fn(f64, &ControlVolumeParams) -> f64,
) -> DVector<f64> {
    theta.map(|t| fraction(t, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlVolumeConfig;
    use approx::assert_abs_diff_eq;

    const FRACTIONS: [fn(f64, &ControlVolumeParams) -> f64; 6] = [
        saturation_fraction,
        groundwater_recharge_fraction,
        surface_discharge_fraction,
        surface_infiltration_fraction,
        lateral_discharge_fraction,
        pet_fraction,
    ];

    fn params(omega: f64) -> ControlVolumeParams {
        ControlVolumeParams::new(&ControlVolumeConfig {
            smoothing_omega: omega,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn fractions_are_bounded() {
        for omega in [1.0e-6, 0.05, 0.5] {
            let params = params(omega);
            for theta in [-1.0e6, -1.0, 0.0, 0.005, 0.01, 0.05, 0.1, 0.15, 0.19, 0.2, 0.21, 3.0, 1.0e9] {
                for fraction in FRACTIONS {
                    let value = fraction(theta, &params);
                    assert!((0.0..=1.0).contains(&value), "theta={theta} value={value}");
                }
            }
        }
    }

    #[test]
    fn ramps_follow_thresholds() {
        let params = params(1.0e-6);
        assert_eq!(groundwater_recharge_fraction(0.05, &params), 0.0);
        assert_abs_diff_eq!(groundwater_recharge_fraction(0.15, &params), 0.5, epsilon = 1.0e-5);
        assert_eq!(groundwater_recharge_fraction(0.2, &params), 1.0);

        assert_eq!(surface_discharge_fraction(0.17, &params), 0.0);
        assert_abs_diff_eq!(surface_discharge_fraction(0.19, &params), 0.5, epsilon = 1.0e-5);
        assert_eq!(surface_infiltration_fraction(0.1, &params), 1.0);
        assert_eq!(surface_infiltration_fraction(0.2, &params), 0.0);

        assert_eq!(pet_fraction(0.005, &params), 0.0);
        assert_eq!(pet_fraction(params.theta_pet_max(), &params), 1.0);
        assert_abs_diff_eq!(saturation_fraction(0.05, &params), 0.25, epsilon = 1.0e-5);
    }

    #[test]
    fn overshoot_is_treated_as_saturated() {
        let params = params(0.1);
        for fraction in FRACTIONS {
            assert_eq!(fraction(0.2, &params), fraction(0.7, &params));
        }
    }

    #[test]
    fn vector_form_is_elementwise() {
        let params = params(0.05);
        let theta = DVector::from_vec(vec![0.0, 0.12, 0.19, 0.4]);
        let out = fraction_vector(&theta, &params, lateral_discharge_fraction);
        for (t, f) in theta.iter().zip(out.iter()) {
            assert_eq!(*f, lateral_discharge_fraction(*t, &params));
        }
    }
}
