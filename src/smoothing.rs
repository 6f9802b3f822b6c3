use nalgebra::DVector;

use crate::error::SoilError;

/// Half-width used when a configuration does not set one. Small enough to act
/// as a hard clamp while keeping a non-zero slope at the ramp ends.
pub const DEFAULT_OMEGA: f64 = 1.0e-6;

/// Widest half-width for which the two quadratic ends meet without overlap.
pub(crate) const MAX_EFFECTIVE_OMEGA: f64 = 0.5;

pub(crate) fn validate_omega(omega: f64) -> Result<(), SoilError> {
    if !omega.is_finite() || omega <= 0.0 {
        return Err(SoilError::parameter(
            "smoothing_omega",
            omega,
            "must be greater than zero",
        ));
    }
    if omega > 1.0 {
        return Err(SoilError::parameter(
            "smoothing_omega",
            omega,
            "must be less than or equal to one",
        ));
    }
    Ok(())
}

/// Quadratic smoother for a 0-1 saturation-style fraction.
///
/// Values outside [0, 1] clamp to exactly 0 or 1. Inside, the ends are
/// quadratic over a half-width `omega` and joined by a linear section of
/// slope 1/(1-omega), which makes the curve C1 at 0, omega, 1-omega and 1.
/// Half-widths above 0.5 are treated as 0.5.
pub fn quadratic_smoother(saturation: f64, omega: f64) -> Result<f64, SoilError> {
    validate_omega(omega)?;
    Ok(smooth(saturation, omega.min(MAX_EFFECTIVE_OMEGA)))
}

/// Element-wise [`quadratic_smoother`].
pub fn smooth_vector(saturation: &DVector<f64>, omega: f64) -> Result<DVector<f64>, SoilError> {
    validate_omega(omega)?;
    let omega = omega.min(MAX_EFFECTIVE_OMEGA);
    Ok(saturation.map(|s| smooth(s, omega)))
}

// omega must already be validated and capped
pub(crate) fn smooth(saturation: f64, omega: f64) -> f64 {
    let a_omega = 1.0 / (1.0 - omega);
    let factor = a_omega / (2.0 * omega);
    if saturation < 0.0 {
        0.0
    } else if saturation < omega {
        factor * saturation.powi(2)
    } else if saturation < 1.0 - omega {
        a_omega * saturation + 0.5 * (1.0 - a_omega)
    } else if saturation < 1.0 {
        1.0 - factor * (1.0 - saturation).powi(2)
    } else {
        1.0
    }
}
