use std::io;

/// Errors raised while configuring or driving a control volume.
///
/// Solver non-convergence is not an error: it is recorded on the step's
/// output row instead.
#[derive(Debug, thiserror::Error)]
pub enum SoilError {
    #[error("invalid value for '{field}' ({value}): {reason}")]
    InvalidParameter {
        field: &'static str,
        value: f64,
        reason: String,
    },

    #[error("invalid soil type ({0}). Valid soil types are '{1}'")]
    InvalidSoil(String, String),

    #[error("invalid length unit ({0}). Valid length units are 'm, cm, in, ft'")]
    InvalidLengthUnit(String),

    #[error("invalid time unit ({0}). Valid time units are 'd, hr'")]
    InvalidTimeUnit(String),

    #[error("invalid infiltration method ({0}). Valid methods are 'constant, cumulative'")]
    InvalidInfiltrationMethod(String),

    #[error("invalid step input '{field}' ({value}): {reason}")]
    InvalidInput {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("cannot {action} while the control volume is {phase}")]
    InvalidState {
        action: &'static str,
        phase: &'static str,
    },

    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SoilError {
    pub(crate) fn parameter(field: &'static str, value: f64, reason: impl Into<String>) -> Self {
        SoilError::InvalidParameter {
            field,
            value,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_error_names_field_and_value() {
        let err = SoilError::parameter("theta_fc", 0.3, "must be less than theta_sat (0.2)");
        let msg = err.to_string();
        assert!(msg.contains("theta_fc"));
        assert!(msg.contains("0.3"));
    }
}
