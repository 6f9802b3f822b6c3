use std::fmt;
use std::str::FromStr;

use crate::error::SoilError;

/// Length unit shared by every length, rate and volume of a control volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthUnit {
    Meter,
    Centimeter,
    Inch,
    Foot,
}

impl LengthUnit {
    /// Factor converting a length in inches into this unit.
    pub fn inch_factor(self) -> f64 {
        match self {
            LengthUnit::Meter => 2.54 / 100.0,
            LengthUnit::Centimeter => 2.54,
            LengthUnit::Inch => 1.0,
            LengthUnit::Foot => 1.0 / 12.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LengthUnit::Meter => "m",
            LengthUnit::Centimeter => "cm",
            LengthUnit::Inch => "in",
            LengthUnit::Foot => "ft",
        }
    }
}

impl FromStr for LengthUnit {
    type Err = SoilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" => Ok(LengthUnit::Meter),
            "cm" => Ok(LengthUnit::Centimeter),
            "in" => Ok(LengthUnit::Inch),
            "ft" => Ok(LengthUnit::Foot),
            _ => Err(SoilError::InvalidLengthUnit(s.to_string())),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Time unit of the step length and of every rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Hour,
}

impl TimeUnit {
    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Day => "d",
            TimeUnit::Hour => "hr",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = SoilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d" => Ok(TimeUnit::Day),
            "hr" => Ok(TimeUnit::Hour),
            _ => Err(SoilError::InvalidTimeUnit(s.to_string())),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
