/// Display units for the reported volume
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StlError;

/// Source coordinates are millimetres, so raw volumes are mm³.
pub const MM3_PER_CM3: f64 = 1000.0;

pub const IN3_PER_CM3: f64 = 0.0610237441;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Cm,
    #[serde(alias = "in")]
    Inch,
}

impl Unit {
    pub fn is_metric(self) -> bool {
        matches!(self, Unit::Cm)
    }

    /// Convert a cm³ value for display in this unit
    pub fn from_cm3(self, volume_cm3: f64) -> f64 {
        match self {
            Unit::Cm => volume_cm3,
            Unit::Inch => cm3_to_inch3(volume_cm3),
        }
    }

    pub fn volume_suffix(self) -> &'static str {
        match self {
            Unit::Cm => "cm³",
            Unit::Inch => "in³",
        }
    }
}

pub fn cm3_to_inch3(volume_cm3: f64) -> f64 {
    volume_cm3 * IN3_PER_CM3
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Unit::Cm => "cm",
            Unit::Inch => "inch",
        })
    }
}

impl FromStr for Unit {
    type Err = StlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cm" => Ok(Unit::Cm),
            "inch" | "in" => Ok(Unit::Inch),
            _ => Err(StlError::unknown("unit", s)),
        }
    }
}
