/// Print materials and their densities
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StlError;

/// Filament material used to turn a volume into a mass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Material {
    #[default]
    #[serde(rename = "ABS")]
    Abs,
    #[serde(rename = "PLA")]
    Pla,
    #[serde(rename = "CFRP")]
    Cfrp,
    Plexiglass,
}

impl Material {
    pub const ALL: [Material; 4] = [Material::Abs, Material::Pla, Material::Cfrp, Material::Plexiglass];

    /// Density in g/cm³
    pub fn density(self) -> f64 {
        match self {
            Material::Abs => 1.04,
            Material::Pla => 1.25,
            Material::Cfrp => 1.79,
            Material::Plexiglass => 1.18,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Material::Abs => "ABS",
            Material::Pla => "PLA",
            Material::Cfrp => "CFRP",
            Material::Plexiglass => "Plexiglass",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strict, case-sensitive parse. Use [`MaterialSelection::from_selector`]
/// for the permissive behaviour the estimator exposes.
impl FromStr for Material {
    type Err = StlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| StlError::unknown("material", s))
    }
}

/// A material chosen from user input, remembering whether the input had to be
/// replaced by the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialSelection {
    pub material: Material,
    pub used_default: bool,
}

impl MaterialSelection {
    pub fn exact(material: Material) -> Self {
        Self {
            material,
            used_default: false,
        }
    }

    /// Unrecognized selectors fall back to ABS instead of failing.
    pub fn from_selector(selector: &str) -> Self {
        match selector.parse::<Material>() {
            Ok(material) => Self::exact(material),
            Err(_) => Self {
                material: Material::default(),
                used_default: true,
            },
        }
    }
}

impl From<Material> for MaterialSelection {
    fn from(material: Material) -> Self {
        Self::exact(material)
    }
}
