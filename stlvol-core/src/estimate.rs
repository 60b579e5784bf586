/// One-shot volume and mass estimation over a binary STL source
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::StlError;
use crate::material::{Material, MaterialSelection};
use crate::stl::{BinaryMeshReader, CountByteOrder, CountPolicy, ReadOptions};
use crate::units::Unit;
use crate::volume::VolumeAccumulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstimateOptions {
    pub material: MaterialSelection,
    pub unit: Unit,
    pub count_byte_order: CountByteOrder,
    pub count_policy: CountPolicy,
}

impl EstimateOptions {
    pub fn new(material: impl Into<MaterialSelection>, unit: Unit) -> Self {
        Self {
            material: material.into(),
            unit,
            ..Default::default()
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            count_byte_order: self.count_byte_order,
            count_policy: self.count_policy,
        }
    }
}

/// Outcome of one estimation
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeResult {
    pub material: MaterialSelection,
    /// Facet count as declared in the file header
    pub triangle_count: i32,
    pub facets_read: usize,
    pub volume_cm3: f64,
    pub mass_grams: f64,
    pub unit: Unit,
}

impl VolumeResult {
    /// Volume in the requested unit
    pub fn display_volume(&self) -> f64 {
        self.unit.from_cm3(self.volume_cm3)
    }

    pub fn report(&self) -> VolumeReport {
        VolumeReport {
            material: self.material.material,
            triangles: self.triangle_count,
            mass: self.mass_grams,
            volume: self.unit.is_metric().then_some(self.volume_cm3),
        }
    }
}

/// Serialized shape of a successful estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeReport {
    pub material: Material,
    pub triangles: i32,
    pub mass: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Serialized shape of a failed estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub error: String,
}

impl From<&StlError> for ErrorReport {
    fn from(err: &StlError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Render either outcome as the single JSON document callers consume
pub fn to_json(outcome: &Result<VolumeResult, StlError>) -> serde_json::Value {
    let value = match outcome {
        Ok(result) => serde_json::to_value(result.report()),
        Err(err) => serde_json::to_value(ErrorReport::from(err)),
    };
    // Both shapes are plain structs of strings and numbers
    value.unwrap_or(serde_json::Value::Null)
}

/// Estimate from any byte stream positioned at the start of the file
pub fn estimate_reader<R: Read>(stream: R, options: &EstimateOptions) -> Result<VolumeResult, StlError> {
    let reader = BinaryMeshReader::open(stream, options.read_options())?;
    let triangle_count = reader.declared_count();

    let mut accumulator = VolumeAccumulator::new();
    accumulator.accumulate_fallible(reader)?;

    let facets_read = accumulator.facet_count();
    if i64::try_from(facets_read).ok() != Some(i64::from(triangle_count)) {
        warn!(
            declared = triangle_count,
            decoded = facets_read,
            "facet count in header does not match decoded facets"
        );
    }

    let material = options.material.material;
    let estimate = accumulator.finalize(material, options.unit);
    debug!(
        raw_mm3 = accumulator.raw_sum(),
        volume_cm3 = estimate.volume_cm3,
        mass_grams = estimate.mass_grams,
        %material,
        "estimate complete"
    );

    Ok(VolumeResult {
        material: options.material,
        triangle_count,
        facets_read,
        volume_cm3: estimate.volume_cm3,
        mass_grams: estimate.mass_grams,
        unit: options.unit,
    })
}

/// Estimate from a file on disk. The handle is closed on every return path.
pub fn estimate_file(path: impl AsRef<Path>, options: &EstimateOptions) -> Result<VolumeResult, StlError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening STL file");
    let file = File::open(path).map_err(|e| StlError::io(format!("failed to open '{}'", path.display()), e))?;
    estimate_reader(BufReader::new(file), options)
}

/// Estimate from an in-memory file image
pub fn estimate_bytes(data: &[u8], options: &EstimateOptions) -> Result<VolumeResult, StlError> {
    estimate_reader(data, options)
}
