/// stlvol core library - binary STL decoding and volume/mass estimation
///
/// This library reads binary STL meshes as a lazy stream of facets, sums the
/// signed tetrahedron volume of every facet and converts the result into a
/// volume in cm³ and a printed mass for a chosen material.

pub mod error;
pub mod estimate;
pub mod geometry;
pub mod material;
pub mod stl;
pub mod units;
pub mod volume;

// Re-export commonly used types
pub use error::StlError;
pub use estimate::{estimate_bytes, estimate_file, estimate_reader, to_json, EstimateOptions, VolumeReport, VolumeResult};
pub use geometry::{Facet, Mesh};
pub use material::{Material, MaterialSelection};
pub use stl::{BinaryMeshReader, CountByteOrder, CountPolicy, ReadOptions};
pub use units::Unit;
pub use volume::{signed_tetra_volume, VolumeAccumulator, VolumeEstimate};
