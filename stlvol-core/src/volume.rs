/// Enclosed volume from signed tetrahedra
use nalgebra::Point3;

use crate::error::StlError;
use crate::geometry::Facet;
use crate::material::Material;
use crate::units::{Unit, MM3_PER_CM3};

/// Signed volume of the tetrahedron spanned by the origin and a triangle.
///
/// Positive for triangles wound counter-clockwise when seen from outside the
/// origin. Products are taken in `f64`.
pub fn signed_tetra_volume(p1: &Point3<f32>, p2: &Point3<f32>, p3: &Point3<f32>) -> f64 {
    let (x1, y1, z1) = (p1.x as f64, p1.y as f64, p1.z as f64);
    let (x2, y2, z2) = (p2.x as f64, p2.y as f64, p2.z as f64);
    let (x3, y3, z3) = (p3.x as f64, p3.y as f64, p3.z as f64);

    let v321 = x3 * y2 * z1;
    let v231 = x2 * y3 * z1;
    let v312 = x3 * y1 * z2;
    let v132 = x1 * y3 * z2;
    let v213 = x2 * y1 * z3;
    let v123 = x1 * y2 * z3;

    (1.0 / 6.0) * (-v321 + v231 + v312 - v132 - v213 + v123)
}

/// Running sum of signed facet volumes for a single computation
#[derive(Debug, Clone, Default)]
pub struct VolumeAccumulator {
    sum: f64,
    facets: usize,
}

impl VolumeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, facet: &Facet) {
        self.sum += signed_tetra_volume(facet.p1(), facet.p2(), facet.p3());
        self.facets += 1;
    }

    /// Add every facet in encounter order
    pub fn accumulate<'a, I>(&mut self, facets: I)
    where
        I: IntoIterator<Item = &'a Facet>,
    {
        for facet in facets {
            self.add(facet);
        }
    }

    /// Add facets from a fallible source, stopping at the first error
    pub fn accumulate_fallible<I>(&mut self, facets: I) -> Result<(), StlError>
    where
        I: IntoIterator<Item = Result<Facet, StlError>>,
    {
        for facet in facets {
            self.add(&facet?);
        }
        Ok(())
    }

    /// Raw sum in source units (mm³)
    pub fn raw_sum(&self) -> f64 {
        self.sum
    }

    pub fn facet_count(&self) -> usize {
        self.facets
    }

    pub fn finalize(&self, material: Material, unit: Unit) -> VolumeEstimate {
        finalize(self.sum, material, unit)
    }
}

/// Volume and mass derived from a raw signed-volume sum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEstimate {
    pub volume_cm3: f64,
    pub mass_grams: f64,
    /// `volume_cm3` expressed in the requested display unit
    pub display_volume: f64,
    pub unit: Unit,
}

pub fn finalize(raw_sum: f64, material: Material, unit: Unit) -> VolumeEstimate {
    let volume_cm3 = raw_sum / MM3_PER_CM3;
    VolumeEstimate {
        volume_cm3,
        mass_grams: volume_cm3 * material.density(),
        display_volume: unit.from_cm3(volume_cm3),
        unit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Mesh;

    fn cube_volume(mesh: &Mesh) -> f64 {
        let mut acc = VolumeAccumulator::new();
        acc.accumulate(&mesh.facets);
        acc.raw_sum()
    }

    #[test]
    fn test_unit_tetrahedron() {
        let v = signed_tetra_volume(
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
            &Point3::new(0.0, 0.0, 1.0),
        );
        assert!((v - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_flat_triangle_through_origin_is_zero() {
        let v = signed_tetra_volume(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(v, 0.0);
    }

    #[test]
    fn test_cube_volume() {
        let cube = Mesh::cube(10.0);
        let raw = cube_volume(&cube);
        assert!((raw - 1000.0).abs() < 1e-6, "raw volume {}", raw);

        let estimate = finalize(raw, Material::Abs, Unit::Cm);
        assert!((estimate.volume_cm3 - 1.0).abs() < 1e-9);
        assert!((estimate.mass_grams - 1.04).abs() < 1e-9);
    }

    #[test]
    fn test_reversed_winding_negates_volume() {
        let cube = Mesh::cube(10.0);
        let forward = cube_volume(&cube);
        let backward = cube_volume(&cube.reversed());
        assert!(forward > 0.0);
        assert!((forward + backward).abs() < 1e-9);
    }

    #[test]
    fn test_volume_is_translation_invariant_for_closed_mesh() {
        let cube = Mesh::cube(10.0);
        let shifted: Mesh = cube
            .facets
            .iter()
            .map(|f| {
                let offset = nalgebra::Vector3::new(25.0, -40.0, 7.5);
                Facet::new(f.normal, *f.p1() + offset, *f.p2() + offset, *f.p3() + offset)
            })
            .collect();
        assert!((cube_volume(&shifted) - 1000.0).abs() < 1e-3);
    }

    #[test]
    fn test_mass_uses_density_for_every_material() {
        for material in Material::ALL {
            let estimate = finalize(2500.0, material, Unit::Cm);
            assert_eq!(estimate.volume_cm3, 2.5);
            assert_eq!(estimate.mass_grams, 2.5 * material.density());
        }
    }

    #[test]
    fn test_inch_display_does_not_change_mass() {
        let metric = finalize(1000.0, Material::Pla, Unit::Cm);
        let imperial = finalize(1000.0, Material::Pla, Unit::Inch);
        assert_eq!(metric.volume_cm3, imperial.volume_cm3);
        assert_eq!(metric.mass_grams, imperial.mass_grams);
        assert!((imperial.display_volume - 0.0610237441).abs() < 1e-12);
    }

    #[test]
    fn test_accumulate_fallible_stops_on_error() {
        let cube = Mesh::cube(10.0);
        let mut source: Vec<Result<Facet, StlError>> = cube.facets.iter().copied().map(Ok).collect();
        source.insert(
            3,
            Err(StlError::io(
                "failed to read facet 3",
                std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            )),
        );

        let mut acc = VolumeAccumulator::new();
        assert!(acc.accumulate_fallible(source).is_err());
        assert_eq!(acc.facet_count(), 3);
    }
}
