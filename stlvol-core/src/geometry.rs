/// Geometry primitives for binary STL meshes
use nalgebra::{Point3, Vector3};

/// One triangular surface element as stored in a binary STL record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub normal: Vector3<f32>,
    pub vertices: [Point3<f32>; 3],
    /// Attribute byte count. Opaque, carried through unchanged.
    pub attribute: i16,
}

impl Facet {
    pub fn new(normal: Vector3<f32>, p1: Point3<f32>, p2: Point3<f32>, p3: Point3<f32>) -> Self {
        Self {
            normal,
            vertices: [p1, p2, p3],
            attribute: 0,
        }
    }

    /// Build a facet whose normal is derived from the vertex winding
    pub fn from_vertices(p1: Point3<f32>, p2: Point3<f32>, p3: Point3<f32>) -> Self {
        let mut facet = Self::new(Vector3::zeros(), p1, p2, p3);
        facet.normal = facet.calculate_normal();
        facet
    }

    pub fn with_attribute(mut self, attribute: i16) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn p1(&self) -> &Point3<f32> {
        &self.vertices[0]
    }

    pub fn p2(&self) -> &Point3<f32> {
        &self.vertices[1]
    }

    pub fn p3(&self) -> &Point3<f32> {
        &self.vertices[2]
    }

    /// Calculate the face normal from the triangle's vertices.
    ///
    /// Degenerate triangles have no direction and yield the zero vector.
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];

        edge1
            .cross(&edge2)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// The same triangle with opposite winding and a flipped normal
    pub fn reversed(&self) -> Self {
        Self {
            normal: -self.normal,
            vertices: [self.vertices[0], self.vertices[2], self.vertices[1]],
            attribute: self.attribute,
        }
    }
}

/// A mesh as an ordered list of facets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub facets: Vec<Facet>,
}

impl Mesh {
    pub fn new() -> Self {
        Self { facets: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            facets: Vec::with_capacity(capacity),
        }
    }

    pub fn add_facet(&mut self, facet: Facet) {
        self.facets.push(facet);
    }

    pub fn len(&self) -> usize {
        self.facets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Copy of the mesh with every facet's winding reversed
    pub fn reversed(&self) -> Self {
        Self {
            facets: self.facets.iter().map(Facet::reversed).collect(),
        }
    }

    /// Closed, outward-wound cube centred on the origin with edge length `size`
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let p = |x: f32, y: f32, z: f32| Point3::new(x * h, y * h, z * h);
        let mut mesh = Self::with_capacity(12);

        // Each face as two triangles, counter-clockwise seen from outside
        let quads = [
            // Front (+z)
            [p(-1.0, -1.0, 1.0), p(1.0, -1.0, 1.0), p(1.0, 1.0, 1.0), p(-1.0, 1.0, 1.0)],
            // Back (-z)
            [p(-1.0, -1.0, -1.0), p(-1.0, 1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, -1.0, -1.0)],
            // Top (+y)
            [p(-1.0, 1.0, -1.0), p(-1.0, 1.0, 1.0), p(1.0, 1.0, 1.0), p(1.0, 1.0, -1.0)],
            // Bottom (-y)
            [p(-1.0, -1.0, -1.0), p(1.0, -1.0, -1.0), p(1.0, -1.0, 1.0), p(-1.0, -1.0, 1.0)],
            // Right (+x)
            [p(1.0, -1.0, -1.0), p(1.0, 1.0, -1.0), p(1.0, 1.0, 1.0), p(1.0, -1.0, 1.0)],
            // Left (-x)
            [p(-1.0, -1.0, -1.0), p(-1.0, -1.0, 1.0), p(-1.0, 1.0, 1.0), p(-1.0, 1.0, -1.0)],
        ];

        for [a, b, c, d] in quads {
            mesh.add_facet(Facet::from_vertices(a, b, c));
            mesh.add_facet(Facet::from_vertices(a, c, d));
        }

        mesh
    }
}

impl FromIterator<Facet> for Mesh {
    fn from_iter<I: IntoIterator<Item = Facet>>(iter: I) -> Self {
        Self {
            facets: iter.into_iter().collect(),
        }
    }
}
