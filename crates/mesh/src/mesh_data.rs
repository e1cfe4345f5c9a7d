use std::collections::HashMap;

use thiserror::Error;

use crate::{
    geometry::{Bounds, Triangle, Vector3},
    TriangleMesh,
};

/// Maintains geometry for a single facet.
///
/// The points here are only indices into the owning mesh's vertex list. We do this so we can
/// store each corner as 4 bytes instead of the 12 bytes required to store the entire Vector3,
/// with further savings whenever a vertex is shared by neighbouring facets (which, for a closed
/// scan surface, is almost always).
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Facet {
    pub p0: u32,
    pub p1: u32,
    pub p2: u32,
}

impl Facet {
    pub fn new(p0: u32, p1: u32, p2: u32) -> Self {
        Self { p0, p1, p2 }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.p0, self.p1, self.p2]
    }

    fn offset(&self, by: u32) -> Self {
        Self::new(self.p0 + by, self.p1 + by, self.p2 + by)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("facet {facet} references vertex {index} but the mesh only has {vertices} vertices")]
    IndexOutOfRange {
        facet: usize,
        index: u32,
        vertices: usize,
    },

    #[error("mesh has {0} vertices which exceeds the u32 index range")]
    TooManyVertices(usize),
}

/// An indexed triangle surface.
///
/// Every facet index is guaranteed to be in bounds for `vertices` when the mesh is built through
/// [`MeshData::new`], [`TriangleMesh::from_triangles`] or [`MeshData::concatenate`]. Note that an
/// empty mesh is still a well-formed `MeshData`; whether an empty surface is acceptable is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    vertices: Vec<Vector3>,
    faces: Vec<Facet>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vector3>, faces: Vec<Facet>) -> Result<Self, MeshError> {
        let mesh = Self { vertices, faces };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Checks that every facet only references existing vertices.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.vertices.len() > u32::MAX as usize {
            return Err(MeshError::TooManyVertices(self.vertices.len()));
        }
        let n = self.vertices.len();
        for (facet, f) in self.faces.iter().enumerate() {
            if let Some(index) = f.indices().into_iter().find(|i| *i as usize >= n) {
                return Err(MeshError::IndexOutOfRange {
                    facet,
                    index,
                    vertices: n,
                });
            }
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Vector3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Facet] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True when the mesh has no vertices or no faces, ie. it does not describe a surface.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Iterates the facets resolved to their vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces.iter().map(|f| Triangle {
            p0: self.vertices[f.p0 as usize],
            p1: self.vertices[f.p1 as usize],
            p2: self.vertices[f.p2 as usize],
        })
    }

    /// Returns the bounding box of all vertices, or `None` for a mesh without vertices.
    pub fn bounds(&self) -> Option<Bounds> {
        let (first, rest) = self.vertices.split_first()?;
        let mut bounds = Bounds::from_point(*first);
        for p in rest {
            bounds.include(*p);
        }
        Some(bounds)
    }

    /// Builds a single mesh holding the geometry of both inputs.
    ///
    /// Vertices of `b` are appended after those of `a` and the facets of `b` are re-indexed
    /// accordingly. No vertices are merged across the two inputs.
    pub fn concatenate(a: &MeshData, b: &MeshData) -> Result<MeshData, MeshError> {
        let total = a.vertices.len() + b.vertices.len();
        if total > u32::MAX as usize {
            return Err(MeshError::TooManyVertices(total));
        }
        let offset = a.vertices.len() as u32;

        let mut vertices = Vec::with_capacity(total);
        vertices.extend_from_slice(&a.vertices);
        vertices.extend_from_slice(&b.vertices);

        let mut faces = Vec::with_capacity(a.faces.len() + b.faces.len());
        faces.extend_from_slice(&a.faces);
        faces.extend(b.faces.iter().map(|f| f.offset(offset)));

        Ok(MeshData { vertices, faces })
    }
}

// Positions are welded by their exact bit pattern. Both zeros map to the same key so that a
// vertex written as -0.0 by one facet and 0.0 by its neighbour is still shared.
fn weld_key(p: &Vector3) -> [u32; 3] {
    let bits = |f: f32| if f == 0.0 { 0 } else { f.to_bits() };
    [bits(p.x), bits(p.y), bits(p.z)]
}

impl TriangleMesh for MeshData {
    /// STL style input provides one point for every facet corner. Identical points are merged
    /// so that the resulting facets share vertices.
    fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut lookup: HashMap<[u32; 3], u32> = HashMap::with_capacity(triangles.len());
        let mut vertices = Vec::with_capacity(triangles.len() / 2 + 3);
        let mut faces = Vec::with_capacity(triangles.len());

        let mut index_of = |p: Vector3| -> u32 {
            *lookup.entry(weld_key(&p)).or_insert_with(|| {
                vertices.push(p);
                (vertices.len() - 1) as u32
            })
        };
        for t in triangles {
            let p0 = index_of(t.p0);
            let p1 = index_of(t.p1);
            let p2 = index_of(t.p2);
            faces.push(Facet { p0, p1, p2 });
        }

        MeshData { vertices, faces }
    }

    fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}
