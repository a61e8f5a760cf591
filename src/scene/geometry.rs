//! Geometry descriptor sets: the declarative mesh description a shape carries.
//!
//! A shape's renderable geometry is described by three independently populated
//! libraries (positions, normals, texture coordinates) indexed by unsigned
//! integers, plus an ordered list of primitive groups referencing the vertex
//! library. The descriptors are pure data produced by the parser; the mesh
//! synthesizer consumes them once and caches the result.

use cgmath::{Vector2, Vector3};

/// Library of vertex positions shared by all primitive groups of a shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexLibrary {
    /// Scale factor applied by the parser to all coordinates (e.g. mm vs m).
    pub unit: f32,
    pub vertices: Vec<Vector3<f32>>,
}

/// Library of per-vertex normals. Optional; derived from face normals when absent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalLibrary {
    pub normals: Vec<Vector3<f32>>,
}

/// Library of per-vertex texture coordinates. Optional.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TexCoordLibrary {
    pub coords: Vec<Vector2<f32>>,
}

/// Topology of one primitive group.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrimitiveMode {
    Triangles,
    Quads,
}

impl PrimitiveMode {
    /// Corners per primitive: 3 for triangles, 4 for quads.
    pub fn corners(self) -> usize {
        match self {
            PrimitiveMode::Triangles => 3,
            PrimitiveMode::Quads => 4,
        }
    }
}

/// An ordered batch of vertex-library indices sharing one topology.
///
/// The index stream is flat with stride [`PrimitiveMode::corners`]. When the
/// owning shape has a supplied normal library the stride doubles: every vertex
/// index is followed by its normal index, which must mirror it.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveGroup {
    pub mode: PrimitiveMode,
    pub indices: Vec<u32>,
}

impl PrimitiveGroup {
    pub fn new(mode: PrimitiveMode, indices: Vec<u32>) -> Self {
        Self { mode, indices }
    }

    /// Stream stride given whether normal indices are interleaved.
    pub fn stride(&self, normals_supplied: bool) -> usize {
        self.mode.corners() * if normals_supplied { 2 } else { 1 }
    }
}
