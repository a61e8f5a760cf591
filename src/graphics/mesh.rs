//! Mesh synthesis: turns a geometry descriptor set into a drawable mesh.
//!
//! Synthesis runs at most once per shape, lazily from the render path, and
//! caches the resulting [`MeshHandle`] on the shape. It derives missing
//! per-vertex normals by face-normal accumulation, splits quads into
//! triangles with a fixed winding, interleaves the vertex attributes into one
//! of the two supported layouts and requests the backend buffers.
//!
//! Out-of-range vertex indices are clamped to 0 and rewritten in place. Scene
//! files are often hand edited; producing a visually wrong mesh beats taking
//! the running simulation down, so this stays a warning rather than an error.

use cgmath::{InnerSpace, Vector3};
use log::warn;

use crate::graphics::{
    GraphicsContext, MeshHandle, Topology, VertexData, VertexPn, VertexPnt,
};
use crate::scene::geometry::{NormalLibrary, PrimitiveGroup, PrimitiveMode};
use crate::scene::graphical::ComplexAppearance;

impl ComplexAppearance {
    /// Returns the drawable mesh for this shape, synthesizing it on first call.
    ///
    /// Subsequent calls return the cached handle without re-deriving normals
    /// or rebuilding buffers. Preconditions (a vertex library and at least one
    /// primitive group) are enforced by the parser.
    pub fn ensure_mesh(&mut self, ctx: &mut dyn GraphicsContext) -> MeshHandle {
        if let Some(mesh) = self.mesh {
            return mesh;
        }

        debug_assert!(self.vertices.is_some(), "mesh synthesis without vertex library");
        debug_assert!(!self.primitive_groups.is_empty(), "mesh synthesis without primitives");

        let vertex_count = self.vertices.as_ref().map_or(0, |v| v.vertices.len());
        if vertex_count == 0 {
            // Nothing sensible to build; an empty mesh keeps the draw path total.
            warn!("shape {:?} has no vertices, synthesizing empty mesh", self.name);
            let vb = ctx.request_vertex_buffer(VertexData::Plain(Vec::new()));
            let ib = ctx.request_index_buffer(Vec::new());
            let mesh = ctx.request_mesh(vb, ib, Topology::TriangleList);
            self.mesh = Some(mesh);
            return mesh;
        }

        if !self.normals_supplied() {
            let vertices = &self.vertices.as_ref().unwrap().vertices;
            self.normals = Some(derive_normals(vertices, &mut self.primitive_groups));
        }

        let with_tex_coords = self.tex_coords.is_some()
            && self.surface.as_ref().map_or(false, |s| s.texture.is_some());

        let vertices = &self.vertices.as_ref().unwrap().vertices;
        let normals = self.normals.as_ref().unwrap();
        let data = if with_tex_coords {
            let coords = &self.tex_coords.as_ref().unwrap().coords;
            debug_assert_eq!(coords.len(), vertex_count);
            VertexData::Textured(
                (0..vertex_count)
                    .map(|i| VertexPnt {
                        position: vertices[i].into(),
                        normal: normal_at(normals, i),
                        tex_coords: coords.get(i).map_or([0.0; 2], |c| (*c).into()),
                    })
                    .collect(),
            )
        } else {
            VertexData::Plain(
                (0..vertex_count)
                    .map(|i| VertexPn {
                        position: vertices[i].into(),
                        normal: normal_at(normals, i),
                    })
                    .collect(),
            )
        };

        let mut indices = Vec::new();
        let normals_supplied = self.normals_supplied();
        for group in &mut self.primitive_groups {
            emit_triangles(group, normals_supplied, vertex_count, &mut indices);
        }

        let vertex_buffer = ctx.request_vertex_buffer(data);
        let index_buffer = ctx.request_index_buffer(indices);
        let mesh = ctx.request_mesh(vertex_buffer, index_buffer, Topology::TriangleList);
        self.mesh = Some(mesh);
        mesh
    }
}

fn normal_at(library: &NormalLibrary, i: usize) -> [f32; 3] {
    library.normals.get(i).copied().unwrap_or(Vector3::new(0.0, 0.0, 0.0)).into()
}

/// Derives a normal library by accumulating face normals into every corner.
///
/// Each primitive contributes its geometric face normal, computed from two
/// edge vectors of its first three corners, to every participating vertex;
/// afterwards every vertex normal is the average of its contributions.
/// Vertices touched by zero faces keep a zero normal. Out-of-range indices
/// are clamped to 0 and rewritten in the stream.
fn derive_normals(
    vertices: &[Vector3<f32>],
    groups: &mut [PrimitiveGroup],
) -> NormalLibrary {
    let vertex_count = vertices.len();
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); vertex_count];
    let mut contributions = vec![0u32; vertex_count];

    for group in groups {
        let corners = group.mode.corners();
        debug_assert_eq!(group.indices.len() % corners, 0, "truncated index stream");
        let mut clamped = false;
        for primitive in group.indices.chunks_mut(corners) {
            for index in primitive.iter_mut() {
                if *index as usize >= vertex_count {
                    *index = 0;
                    clamped = true;
                }
            }

            let p1 = vertices[primitive[0] as usize];
            let p2 = vertices[primitive[1] as usize];
            let p3 = vertices[primitive[2] as usize];
            let mut n = (p2 - p1).cross(p3 - p1);
            let len = n.magnitude();
            // Degenerate faces contribute a zero normal instead of NaNs.
            if len != 0.0 {
                n /= len;
            }

            for &index in primitive.iter() {
                sums[index as usize] += n;
                contributions[index as usize] += 1;
            }
        }
        if clamped {
            warn!(
                "primitive group references vertices beyond library size {}, clamped to 0",
                vertex_count
            );
        }
    }

    let normals = sums
        .into_iter()
        .zip(contributions)
        .map(|(sum, count)| if count > 0 { sum / count as f32 } else { sum })
        .collect();
    NormalLibrary { normals }
}

/// Appends the flat triangle list of one primitive group.
///
/// Triangle groups pass through 1:1; every quad is split into the triangles
/// `(i1, i2, i3)` and `(i3, i4, i1)`. That corner order fixes the winding and
/// must not change, or scenes render with different tie-breaks. Streams with
/// supplied normals interleave a normal index after every vertex index; the
/// normal indices must mirror the vertex indices and are skipped.
fn emit_triangles(
    group: &mut PrimitiveGroup,
    normals_supplied: bool,
    vertex_count: usize,
    indices: &mut Vec<u32>,
) {
    let corners = group.mode.corners();
    let stride = group.stride(normals_supplied);
    let step = if normals_supplied { 2 } else { 1 };
    debug_assert_eq!(group.indices.len() % stride, 0, "truncated index stream");

    let mut clamped = false;
    for primitive in group.indices.chunks_mut(stride) {
        let mut corner = [0u32; 4];
        for c in 0..corners {
            let at = c * step;
            debug_assert!(
                !normals_supplied || primitive[at] == primitive[at + 1],
                "normal index must mirror its vertex index"
            );
            if primitive[at] as usize >= vertex_count {
                primitive[at] = 0;
                if normals_supplied {
                    primitive[at + 1] = 0;
                }
                clamped = true;
            }
            corner[c] = primitive[at];
        }

        match group.mode {
            PrimitiveMode::Triangles => {
                indices.extend_from_slice(&corner[..3]);
            }
            PrimitiveMode::Quads => {
                indices.extend_from_slice(&[corner[0], corner[1], corner[2]]);
                indices.extend_from_slice(&[corner[2], corner[3], corner[0]]);
            }
        }
    }
    if clamped {
        warn!(
            "primitive group references vertices beyond library size {}, clamped to 0",
            vertex_count
        );
    }
}
