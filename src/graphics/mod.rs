//! Abstract rendering interface and GPU-facing data layouts.
//!
//! The simulation core never talks to a GPU directly. Everything that has to
//! end up on screen goes through the [`GraphicsContext`] trait: an opaque
//! resource factory (vertex/index buffers, combined meshes) plus a draw
//! submission sink. A backend implements the trait; the core only hands over
//! `bytemuck`-castable vertex data and opaque handles.
//!
//! # Key types
//!
//! - [`GraphicsContext`] is the resource factory / draw sink implemented by a backend
//! - [`VertexPn`] / [`VertexPnt`] are the two interleaved vertex layouts
//! - [`VertexData`] selects exactly one of the two layouts for a buffer
//! - [`MeshHandle`] (and friends) are non-owning ids for backend resources

pub mod mesh;

use cgmath::Matrix4;

use crate::scene::graphical::Surface;

/// Interleaved vertex with position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPn {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Interleaved vertex with position, normal and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPnt {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

/// Vertex buffer contents in exactly one of the two supported layouts.
///
/// A mesh either carries texture coordinates or it does not; the layouts are
/// mutually exclusive so a backend can pick the matching pipeline up front.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexData {
    Plain(Vec<VertexPn>),
    Textured(Vec<VertexPnt>),
}

impl VertexData {
    pub fn len(&self) -> usize {
        match self {
            VertexData::Plain(v) => v.len(),
            VertexData::Textured(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the interleaved buffer, ready for upload.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VertexData::Plain(v) => bytemuck::cast_slice(v),
            VertexData::Textured(v) => bytemuck::cast_slice(v),
        }
    }
}

/// Primitive topology of a synthesized mesh.
///
/// Quads are split during synthesis, so the only topology that reaches a
/// backend is a flat triangle list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    TriangleList,
}

/// Non-owning id of a vertex buffer created by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexBufferHandle(pub u32);

/// Non-owning id of an index buffer created by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexBufferHandle(pub u32);

/// Non-owning id of a combined drawable mesh created by the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Resource factory and draw submission sink implemented by a rendering backend.
///
/// The core requests buffers and meshes lazily from the render path and caches
/// the returned handles; it never frees them individually. Resource lifetime
/// is tied to the backend, which outlives the loaded scene.
pub trait GraphicsContext {
    /// Creates a vertex buffer from interleaved vertex data.
    fn request_vertex_buffer(&mut self, data: VertexData) -> VertexBufferHandle;

    /// Creates an index buffer from a flat `u32` index list.
    fn request_index_buffer(&mut self, indices: Vec<u32>) -> IndexBufferHandle;

    /// Combines a vertex and an index buffer into a drawable mesh.
    fn request_mesh(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        index_buffer: IndexBufferHandle,
        topology: Topology,
    ) -> MeshHandle;

    /// Submits one draw call. Submission order is the draw order; depth
    /// handling is the backend's concern.
    fn draw(&mut self, mesh: MeshHandle, model_matrix: Matrix4<f32>, surface: &Surface);
}
