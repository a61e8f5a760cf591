use cgmath::Matrix4;

use robosim_core::graphics::{
    GraphicsContext, IndexBufferHandle, MeshHandle, Topology, VertexBufferHandle, VertexData,
};
use robosim_core::scene::graphical::Surface;

/// Graphics backend stand-in that records every request and draw call.
///
/// Handles are indices into the recorded vectors, so tests can inspect the
/// exact buffer contents the core handed over.
#[derive(Default)]
pub struct RecordingContext {
    pub vertex_buffers: Vec<VertexData>,
    pub index_buffers: Vec<Vec<u32>>,
    pub meshes: Vec<(VertexBufferHandle, IndexBufferHandle, Topology)>,
    pub draws: Vec<(MeshHandle, Matrix4<f32>, Surface)>,
}

/// Initializes logging for a test binary so `warn!` output from the core
/// shows up with `--nocapture`. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_data_of(&self, mesh: MeshHandle) -> &VertexData {
        let (vb, _, _) = self.meshes[mesh.0 as usize];
        &self.vertex_buffers[vb.0 as usize]
    }

    pub fn indices_of(&self, mesh: MeshHandle) -> &[u32] {
        let (_, ib, _) = self.meshes[mesh.0 as usize];
        &self.index_buffers[ib.0 as usize]
    }
}

impl GraphicsContext for RecordingContext {
    fn request_vertex_buffer(&mut self, data: VertexData) -> VertexBufferHandle {
        self.vertex_buffers.push(data);
        VertexBufferHandle(self.vertex_buffers.len() as u32 - 1)
    }

    fn request_index_buffer(&mut self, indices: Vec<u32>) -> IndexBufferHandle {
        self.index_buffers.push(indices);
        IndexBufferHandle(self.index_buffers.len() as u32 - 1)
    }

    fn request_mesh(
        &mut self,
        vertex_buffer: VertexBufferHandle,
        index_buffer: IndexBufferHandle,
        topology: Topology,
    ) -> MeshHandle {
        self.meshes.push((vertex_buffer, index_buffer, topology));
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn draw(&mut self, mesh: MeshHandle, model_matrix: Matrix4<f32>, surface: &Surface) {
        self.draws.push((mesh, model_matrix, surface.clone()));
    }
}
