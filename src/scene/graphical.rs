//! Graphical object tree: the drawable subset of the scene element tree.
//!
//! A [`ComplexAppearance`] owns its geometry descriptor set, an optional
//! surface (material), child appearances in insertion order, and one model
//! matrix per placement. Draw calls compose recursively: own mesh first, then
//! children; the recursion order is the authoritative draw order. Externally
//! registered controller drawings form a side channel drawn by a separate
//! pass.
//!
//! The current model matrix of a draw pass is selected by an explicit
//! [`DrawPass`] parameter instead of a hidden cursor on the node, so a pass is
//! plain data and cannot leave stale state behind.

use cgmath::{Matrix4, One, Quaternion, SquareMatrix, Vector3};

use crate::graphics::{GraphicsContext, MeshHandle};
use crate::scene::geometry::{NormalLibrary, PrimitiveGroup, TexCoordLibrary, VertexLibrary};

/// Local transform of an appearance relative to its parent placement.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Placement {
    pub fn identity() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}

/// Visual material of an appearance.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub diffuse_color: [f32; 4],
    /// Name of a diffuse texture, resolved by the rendering backend.
    pub texture: Option<String>,
}

impl Default for Surface {
    fn default() -> Self {
        Self {
            diffuse_color: [0.8, 0.8, 0.8, 1.0],
            texture: None,
        }
    }
}

/// A drawing registered by an external controller module, rendered in its own
/// pass with raw projection/view matrices.
pub trait ControllerDrawing {
    fn draw(&mut self, projection: &Matrix4<f32>, view: &Matrix4<f32>);
}

/// Child kinds accepted by a [`ComplexAppearance`].
pub enum AppearanceElement {
    Vertices(VertexLibrary),
    Normals(NormalLibrary),
    TexCoords(TexCoordLibrary),
    Primitives(PrimitiveGroup),
    Surface(Surface),
    Child(ComplexAppearance),
}

/// Parameters of one draw pass over the graphical object tree.
///
/// `matrix_index` selects which placement's model matrix applies to every node
/// in this pass; the caller advances it between passes when an object is
/// reused across scene locations. A pass is never re-entrant.
#[derive(Copy, Clone, Debug, Default)]
pub struct DrawPass {
    pub matrix_index: usize,
    /// Draw registered controller drawings instead of the appearances.
    pub controller_drawings: bool,
}

/// The graphical representation of a complex shape.
///
/// Geometry libraries and primitive groups are populated by the parser; the
/// drawable mesh is synthesized lazily on first use and cached for the
/// lifetime of the node (see `graphics::mesh`).
#[derive(Default)]
pub struct ComplexAppearance {
    pub name: String,
    pub surface: Option<Surface>,
    pub vertices: Option<VertexLibrary>,
    pub normals: Option<NormalLibrary>,
    pub tex_coords: Option<TexCoordLibrary>,
    pub primitive_groups: Vec<PrimitiveGroup>,
    pub children: Vec<ComplexAppearance>,
    pub local: Placement,
    /// Whether the normal library came from the file (interleaved indices) or
    /// was derived during synthesis.
    pub(crate) normals_supplied: bool,
    pub(crate) mesh: Option<MeshHandle>,
    pub(crate) created: bool,
    model_matrices: Vec<Matrix4<f32>>,
    controller_drawings: Vec<Box<dyn ControllerDrawing>>,
}

impl std::fmt::Debug for ComplexAppearance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexAppearance")
            .field("name", &self.name)
            .field("primitive_groups", &self.primitive_groups.len())
            .field("children", &self.children.len())
            .field("mesh", &self.mesh)
            .finish()
    }
}

impl ComplexAppearance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Registers a child element on this appearance.
    ///
    /// Single-valued slots (vertex/normal/texcoord library, surface) must not
    /// be occupied; the parser guarantees single occupancy.
    pub fn attach(&mut self, child: AppearanceElement) {
        match child {
            AppearanceElement::Vertices(vertices) => {
                debug_assert!(self.vertices.is_none(), "vertex library attached twice");
                if self.vertices.is_none() {
                    self.vertices = Some(vertices);
                }
            }
            AppearanceElement::Normals(normals) => {
                debug_assert!(self.normals.is_none(), "normal library attached twice");
                if self.normals.is_none() {
                    self.normals = Some(normals);
                    self.normals_supplied = true;
                }
            }
            AppearanceElement::TexCoords(coords) => {
                debug_assert!(self.tex_coords.is_none(), "texcoord library attached twice");
                if self.tex_coords.is_none() {
                    self.tex_coords = Some(coords);
                }
            }
            AppearanceElement::Primitives(group) => self.primitive_groups.push(group),
            AppearanceElement::Surface(surface) => {
                debug_assert!(self.surface.is_none(), "surface attached twice");
                if self.surface.is_none() {
                    self.surface = Some(surface);
                }
            }
            AppearanceElement::Child(appearance) => self.children.push(appearance),
        }
    }

    /// Whether the supplied normal library defines interleaved normal indices.
    pub fn normals_supplied(&self) -> bool {
        self.normals_supplied
    }

    /// Cached drawable mesh, if synthesis has run.
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    /// Model matrices of this appearance, one per placement.
    pub fn model_matrices(&self) -> &[Matrix4<f32>] {
        &self.model_matrices
    }

    /// Creates rendering resources for this appearance and all children.
    ///
    /// Idempotent per node: repeated calls return without touching the
    /// context. Mesh synthesis only runs for shapes that carry primitives.
    pub fn create_graphics(&mut self, ctx: &mut dyn GraphicsContext) {
        if !self.created {
            self.created = true;
            if !self.primitive_groups.is_empty() {
                self.ensure_mesh(ctx);
            }
        }
        for child in &mut self.children {
            child.create_graphics(ctx);
        }
    }

    /// Recomputes world model matrices from the given parent placements, one
    /// matrix per placement, and recurses into the children.
    pub fn update_model_matrices(&mut self, parents: &[Matrix4<f32>]) {
        let local = self.local.to_matrix();
        self.model_matrices = parents.iter().map(|parent| parent * local).collect();
        for child in &mut self.children {
            child.update_model_matrices(&self.model_matrices);
        }
    }

    /// Submits draw calls for this appearance and its children.
    ///
    /// With `pass.controller_drawings` unset the node's own mesh is drawn at
    /// the pass's model matrix, then the children in insertion order.
    pub fn draw(&self, ctx: &mut dyn GraphicsContext, pass: &DrawPass) {
        if !pass.controller_drawings {
            if let Some(mesh) = self.mesh {
                debug_assert!(
                    pass.matrix_index < self.model_matrices.len()
                        || self.model_matrices.is_empty(),
                    "draw pass matrix index out of range"
                );
                let matrix = self
                    .model_matrices
                    .get(pass.matrix_index)
                    .copied()
                    .unwrap_or_else(Matrix4::identity);
                let default_surface = Surface::default();
                let surface = self.surface.as_ref().unwrap_or(&default_surface);
                ctx.draw(mesh, matrix, surface);
            }
        }
        for child in &self.children {
            child.draw(ctx, pass);
        }
    }

    /// Draws the controller drawings registered on this node and its children.
    pub fn draw_controller_drawings(
        &mut self,
        projection: &Matrix4<f32>,
        view: &Matrix4<f32>,
    ) {
        for drawing in &mut self.controller_drawings {
            drawing.draw(projection, view);
        }
        for child in &mut self.children {
            child.draw_controller_drawings(projection, view);
        }
    }

    /// Registers a controller drawing on this node.
    pub fn register_drawing(&mut self, drawing: Box<dyn ControllerDrawing>) {
        self.controller_drawings.push(drawing);
    }

    /// Removes all registered controller drawings from this node.
    pub fn clear_drawings(&mut self) {
        self.controller_drawings.clear();
    }
}
