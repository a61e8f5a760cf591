//! Scene description parser.
//!
//! Scene files are declarative YAML: a header with the physics configuration
//! followed by bodies, compounds and appearances. Parsing happens in two
//! stages. A serde document model mirrors the file grammar one-to-one; a
//! builder then converts the document into the scene element tree exclusively
//! through the typed `attach` operations, validating structural invariants on
//! the way and collecting every violation as a human-readable message.
//!
//! A failed load never hands out a partial tree: either the complete scene is
//! returned or the full error list is.
//!
//! ```yaml
//! scene:
//!   name: arena
//!   step_length: 0.01
//!   bodies:
//!     - name: puck
//!       position: [0.0, 1.0]
//!       geometries:
//!         - shape: circle
//!           radius: 0.1
//! ```

use std::path::Path;

use cgmath::{Deg, Euler, Quaternion, Vector2, Vector3};
use serde::Deserialize;
use thiserror::Error;

use crate::scene::geometry::{
    NormalLibrary, PrimitiveGroup, PrimitiveMode, TexCoordLibrary, VertexLibrary,
};
use crate::scene::graphical::{AppearanceElement, ComplexAppearance, Placement, Surface};
use crate::scene::{
    Body, BodyElement, Compound, Geometry, GeometryId, Scene, SceneElement, ShapeKind,
};

/// Load-time failure: either the file cannot be read at all, or it parsed but
/// violated structural invariants. The scene stays unconstructed either way.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scene file:\n{}", .0.join("\n"))]
    Invalid(Vec<String>),
}

impl LoadError {
    /// The individual error messages of this failure.
    pub fn messages(&self) -> Vec<String> {
        match self {
            LoadError::Io(e) => vec![e.to_string()],
            LoadError::Invalid(errors) => errors.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Document model
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SceneFile {
    scene: SceneDoc,
}

#[derive(Debug, Deserialize)]
struct SceneDoc {
    name: String,
    #[serde(default = "default_step_length")]
    step_length: f32,
    #[serde(default = "default_velocity_iterations")]
    velocity_iterations: usize,
    #[serde(default = "default_position_iterations")]
    position_iterations: usize,
    #[serde(default)]
    gravity: [f32; 2],
    #[serde(default)]
    bodies: Vec<BodyDoc>,
    #[serde(default)]
    compounds: Vec<CompoundDoc>,
    #[serde(default)]
    appearances: Vec<AppearanceDoc>,
}

fn default_step_length() -> f32 {
    0.01
}

fn default_velocity_iterations() -> usize {
    8
}

fn default_position_iterations() -> usize {
    3
}

fn default_unit() -> f32 {
    1.0
}

fn default_density() -> f32 {
    1.0
}

fn default_friction() -> f32 {
    0.5
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Deserialize)]
struct BodyDoc {
    name: String,
    #[serde(default)]
    position: [f32; 2],
    /// Rotation about the z axis in degrees.
    #[serde(default)]
    rotation: f32,
    #[serde(default)]
    linear_damping: f32,
    #[serde(default)]
    angular_damping: f32,
    #[serde(default)]
    geometries: Vec<GeometryDoc>,
    appearance: Option<AppearanceDoc>,
}

#[derive(Debug, Deserialize)]
struct CompoundDoc {
    name: String,
    #[serde(default)]
    geometries: Vec<GeometryDoc>,
}

#[derive(Debug, Deserialize)]
struct GeometryDoc {
    #[serde(flatten)]
    shape: ShapeDoc,
    #[serde(default)]
    offset: [f32; 2],
    #[serde(default = "default_density")]
    density: f32,
    #[serde(default = "default_friction")]
    friction: f32,
    #[serde(default)]
    restitution: f32,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
enum ShapeDoc {
    Circle { radius: f32 },
    Rect { width: f32, height: f32 },
}

#[derive(Debug, Deserialize)]
struct AppearanceDoc {
    #[serde(default)]
    name: String,
    surface: Option<SurfaceDoc>,
    vertices: Option<VerticesDoc>,
    normals: Option<Vec<[f32; 3]>>,
    tex_coords: Option<Vec<[f32; 2]>>,
    #[serde(default)]
    primitives: Vec<PrimitiveDoc>,
    #[serde(default)]
    translation: [f32; 3],
    /// Euler rotation in degrees.
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
    #[serde(default)]
    children: Vec<AppearanceDoc>,
}

#[derive(Debug, Deserialize)]
struct VerticesDoc {
    #[serde(default = "default_unit")]
    unit: f32,
    data: Vec<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct SurfaceDoc {
    #[serde(default)]
    diffuse_color: Option<[f32; 4]>,
    texture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDoc {
    mode: ModeDoc,
    indices: Vec<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ModeDoc {
    Triangles,
    Quads,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Parses a scene file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Scene, LoadError> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text)
}

/// Parses a scene description from a string.
pub fn parse_str(text: &str) -> Result<Scene, LoadError> {
    let file: SceneFile = serde_yaml::from_str(text)
        .map_err(|e| LoadError::Invalid(vec![format!("scene file is not valid YAML: {e}")]))?;
    let mut builder = Builder::default();
    let scene = builder.build(file.scene);
    if builder.errors.is_empty() {
        Ok(scene)
    } else {
        Err(LoadError::Invalid(builder.errors))
    }
}

#[derive(Default)]
struct Builder {
    errors: Vec<String>,
    next_geometry: u32,
}

impl Builder {
    fn build(&mut self, doc: SceneDoc) -> Scene {
        let mut scene = Scene::new(doc.name);
        if doc.step_length <= 0.0 {
            self.errors
                .push(format!("scene step_length must be positive, got {}", doc.step_length));
        }
        if doc.velocity_iterations == 0 || doc.position_iterations == 0 {
            self.errors
                .push("scene iteration counts must be at least 1".to_string());
        }
        scene.step_length = doc.step_length;
        scene.velocity_iterations = doc.velocity_iterations;
        scene.position_iterations = doc.position_iterations;
        scene.gravity = Vector2::new(doc.gravity[0], doc.gravity[1]);

        for body_doc in doc.bodies {
            let body = self.build_body(body_doc);
            scene.attach(SceneElement::Body(body));
        }
        for compound_doc in doc.compounds {
            let compound = self.build_compound(compound_doc);
            scene.attach(SceneElement::Compound(compound));
        }
        for appearance_doc in doc.appearances {
            let appearance = self.build_appearance(appearance_doc);
            scene.attach(SceneElement::Appearance(appearance));
        }
        scene
    }

    fn build_body(&mut self, doc: BodyDoc) -> Body {
        let mut body = Body::new(doc.name);
        body.position = Vector2::new(doc.position[0], doc.position[1]);
        body.rotation = doc.rotation.to_radians();
        body.linear_damping = doc.linear_damping;
        body.angular_damping = doc.angular_damping;
        for geometry_doc in doc.geometries {
            let geometry = self.build_geometry(geometry_doc, &body.name);
            body.attach(BodyElement::Geometry(geometry));
        }
        if let Some(appearance_doc) = doc.appearance {
            body.attach(BodyElement::Appearance(self.build_appearance(appearance_doc)));
        }
        if body.geometries.is_empty() {
            self.errors
                .push(format!("body {:?} has no geometries", body.name));
        }
        body
    }

    fn build_compound(&mut self, doc: CompoundDoc) -> Compound {
        let mut compound = Compound::new(doc.name);
        for geometry_doc in doc.geometries {
            let geometry = self.build_geometry(geometry_doc, &compound.name);
            compound.attach(geometry);
        }
        compound
    }

    fn build_geometry(&mut self, doc: GeometryDoc, owner: &str) -> Geometry {
        let shape = match doc.shape {
            ShapeDoc::Circle { radius } => {
                if radius <= 0.0 {
                    self.errors
                        .push(format!("{owner}: circle radius must be positive, got {radius}"));
                }
                ShapeKind::Circle { radius }
            }
            ShapeDoc::Rect { width, height } => {
                if width <= 0.0 || height <= 0.0 {
                    self.errors.push(format!(
                        "{owner}: rect extents must be positive, got {width}x{height}"
                    ));
                }
                ShapeKind::Rect { width, height }
            }
        };
        let id = GeometryId(self.next_geometry);
        self.next_geometry += 1;
        let mut geometry = Geometry::new(id, shape);
        geometry.offset = Vector2::new(doc.offset[0], doc.offset[1]);
        geometry.density = doc.density;
        geometry.friction = doc.friction;
        geometry.restitution = doc.restitution;
        geometry
    }

    fn build_appearance(&mut self, doc: AppearanceDoc) -> ComplexAppearance {
        let mut appearance = ComplexAppearance::new(doc.name);
        appearance.local = Placement {
            position: Vector3::new(doc.translation[0], doc.translation[1], doc.translation[2]),
            rotation: Quaternion::from(Euler::new(
                Deg(doc.rotation[0]),
                Deg(doc.rotation[1]),
                Deg(doc.rotation[2]),
            )),
            scale: Vector3::new(doc.scale[0], doc.scale[1], doc.scale[2]),
        };

        if let Some(surface_doc) = doc.surface {
            let mut surface = Surface::default();
            if let Some(color) = surface_doc.diffuse_color {
                surface.diffuse_color = color;
            }
            surface.texture = surface_doc.texture;
            appearance.attach(AppearanceElement::Surface(surface));
        }

        let vertex_count = doc.vertices.as_ref().map_or(0, |v| v.data.len());
        if let Some(vertices_doc) = doc.vertices {
            // The unit factor is applied here once; downstream code only ever
            // sees scene units.
            let unit = vertices_doc.unit;
            let vertices = vertices_doc
                .data
                .into_iter()
                .map(|[x, y, z]| Vector3::new(x * unit, y * unit, z * unit))
                .collect();
            appearance.attach(AppearanceElement::Vertices(VertexLibrary { unit, vertices }));
        }

        let normals_supplied = doc.normals.is_some();
        if let Some(normal_docs) = doc.normals {
            if normal_docs.len() != vertex_count {
                self.errors.push(format!(
                    "appearance {:?}: normal library has {} entries for {} vertices",
                    appearance.name,
                    normal_docs.len(),
                    vertex_count
                ));
            }
            let normals = normal_docs
                .into_iter()
                .map(|[x, y, z]| Vector3::new(x, y, z))
                .collect();
            appearance.attach(AppearanceElement::Normals(NormalLibrary { normals }));
        }

        if let Some(coord_docs) = doc.tex_coords {
            if coord_docs.len() != vertex_count {
                self.errors.push(format!(
                    "appearance {:?}: texcoord library has {} entries for {} vertices",
                    appearance.name,
                    coord_docs.len(),
                    vertex_count
                ));
            }
            let coords = coord_docs
                .into_iter()
                .map(|[x, y]| Vector2::new(x, y))
                .collect();
            appearance.attach(AppearanceElement::TexCoords(TexCoordLibrary { coords }));
        }

        if !doc.primitives.is_empty() && vertex_count == 0 {
            self.errors.push(format!(
                "appearance {:?} has primitive groups but no vertex library",
                appearance.name
            ));
        }
        for primitive_doc in doc.primitives {
            let mode = match primitive_doc.mode {
                ModeDoc::Triangles => PrimitiveMode::Triangles,
                ModeDoc::Quads => PrimitiveMode::Quads,
            };
            let group = PrimitiveGroup::new(mode, primitive_doc.indices);
            let stride = group.stride(normals_supplied);
            if group.indices.len() % stride != 0 {
                self.errors.push(format!(
                    "appearance {:?}: index stream length {} is not a multiple of stride {}",
                    appearance.name,
                    group.indices.len(),
                    stride
                ));
            }
            appearance.attach(AppearanceElement::Primitives(group));
        }

        for child_doc in doc.children {
            let child = self.build_appearance(child_doc);
            appearance.attach(AppearanceElement::Child(child));
        }
        appearance
    }
}
