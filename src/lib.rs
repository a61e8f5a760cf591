//! robosim-core
//!
//! The simulation-and-geometry core of a desktop robot-simulation
//! application. This crate owns the scene element tree built while a scene
//! file is parsed, advances a rigid-body physics world by fixed, deterministic
//! time steps, fans collision events out to registered listeners and
//! synthesizes drawable mesh data on demand from declarative vertex, normal
//! and texture-coordinate libraries. The GUI shell and the GPU backend live
//! outside; they drive this crate through [`simulation::Simulation`] and
//! implement [`graphics::GraphicsContext`].
//!
//! High-level modules
//! - `simulation`: the driver owning scene, world and counters (load/step/draw)
//! - `scene`: the scene element tree, geometry descriptors and graphical objects
//! - `graphics`: the abstract rendering interface and the mesh synthesizer
//! - `physics`: the rapier2d world wrapper and the collision dispatcher
//! - `parser`: the YAML scene description parser
//! - `framerate`: the smoothed steps/second estimator
//!

pub mod framerate;
pub mod graphics;
pub mod parser;
pub mod physics;
pub mod scene;
pub mod simulation;

// Re-exports commonly used types for convenience in downstream code.
pub use crate::graphics::{GraphicsContext, MeshHandle, Topology, VertexData};
pub use crate::parser::LoadError;
pub use crate::physics::collision::{CollisionListener, SharedListener};
pub use crate::scene::graphical::{ControllerDrawing, DrawPass};
pub use crate::scene::GeometryId;
pub use crate::simulation::Simulation;
pub use cgmath::{Matrix4, Quaternion, Vector2, Vector3};
